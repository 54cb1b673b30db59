//! Facade tying devices, hotkeys, dispatch, remapping and persistence together

use super::action::{Action, SlotAddress};
use super::device::{DeviceInfo, DeviceRegistry};
use super::dispatcher::{Dispatcher, Effect, Mode};
use super::error::{CodecError, MappingError};
use super::hotkey::{HotkeyTable, Modifiers};
use super::keyboard::{route_key_press, route_key_release, HeldKeys};
use super::remap::{Captured, CapturedSlot, PendingCapture, RemapCapture, RemapTarget};
use crate::config::Settings;
use crate::controller::event::{DeviceId, RawInputEvent};
use crate::menu::{path_of, MenuRef, MenuTree};
use crate::persistence::{self, LoadReport};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Which table a mapping file addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Joysticks,
    Hotkeys,
}

/// Whether a missing file is an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default or user override file, silently skipped when absent
    Optional,
    /// Requested by the user, a missing file is reported
    Explicit,
}

/// Owner of all input mapping state. Single-threaded: every call happens on
/// the thread polling the input queue.
#[derive(Debug)]
pub struct InputEngine {
    settings: Settings,
    registry: DeviceRegistry,
    hotkeys: HotkeyTable,
    held_keys: HeldKeys,
    dispatcher: Dispatcher,
}

impl InputEngine {
    pub fn new(settings: Settings) -> Self {
        info!(
            "Creating input engine (threshold {}, fuzz {})",
            settings.threshold(),
            settings.fuzz()
        );
        let dispatcher = Dispatcher::new(settings.threshold(), settings.fuzz(), settings.autorepeat);
        Self {
            settings,
            registry: DeviceRegistry::new(),
            hotkeys: HotkeyTable::new(),
            held_keys: HeldKeys::default(),
            dispatcher,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register a discovered device with its default table
    pub fn register_device(&mut self, info: &DeviceInfo) -> DeviceId {
        self.registry.register(info, &self.settings.default_policy())
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn hotkeys(&self) -> &HotkeyTable {
        &self.hotkeys
    }

    /// Feed one device event through the dispatcher.
    pub fn dispatch(&mut self, device: DeviceId, event: &RawInputEvent, mode: Mode) -> Vec<Effect> {
        match self.registry.get_mut(device) {
            Some(device) => self.dispatcher.dispatch(device, event, mode),
            None => {
                debug!("Dropping {:?} from unknown device {}", event, device);
                Vec::new()
            }
        }
    }

    pub fn autorepeat_tick(&mut self) -> Option<Effect> {
        self.dispatcher.autorepeat_tick()
    }

    /// True once after an `EnterRemapMode` input was pressed in run mode
    pub fn take_remap_request(&mut self) -> bool {
        self.dispatcher.take_remap_request()
    }

    pub fn key_press(&mut self, keycode: u16, modifiers: Modifiers, mode: Mode) -> Option<Effect> {
        route_key_press(
            keycode,
            modifiers,
            mode,
            &self.settings.menu_keys,
            &self.hotkeys,
            &mut self.held_keys,
        )
    }

    pub fn key_release(&mut self, keycode: u16, modifiers: Modifiers, mode: Mode) -> Option<Effect> {
        route_key_release(keycode, modifiers, mode, &self.settings.menu_keys, &mut self.held_keys)
    }

    /// Overwrite a single cell without going through a capture
    pub fn set_action(
        &mut self,
        device: DeviceId,
        address: SlotAddress,
        action: Action,
    ) -> Result<(), MappingError> {
        let table = &mut self
            .registry
            .get_mut(device)
            .ok_or(MappingError::UnknownDevice(device))?
            .table;
        if !table.set_action(address, action) {
            return Err(MappingError::SlotOutOfRange { device, address });
        }
        info!("Device {} {} -> {:?}", device, address, action);
        Ok(())
    }

    pub fn set_hotkey(
        &mut self,
        keycode: u16,
        modifiers: Modifiers,
        entry: Option<MenuRef>,
    ) -> Result<(), MappingError> {
        if !self.hotkeys.set(keycode, modifiers, entry) {
            return Err(MappingError::KeyOutOfRange(keycode));
        }
        info!("Hotkey {} {:?} -> {:?}", keycode, modifiers, entry);
        Ok(())
    }

    /// Arm a capture for `target`.
    ///
    /// Menu entries in the target must be reachable, otherwise the binding
    /// could not be saved.
    pub fn begin_remap<M: MenuTree + ?Sized>(
        &self,
        target: RemapTarget,
        menu: &M,
    ) -> Result<PendingCapture, MappingError> {
        self.begin_remap_at(target, menu, Local::now())
    }

    pub fn begin_remap_at<M: MenuTree + ?Sized>(
        &self,
        target: RemapTarget,
        menu: &M,
        now: DateTime<Local>,
    ) -> Result<PendingCapture, MappingError> {
        let entry = match target {
            RemapTarget::Joystick(Action::InvokeMenuEntry(entry)) => Some(entry),
            RemapTarget::Hotkey(entry) => entry,
            RemapTarget::Joystick(_) => None,
        };
        if let Some(entry) = entry {
            let path = path_of(menu, entry).ok_or(MappingError::UnreachableEntry)?;
            debug!("Remap target resolves to \"{}\"", path);
        }
        Ok(RemapCapture::arm(
            target,
            self.settings.threshold(),
            self.settings.remap_timeout(),
            now,
        ))
    }

    /// Write the captured binding into its table
    pub fn complete_remap(
        &mut self,
        capture: RemapCapture<Captured>,
    ) -> Result<CapturedSlot, MappingError> {
        let slot = capture.slot().ok_or(MappingError::CaptureMismatch)?;
        match (capture.target(), slot) {
            (RemapTarget::Joystick(action), CapturedSlot::Device { device, address }) => {
                self.set_action(device, address, action)?
            }
            (RemapTarget::Hotkey(entry), CapturedSlot::Key { keycode, modifiers }) => {
                self.set_hotkey(keycode, modifiers, entry)?
            }
            (target, slot) => {
                warn!("Capture for {:?} ended on unrelated {:?}", target, slot);
                return Err(MappingError::CaptureMismatch);
            }
        }
        Ok(slot)
    }

    /// Patch the tables in `scope` from `path`.
    pub fn load_config<M: MenuTree + ?Sized>(
        &mut self,
        path: &Path,
        scope: ConfigScope,
        source: ConfigSource,
        menu: &M,
    ) -> Result<LoadReport, CodecError> {
        let result = match scope {
            ConfigScope::Joysticks => persistence::load_joymap(path, &mut self.registry, menu),
            ConfigScope::Hotkeys => persistence::load_hotkeys(path, &mut self.hotkeys, menu),
        };
        match (result, source) {
            (Err(CodecError::NotFound(missing)), ConfigSource::Optional) => {
                debug!("No {:?} file at {}, keeping current tables", scope, missing.display());
                Ok(LoadReport::default())
            }
            (Err(e), _) => {
                error!("Loading {:?} from {} failed: {}", scope, path.display(), e);
                Err(e)
            }
            (ok, _) => ok,
        }
    }

    pub fn dump_config<M: MenuTree + ?Sized>(
        &self,
        path: &Path,
        scope: ConfigScope,
        menu: &M,
    ) -> Result<(), CodecError> {
        let result = match scope {
            ConfigScope::Joysticks => persistence::dump_joymap(path, &self.registry, menu),
            ConfigScope::Hotkeys => persistence::dump_hotkeys(path, &self.hotkeys, menu),
        };
        if let Err(e) = &result {
            error!("Writing {:?} to {} failed: {}", scope, path.display(), e);
        }
        result
    }

    /// Apply the configured map files in start-up order: the user joystick
    /// map, then built-in and user hotkeys over a cleared hotkey table.
    pub fn load_startup_maps<M: MenuTree + ?Sized>(&mut self, menu: &M) -> Vec<LoadReport> {
        let joystick = self.settings.joystick.map_file.clone();
        let builtin = self.settings.hotkeys.builtin_file.clone();
        let user = self.settings.hotkeys.user_file.clone();

        let mut reports = Vec::new();
        if let Some(path) = joystick {
            reports.extend(
                self.load_config(&path, ConfigScope::Joysticks, ConfigSource::Optional, menu)
                    .ok(),
            );
        }

        self.hotkeys.clear_all();
        for path in [builtin, user].into_iter().flatten() {
            reports.extend(
                self.load_config(&path, ConfigScope::Hotkeys, ConfigSource::Optional, menu)
                    .ok(),
            );
        }
        reports
    }

    /// Flip ports on every joystick action, returns the new swapped state
    pub fn swap_ports(&mut self) -> bool {
        self.registry.swap_ports()
    }

    pub fn ports_swapped(&self) -> bool {
        self.registry.ports_swapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{MenuRecorder, PortLatch};
    use crate::host::MenuHost;
    use crate::mapping::action::{InputElementKind, JoyPin};
    use crate::mapping::remap::CaptureStep;
    use crate::mapping::table::ElementCounts;
    use crate::menu::MenuArena;

    fn engine() -> InputEngine {
        let mut engine = InputEngine::new(Settings::default());
        engine.register_device(&DeviceInfo {
            name: "Pad".to_string(),
            counts: ElementCounts {
                axes: 2,
                buttons: 4,
                hats: 1,
                balls: 0,
            },
            resting_axes: vec![0, 0],
        });
        engine
    }

    fn menu() -> (MenuArena, MenuRef) {
        let mut menu = MenuArena::new();
        let root = menu.root();
        let swap = menu.add_item(root, "Swap joystick ports").unwrap();
        (menu, swap)
    }

    #[test]
    fn effects_drive_machine_and_menu() {
        let mut engine = engine();
        let mut machine = PortLatch::default();
        let mut host = MenuRecorder::default();

        for effect in engine.dispatch(0, &RawInputEvent::Hat { index: 0, bits: 1 }, host.mode()) {
            effect.apply(&mut machine, &mut host);
        }
        assert_eq!(machine.ports[0], JoyPin::Up.mask());

        for effect in engine.dispatch(0, &RawInputEvent::Button { index: 1, pressed: true }, host.mode()) {
            effect.apply(&mut machine, &mut host);
        }
        assert!(host.is_menu_active());
        assert_eq!(host.mode(), Mode::Menu);
    }

    #[test]
    fn unknown_device_is_dropped() {
        let mut engine = engine();
        assert!(engine
            .dispatch(3, &RawInputEvent::Button { index: 0, pressed: true }, Mode::Run)
            .is_empty());
    }

    #[test]
    fn direct_set_action_checks_bounds() {
        let mut engine = engine();
        let address = SlotAddress::new(InputElementKind::Hat, 4);
        assert_eq!(
            engine.set_action(0, address, Action::ActivateMenu),
            Err(MappingError::SlotOutOfRange { device: 0, address })
        );
        assert_eq!(
            engine.set_action(1, address, Action::ActivateMenu),
            Err(MappingError::UnknownDevice(1))
        );
    }

    #[test]
    fn capture_binds_menu_entry_to_button() {
        let mut engine = engine();
        let (menu, swap) = menu();
        let now = Local::now();
        let capture = engine
            .begin_remap_at(RemapTarget::Joystick(Action::InvokeMenuEntry(swap)), &menu, now)
            .unwrap();
        let step = capture.offer_event(0, &RawInputEvent::Button { index: 3, pressed: true }, now);
        let CaptureStep::Captured(captured) = step else {
            panic!("button press should be captured");
        };
        engine.complete_remap(captured).unwrap();

        assert_eq!(
            engine.dispatch(0, &RawInputEvent::Button { index: 3, pressed: true }, Mode::Run),
            vec![Effect::InvokeMenuEntry(swap)]
        );
    }

    #[test]
    fn capture_refuses_detached_entries() {
        let engine = engine();
        let (mut menu, swap) = menu();
        menu.detach(swap).unwrap();
        assert_eq!(
            engine
                .begin_remap(RemapTarget::Hotkey(Some(swap)), &menu)
                .map(|_| ())
                .unwrap_err(),
            MappingError::UnreachableEntry
        );
    }

    #[test]
    fn captured_hotkey_takes_effect() {
        let mut engine = engine();
        let (menu, swap) = menu();
        let now = Local::now();
        let capture = engine
            .begin_remap_at(RemapTarget::Hotkey(Some(swap)), &menu, now)
            .unwrap();
        let CaptureStep::Captured(captured) = capture.offer_key(115, Modifiers::ALT, now) else {
            panic!("key press should be captured");
        };
        engine.complete_remap(captured).unwrap();
        assert_eq!(
            engine.key_press(115, Modifiers::ALT, Mode::Run),
            Some(Effect::InvokeMenuEntry(swap))
        );
    }

    #[test]
    fn optional_missing_file_is_fine_explicit_is_not() {
        let mut engine = engine();
        let (menu, _) = menu();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nothing.vjm");

        let report = engine
            .load_config(&missing, ConfigScope::Joysticks, ConfigSource::Optional, &menu)
            .unwrap();
        assert_eq!(report.applied, 0);
        assert!(matches!(
            engine.load_config(&missing, ConfigScope::Hotkeys, ConfigSource::Explicit, &menu),
            Err(CodecError::NotFound(_))
        ));
    }

    #[test]
    fn startup_loads_builtin_then_user_hotkeys() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = dir.path().join("builtin.vhk");
        let user = dir.path().join("user.vhk");
        std::fs::write(&builtin, "!CLEAR\n100 Swap joystick ports\n101 Swap joystick ports\n").unwrap();
        std::fs::write(&user, "101 Gone\n").unwrap();

        let mut settings = Settings::default();
        settings.hotkeys.builtin_file = Some(builtin);
        settings.hotkeys.user_file = Some(user);
        settings.joystick.map_file = Some(dir.path().join("absent.vjm"));
        let mut engine = InputEngine::new(settings);
        let (menu, swap) = menu();

        let reports = engine.load_startup_maps(&menu);
        assert_eq!(reports.len(), 3);
        assert_eq!(engine.hotkeys().get(100, Modifiers::NONE), Some(swap));
        assert_eq!(engine.hotkeys().get(101, Modifiers::NONE), None);
    }

    #[test]
    fn swap_ports_reports_state() {
        let mut engine = engine();
        assert!(engine.swap_ports());
        assert!(engine.ports_swapped());
        assert_eq!(
            engine.dispatch(0, &RawInputEvent::Button { index: 0, pressed: true }, Mode::Run),
            vec![Effect::Joystick { port: 1, pin: JoyPin::Fire, asserted: true }]
        );
    }
}
