use color_eyre::{eyre::eyre, Result};
use joymap::mapping::{ConfigScope, Effect, MenuAction, Modifiers};
use joymap::menu::{MenuArena, MenuRef, MenuTree};
use joymap::{EmulatedMachine, InputEngine, MenuHost, Settings};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    setup()?;

    let settings_path = Settings::default_path();
    let settings = Settings::load(&settings_path)
        .map_err(|e| eyre!("Failed to load {}: {}", settings_path.display(), e))?;

    let menu = FrontendMenu::build()?;
    let engine = InputEngine::new(settings);
    run(engine, menu)
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// The front-end's own menu entries that mappings can point at
struct FrontendMenu {
    arena: MenuArena,
    swap: MenuRef,
    save: MenuRef,
    quit: MenuRef,
}

impl FrontendMenu {
    fn build() -> Result<Self> {
        let mut arena = MenuArena::new();
        let root = arena.root();
        let input = arena
            .add_submenu(root, "Input")
            .map_err(|e| eyre!("Menu setup failed: {}", e))?;
        let swap = arena
            .add_item(input, "Swap joystick ports")
            .map_err(|e| eyre!("Menu setup failed: {}", e))?;
        let save = arena
            .add_item(input, "Save joystick map")
            .map_err(|e| eyre!("Menu setup failed: {}", e))?;
        let quit = arena
            .add_item(root, "Quit")
            .map_err(|e| eyre!("Menu setup failed: {}", e))?;
        Ok(Self {
            arena,
            swap,
            save,
            quit,
        })
    }
}

/// Stand-in machine that logs what the emulator core would latch
#[derive(Debug, Default)]
struct LoggingMachine {
    ports: [u8; 2],
}

impl EmulatedMachine for LoggingMachine {
    fn set_joystick_pin(&mut self, port: u8, mask: u8, asserted: bool) {
        let Some(value) = self.ports.get_mut(usize::from(port)) else {
            warn!("No joystick port {}", port);
            return;
        };
        if asserted {
            *value |= mask;
        } else {
            *value &= !mask;
        }
        info!("Port {} = {:05b}", port, *value);
    }

    fn set_matrix_key(&mut self, row: i16, col: i16, asserted: bool) {
        info!("Matrix key ({}, {}) {}", row, col, if asserted { "down" } else { "up" });
    }

    fn host_key(&mut self, keycode: u16, modifiers: Modifiers, pressed: bool) {
        debug!("Host key {} {:?} pressed={}", keycode, modifiers, pressed);
    }
}

/// Menu state as seen by the dispatcher, invoked entries are queued
#[derive(Debug, Default)]
struct HostMenu {
    active: bool,
    capture: bool,
    invoked: Vec<MenuRef>,
}

impl MenuHost for HostMenu {
    fn is_menu_active(&self) -> bool {
        self.active
    }

    fn is_capture_active(&self) -> bool {
        self.capture
    }

    fn invoke_menu_entry(&mut self, entry: MenuRef) {
        self.invoked.push(entry);
    }

    fn activate_menu(&mut self) {
        info!("Menu opened");
        self.active = true;
    }

    fn navigate(&mut self, action: MenuAction, pressed: bool) {
        debug!("Menu {:?} pressed={}", action, pressed);
        if pressed && matches!(action, MenuAction::Exit | MenuAction::Cancel) {
            info!("Menu closed");
            self.active = false;
        }
    }
}

/// Run queued menu entries, returns false once Quit was chosen
fn run_invoked(engine: &mut InputEngine, host: &mut HostMenu, menu: &FrontendMenu) -> bool {
    for entry in std::mem::take(&mut host.invoked) {
        if entry == menu.swap {
            let swapped = engine.swap_ports();
            info!("Joystick ports {}", if swapped { "swapped" } else { "restored" });
        } else if entry == menu.save {
            match engine.settings().joystick.map_file.clone() {
                Some(path) => {
                    if let Err(e) = engine.dump_config(&path, ConfigScope::Joysticks, &menu.arena) {
                        warn!("Joystick map not saved: {}", e);
                    }
                }
                None => warn!("No joystick map file configured"),
            }
        } else if entry == menu.quit {
            info!("Quit requested");
            return false;
        } else {
            warn!("Unhandled menu entry {} ({:?})", entry, menu.arena.label(entry));
        }
    }
    true
}

fn apply_all(effects: Vec<Effect>, machine: &mut LoggingMachine, host: &mut HostMenu) {
    for effect in effects {
        effect.apply(machine, host);
    }
}

#[cfg(feature = "gamepad")]
fn run(mut engine: InputEngine, menu: FrontendMenu) -> Result<()> {
    use chrono::Local;
    use joymap::controller::collector::EventCollector;
    use joymap::mapping::{Action, CaptureStep, PendingCapture, RemapTarget};
    use std::time::Duration;

    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    let collector =
        EventCollector::create().map_err(|e| eyre!("Failed to start gamepad backend: {}", e))?;
    let (mut collector, devices) = collector.initialize();
    for info in &devices {
        engine.register_device(info);
    }
    report_startup(&mut engine, &menu);

    let mut machine = LoggingMachine::default();
    let mut host = HostMenu::default();
    let mut capture: Option<PendingCapture> = None;

    info!("Polling {} gamepad(s)", devices.len());
    loop {
        while let Some((device, event)) = collector.next_event() {
            if let Some(pending) = capture.take() {
                capture = match pending.offer_event(device, &event, Local::now()) {
                    CaptureStep::Waiting(pending) => Some(pending),
                    CaptureStep::Captured(captured) => {
                        match engine.complete_remap(captured) {
                            Ok(slot) => info!("Bound {:?}", slot),
                            Err(e) => warn!("Remap failed: {}", e),
                        }
                        None
                    }
                    CaptureStep::Expired(_) => None,
                };
                host.capture = capture.is_some();
                continue;
            }

            let effects = engine.dispatch(device, &event, host.mode());
            apply_all(effects, &mut machine, &mut host);
        }

        if let Some(pending) = capture.take() {
            capture = match pending.poll(Local::now()) {
                CaptureStep::Waiting(pending) => Some(pending),
                _ => None,
            };
            host.capture = capture.is_some();
        }

        if engine.take_remap_request() {
            let target = RemapTarget::Joystick(Action::InvokeMenuEntry(menu.swap));
            match engine.begin_remap(target, &menu.arena) {
                Ok(pending) => capture = Some(pending),
                Err(e) => warn!("Cannot start remap: {}", e),
            }
            host.capture = capture.is_some();
        }

        if let Some(effect) = engine.autorepeat_tick() {
            effect.apply(&mut machine, &mut host);
        }

        if !run_invoked(&mut engine, &mut host, &menu) {
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(not(feature = "gamepad"))]
fn run(mut engine: InputEngine, menu: FrontendMenu) -> Result<()> {
    report_startup(&mut engine, &menu);
    warn!("Built without an input backend, rebuild with --features gamepad to poll gamepads");

    let mut machine = LoggingMachine::default();
    let mut host = HostMenu::default();
    let activate = engine.settings().menu_keys.activate;
    let effects = engine.key_press(activate, Modifiers::NONE, host.mode());
    apply_all(effects.into_iter().collect(), &mut machine, &mut host);
    debug!("Menu active after activation key: {}", host.is_menu_active());
    run_invoked(&mut engine, &mut host, &menu);
    Ok(())
}

fn report_startup(engine: &mut InputEngine, menu: &FrontendMenu) {
    for report in engine.load_startup_maps(&menu.arena) {
        if report.is_clean() {
            info!("Applied {} mapping line(s)", report.applied);
        } else {
            for diagnostic in &report.diagnostics {
                warn!("{}", diagnostic);
            }
        }
    }
    info!(
        "{} device(s), {} hotkey(s), ports swapped: {}",
        engine.registry().len(),
        engine.hotkeys().len(),
        engine.ports_swapped()
    );
}
