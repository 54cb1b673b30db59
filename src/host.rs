//! Interfaces of the emulator pieces the engine talks to.

use crate::mapping::dispatcher::{Effect, MenuAction, Mode};
use crate::mapping::hotkey::Modifiers;
use crate::menu::MenuRef;
use tracing::debug;

/// The emulated machine's input side
pub trait EmulatedMachine {
    fn set_joystick_pin(&mut self, port: u8, mask: u8, asserted: bool);

    /// Negative rows address keys outside the main matrix
    fn set_matrix_key(&mut self, row: i16, col: i16, asserted: bool);

    /// Host key without a mapping, translated by the machine's own keymap
    fn host_key(&mut self, keycode: u16, modifiers: Modifiers, pressed: bool);
}

/// The menu / virtual keyboard subsystem
pub trait MenuHost {
    fn is_menu_active(&self) -> bool;

    fn is_capture_active(&self) -> bool;

    fn invoke_menu_entry(&mut self, entry: MenuRef);

    fn activate_menu(&mut self);

    fn navigate(&mut self, action: MenuAction, pressed: bool);

    fn mode(&self) -> Mode {
        Mode::from_flags(self.is_menu_active(), self.is_capture_active())
    }
}

impl Effect {
    /// Hand the effect to whichever collaborator owns it
    pub fn apply<E, H>(&self, machine: &mut E, menu: &mut H)
    where
        E: EmulatedMachine + ?Sized,
        H: MenuHost + ?Sized,
    {
        debug!("Applying {:?}", self);
        match *self {
            Effect::Joystick { port, pin, asserted } => {
                machine.set_joystick_pin(port, pin.mask(), asserted)
            }
            Effect::MatrixKey { row, col, asserted } => machine.set_matrix_key(row, col, asserted),
            Effect::HostKey {
                keycode,
                modifiers,
                pressed,
            } => machine.host_key(keycode, modifiers, pressed),
            Effect::OpenMenu => menu.activate_menu(),
            Effect::InvokeMenuEntry(entry) => menu.invoke_menu_entry(entry),
            Effect::Menu { action, pressed } => menu.navigate(action, pressed),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Joystick port state as an emulated machine would latch it
    #[derive(Debug, Default)]
    pub struct PortLatch {
        pub ports: [u8; 2],
        pub keys: Vec<(i16, i16, bool)>,
        pub host_keys: Vec<(u16, bool)>,
    }

    impl EmulatedMachine for PortLatch {
        fn set_joystick_pin(&mut self, port: u8, mask: u8, asserted: bool) {
            let value = &mut self.ports[usize::from(port & 1)];
            if asserted {
                *value |= mask;
            } else {
                *value &= !mask;
            }
        }

        fn set_matrix_key(&mut self, row: i16, col: i16, asserted: bool) {
            self.keys.push((row, col, asserted));
        }

        fn host_key(&mut self, keycode: u16, _modifiers: Modifiers, pressed: bool) {
            self.host_keys.push((keycode, pressed));
        }
    }

    #[derive(Debug, Default)]
    pub struct MenuRecorder {
        pub active: bool,
        pub capture: bool,
        pub invoked: Vec<MenuRef>,
        pub navigation: Vec<(MenuAction, bool)>,
    }

    impl MenuHost for MenuRecorder {
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
            self.active = true;
        }

        fn navigate(&mut self, action: MenuAction, pressed: bool) {
            if action == MenuAction::Exit {
                self.active = false;
            }
            self.navigation.push((action, pressed));
        }
    }
}
