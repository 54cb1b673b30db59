//! Text codec for joystick maps and hotkey maps.
//!
//! Joystick map lines:
//! `device kind slot action [params]`, where `action` is 0 none,
//! 1 joystick (`port pin`), 2 key (`row col`), 3 remap, 4 menu,
//! 5 menu entry (label path up to end of line).
//!
//! Hotkey map lines: `index path`, with
//! `index = keycode + modifiers * NUM_KEYCODES`.

use crate::mapping::action::{Action, InputElementKind, JoyPin, SlotAddress};
use crate::mapping::device::DeviceRegistry;
use crate::mapping::error::CodecError;
use crate::mapping::hotkey::{split_index, HotkeyTable};
use crate::menu::{path_of, resolve, MenuRef, MenuTree};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const CLEAR_KEYWORD: &str = "CLEAR";

const JOYMAP_HEADER: &str = "\
# Joystick mapping file
#
# Loading this file patches the current mapping, only the listed
# cells change. '!CLEAR' first resets every cell to 'none'.
#
# Line format: device kind slot action [parameters]
# Text after '#' is ignored.
#
# kind:
#   0 axis    (two slots per axis: negative, positive)
#   1 button
#   2 hat     (four slots per hat: up, down, left, right)
#   3 ball
#
# action [parameters]:
#   0                  none
#   1 port pin         joystick pin (pin 1/2/4/8/16 = up/down/left/right/fire)
#   2 row col          keyboard matrix key (negative row = extra keys)
#   3                  enter remap mode
#   4                  open menu
#   5 menu&path&entry  invoke menu entry
#
";

const HOTKEY_HEADER: &str = "\
# Hotkey mapping file
#
# Loading this file patches the current hotkeys. '!CLEAR' removes all
# hotkeys first.
#
# Line format: index menu&path&entry
# index = keycode + modifiers * 512, modifiers: 1 shift, 2 alt, 4 ctrl, 8 meta
# Lines starting with '#' are ignored.
#
";

/// Outcome of parsing one mapping file
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Data lines written into a table
    pub applied: usize,
    /// Whether a `!CLEAR` keyword was seen
    pub cleared: bool,
    pub diagnostics: Vec<CodecError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn reject(&mut self, error: CodecError) {
        warn!("{}", error);
        self.diagnostics.push(error);
    }
}

/// Parse joystick map text into the registry's tables.
pub fn parse_joymap<M: MenuTree + ?Sized>(
    text: &str,
    registry: &mut DeviceRegistry,
    menu: &M,
) -> LoadReport {
    let mut report = LoadReport::default();

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.find('#').map_or(raw, |comment| &raw[..comment]).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(keyword) = line.strip_prefix('!') {
            if parse_keyword(keyword, line_no, &mut report) {
                registry.clear_all();
            }
            continue;
        }

        let entry = match parse_joymap_entry(line, raw, line_no, menu) {
            Ok(entry) => entry,
            Err(error) => {
                report.reject(error);
                continue;
            }
        };

        let Some(device) = registry.get_mut(entry.device) else {
            report.reject(CodecError::OutOfRange(line_no));
            continue;
        };
        if !device.table.set_action(entry.address, entry.action) {
            report.reject(CodecError::OutOfRange(line_no));
            continue;
        }
        report.applied += 1;
        if let Some(path) = entry.unresolved {
            report.reject(CodecError::PathUnresolved { line: line_no, path });
        }
    }

    report
}

/// Read and apply a joystick map file.
pub fn load_joymap<M: MenuTree + ?Sized>(
    path: &Path,
    registry: &mut DeviceRegistry,
    menu: &M,
) -> Result<LoadReport, CodecError> {
    let text = read_file(path)?;
    info!("Loading joystick map {}", path.display());
    let report = parse_joymap(&text, registry, menu);
    info!(
        "Joystick map {}: {} entries applied, {} problems",
        path.display(),
        report.applied,
        report.diagnostics.len()
    );
    Ok(report)
}

/// Render every non-`None` cell of every device.
pub fn render_joymap<M: MenuTree + ?Sized>(registry: &DeviceRegistry, menu: &M) -> String {
    let mut out = String::from(JOYMAP_HEADER);
    let _ = writeln!(out, "\n!{}\n", CLEAR_KEYWORD);

    for device in registry.iter() {
        let _ = writeln!(out, "# {}", device.name());
        for (address, cell) in device.table.iter() {
            let params = match cell.action {
                Action::None => continue,
                Action::Joystick { port, pin } => format!(" {} {}", port, pin.mask()),
                Action::Key { row, col } => format!(" {} {}", row, col),
                Action::EnterRemapMode | Action::ActivateMenu => String::new(),
                Action::InvokeMenuEntry(entry) => match path_of(menu, entry) {
                    Some(path) => format!(" {}", path),
                    None => {
                        warn!(
                            "Skipping {} of device {}: {} is not in the menu",
                            address,
                            device.id(),
                            entry
                        );
                        continue;
                    }
                },
            };
            let _ = writeln!(
                out,
                "{} {} {} {}{}",
                device.id(),
                address.kind.code(),
                address.slot,
                cell.action.id(),
                params
            );
        }
        out.push('\n');
    }
    out
}

/// Write the joystick map of all devices to `path`.
pub fn dump_joymap<M: MenuTree + ?Sized>(
    path: &Path,
    registry: &DeviceRegistry,
    menu: &M,
) -> Result<(), CodecError> {
    write_file(path, &render_joymap(registry, menu))?;
    info!("Wrote joystick map {}", path.display());
    Ok(())
}

/// Parse hotkey map text into `table`.
pub fn parse_hotkeys<M: MenuTree + ?Sized>(text: &str, table: &mut HotkeyTable, menu: &M) -> LoadReport {
    let mut report = LoadReport::default();

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(keyword) = line.strip_prefix('!') {
            if parse_keyword(keyword, line_no, &mut report) {
                table.clear_all();
            }
            continue;
        }

        let (fields, path) = take_fields(line, 1);
        let Some(index) = fields.first().and_then(|field| field.parse::<usize>().ok()) else {
            report.reject(CodecError::Malformed(line_no));
            continue;
        };
        let Some((keycode, modifiers)) = split_index(index) else {
            report.reject(CodecError::OutOfRange(line_no));
            continue;
        };
        if path.is_empty() {
            report.reject(CodecError::Malformed(line_no));
            continue;
        }

        let entry = resolve_path(menu, raw_path(raw, 1), path);
        table.set(keycode, modifiers, entry);
        report.applied += 1;
        if entry.is_none() {
            report.reject(CodecError::PathUnresolved {
                line: line_no,
                path: path.to_string(),
            });
        }
    }

    report
}

/// Read and apply a hotkey map file.
pub fn load_hotkeys<M: MenuTree + ?Sized>(
    path: &Path,
    table: &mut HotkeyTable,
    menu: &M,
) -> Result<LoadReport, CodecError> {
    let text = read_file(path)?;
    info!("Loading hotkey map {}", path.display());
    let report = parse_hotkeys(&text, table, menu);
    info!(
        "Hotkey map {}: {} entries applied, {} problems",
        path.display(),
        report.applied,
        report.diagnostics.len()
    );
    Ok(report)
}

pub fn render_hotkeys<M: MenuTree + ?Sized>(table: &HotkeyTable, menu: &M) -> String {
    let mut out = String::from(HOTKEY_HEADER);
    let _ = writeln!(out, "\n!{}\n", CLEAR_KEYWORD);
    for (index, entry) in table.iter() {
        match path_of(menu, entry) {
            Some(path) => {
                let _ = writeln!(out, "{} {}", index, path);
            }
            None => warn!("Skipping hotkey {}: {} is not in the menu", index, entry),
        }
    }
    out
}

pub fn dump_hotkeys<M: MenuTree + ?Sized>(
    path: &Path,
    table: &HotkeyTable,
    menu: &M,
) -> Result<(), CodecError> {
    write_file(path, &render_hotkeys(table, menu))?;
    info!("Wrote hotkey map {}", path.display());
    Ok(())
}

struct JoymapEntry {
    device: usize,
    address: SlotAddress,
    action: Action,
    /// Menu path that did not resolve, the action is `None` then
    unresolved: Option<String>,
}

/// `line` has comments and outer whitespace stripped, `raw` is the line as
/// read. Menu paths are taken from `raw` first since labels may contain `#`
/// or start and end with spaces.
fn parse_joymap_entry<M: MenuTree + ?Sized>(
    line: &str,
    raw: &str,
    line_no: usize,
    menu: &M,
) -> Result<JoymapEntry, CodecError> {
    let malformed = || CodecError::Malformed(line_no);

    let (fields, rest) = take_fields(line, 4);
    let [device, kind, slot, action_id] = fields[..] else {
        return Err(malformed());
    };
    let device: usize = device.parse().map_err(|_| malformed())?;
    let kind: u8 = kind.parse().map_err(|_| malformed())?;
    let kind = InputElementKind::from_code(kind).ok_or(CodecError::OutOfRange(line_no))?;
    let slot: usize = slot.parse().map_err(|_| malformed())?;
    let unknown = || CodecError::UnknownAction {
        line: line_no,
        id: action_id.to_string(),
    };
    let action_id: u8 = action_id.parse().map_err(|_| unknown())?;

    let mut unresolved = None;
    let action = match action_id {
        0 => Action::None,
        1 => {
            let (params, _) = take_fields(rest, 2);
            let [port, pin] = params[..] else {
                return Err(malformed());
            };
            let port: u8 = port.parse().map_err(|_| malformed())?;
            let pin: u8 = pin.parse().map_err(|_| malformed())?;
            let pin = JoyPin::from_mask(pin).ok_or_else(malformed)?;
            Action::Joystick { port, pin }
        }
        2 => {
            let (params, _) = take_fields(rest, 2);
            let [row, col] = params[..] else {
                return Err(malformed());
            };
            Action::Key {
                row: row.parse().map_err(|_| malformed())?,
                col: col.parse().map_err(|_| malformed())?,
            }
        }
        3 => Action::EnterRemapMode,
        4 => Action::ActivateMenu,
        5 => {
            let exact = raw_path(raw, 4);
            if exact.trim().is_empty() {
                return Err(malformed());
            }
            match resolve_path(menu, exact, rest) {
                Some(entry) => Action::InvokeMenuEntry(entry),
                None => {
                    let shown = if rest.is_empty() { exact.trim() } else { rest };
                    unresolved = Some(shown.to_string());
                    Action::None
                }
            }
        }
        _ => return Err(unknown()),
    };

    Ok(JoymapEntry {
        device,
        address: SlotAddress::new(kind, slot),
        action,
        unresolved,
    })
}

/// Returns true for `!CLEAR`, reports anything else.
fn parse_keyword(keyword: &str, line_no: usize, report: &mut LoadReport) -> bool {
    let name = keyword
        .split(|c: char| c.is_whitespace() || c == ':')
        .next()
        .unwrap_or_default();
    if name == CLEAR_KEYWORD {
        debug!("Line {}: clearing mappings", line_no);
        report.cleared = true;
        true
    } else {
        report.reject(CodecError::Malformed(line_no));
        false
    }
}

/// Split off up to `count` whitespace separated fields, return them and the
/// trimmed remainder.
fn take_fields(line: &str, count: usize) -> (Vec<&str>, &str) {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line;
    while fields.len() < count {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        fields.push(&trimmed[..end]);
        rest = &trimmed[end..];
    }
    (fields, rest.trim())
}

/// Remainder of `raw` after `fields` fields and the single separating
/// blank written by the dump, with only the line ending removed.
fn raw_path(raw: &str, fields: usize) -> &str {
    let mut rest = raw;
    for _ in 0..fields {
        let trimmed = rest.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        rest = &trimmed[end..];
    }
    let rest = rest.trim_end_matches(['\r', '\n']);
    rest.strip_prefix([' ', '\t']).unwrap_or(rest)
}

/// Resolve the path exactly as written, then the comment-stripped form
/// hand-edited files use.
fn resolve_path<M: MenuTree + ?Sized>(menu: &M, exact: &str, stripped: &str) -> Option<MenuRef> {
    resolve(menu, exact).or_else(|| resolve(menu, stripped))
}

fn read_file(path: &Path) -> Result<String, CodecError> {
    fs::read_to_string(path).map_err(|e| CodecError::from_io(path.to_path_buf(), e))
}

fn write_file(path: &Path, content: &str) -> Result<(), CodecError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CodecError::from_io(parent.to_path_buf(), e))?;
    }
    fs::write(path, content).map_err(|e| CodecError::from_io(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::device::DeviceInfo;
    use crate::mapping::hotkey::Modifiers;
    use crate::mapping::table::{DefaultPolicy, ElementCounts};
    use crate::menu::{MenuArena, MenuRef};
    use proptest::prelude::*;

    fn menu() -> (MenuArena, MenuRef, MenuRef) {
        let mut menu = MenuArena::new();
        let root = menu.root();
        let drive = menu.add_submenu(root, "Drive").unwrap();
        let attach = menu.add_item(drive, "Attach disk image to drive 8").unwrap();
        let reset = menu.add_item(root, "Reset").unwrap();
        (menu, attach, reset)
    }

    fn registry(devices: usize) -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        for i in 0..devices {
            registry.register(
                &DeviceInfo {
                    name: format!("Pad {}", i),
                    counts: ElementCounts {
                        axes: 2,
                        buttons: 4,
                        hats: 1,
                        balls: 1,
                    },
                    resting_axes: Vec::new(),
                },
                &DefaultPolicy::default(),
            );
        }
        registry
    }

    fn action(registry: &DeviceRegistry, device: usize, kind: InputElementKind, slot: usize) -> Action {
        registry.get(device).unwrap().table.action(SlotAddress::new(kind, slot))
    }

    #[test]
    fn parses_every_action_kind() {
        let (menu, attach, _) = menu();
        let mut registry = registry(1);
        let text = "\
0 0 0 1 1 2
0 1 0 2 -3 5   # extra key
0 1 1 3
0 1 2 4
0 1 3 5 Drive&Attach disk image to drive 8
0 2 0 0
";
        let report = parse_joymap(text, &mut registry, &menu);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(report.applied, 6);
        assert_eq!(
            action(&registry, 0, InputElementKind::Axis, 0),
            Action::Joystick { port: 1, pin: JoyPin::Down }
        );
        assert_eq!(
            action(&registry, 0, InputElementKind::Button, 0),
            Action::Key { row: -3, col: 5 }
        );
        assert_eq!(action(&registry, 0, InputElementKind::Button, 1), Action::EnterRemapMode);
        assert_eq!(action(&registry, 0, InputElementKind::Button, 2), Action::ActivateMenu);
        assert_eq!(
            action(&registry, 0, InputElementKind::Button, 3),
            Action::InvokeMenuEntry(attach)
        );
        assert_eq!(action(&registry, 0, InputElementKind::Hat, 0), Action::None);
    }

    #[test]
    fn clear_keyword_wipes_before_later_lines() {
        let (menu, _, _) = menu();
        let mut registry = registry(2);
        let report = parse_joymap("!CLEAR\n1 1 0 4\n", &mut registry, &menu);
        assert!(report.cleared);
        assert!(registry.get(0).unwrap().table.iter().all(|(_, cell)| cell.action.is_none()));
        assert_eq!(action(&registry, 1, InputElementKind::Button, 0), Action::ActivateMenu);
    }

    #[test]
    fn bad_lines_are_reported_individually() {
        let (menu, _, _) = menu();
        let mut registry = registry(1);
        let text = "\
0 1 0
0 1 1 9
5 1 0 4
0 1 7 4
0 0 0 1 0 3
0 1 2 5 Drive&Format disk
!RESET
0 1 3 3
";
        let report = parse_joymap(text, &mut registry, &menu);
        let lines: Vec<Option<usize>> = report.diagnostics.iter().map(CodecError::line).collect();
        assert_eq!(lines, vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(6), Some(7)]);
        assert!(matches!(report.diagnostics[0], CodecError::Malformed(1)));
        assert!(matches!(report.diagnostics[1], CodecError::UnknownAction { line: 2, .. }));
        assert!(matches!(report.diagnostics[2], CodecError::OutOfRange(3)));
        assert!(matches!(report.diagnostics[3], CodecError::OutOfRange(4)));
        assert!(matches!(report.diagnostics[4], CodecError::Malformed(5)));
        assert!(matches!(report.diagnostics[5], CodecError::PathUnresolved { line: 6, .. }));
        assert_eq!(action(&registry, 0, InputElementKind::Button, 2), Action::None);
        assert_eq!(action(&registry, 0, InputElementKind::Button, 3), Action::EnterRemapMode);
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn dump_skips_none_and_unreachable_entries() {
        let (mut menu, attach, reset) = menu();
        let mut registry = registry(1);
        {
            let table = &mut registry.get_mut(0).unwrap().table;
            table.clear();
            table.set_action(SlotAddress::new(InputElementKind::Button, 0), Action::InvokeMenuEntry(reset));
            table.set_action(SlotAddress::new(InputElementKind::Button, 1), Action::InvokeMenuEntry(attach));
        }
        menu.detach(attach).unwrap();

        let text = render_joymap(&registry, &menu);
        assert!(text.starts_with("# Joystick mapping file"));
        let data: Vec<&str> = text
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        assert_eq!(data, vec!["!CLEAR", "0 1 0 5 Reset"]);
    }

    #[test]
    fn hotkey_paths_may_contain_hash() {
        let mut menu = MenuArena::new();
        let root = menu.root();
        let entry = menu.add_item(root, "Drive #8 settings").unwrap();
        let mut table = HotkeyTable::new();
        let index = 100 + 2 * 512;
        let report = parse_hotkeys(
            &format!("# comment\n!CLEAR\n{} Drive #8 settings\n", index),
            &mut table,
            &menu,
        );
        assert!(report.is_clean());
        assert_eq!(table.get(100, Modifiers::ALT), Some(entry));
    }

    #[test]
    fn labels_with_hash_and_padding_survive_dump_and_reload() {
        let mut menu = MenuArena::new();
        let root = menu.root();
        let drive = menu.add_submenu(root, "Drive #8 settings").unwrap();
        let padded = menu.add_item(drive, " Padded ").unwrap();
        let hashed = menu.add_item(root, "#9").unwrap();

        let mut registry = registry(1);
        {
            let table = &mut registry.get_mut(0).unwrap().table;
            table.set_action(SlotAddress::new(InputElementKind::Button, 0), Action::InvokeMenuEntry(padded));
            table.set_action(SlotAddress::new(InputElementKind::Button, 1), Action::InvokeMenuEntry(hashed));
        }
        let mut loaded = registry.clone();
        loaded.clear_all();
        let report = parse_joymap(&render_joymap(&registry, &menu), &mut loaded, &menu);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(registry.get(0).unwrap().table, loaded.get(0).unwrap().table);

        let mut table = HotkeyTable::new();
        table.set(100, Modifiers::ALT, Some(padded));
        table.set(101, Modifiers::NONE, Some(hashed));
        let mut reloaded = HotkeyTable::new();
        let report = parse_hotkeys(&render_hotkeys(&table, &menu), &mut reloaded, &menu);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(reloaded, table);
    }

    #[test]
    fn hand_written_path_with_trailing_comment_still_resolves() {
        let (menu, attach, _) = menu();
        let mut registry = registry(1);
        let report = parse_joymap(
            "0 1 0 5 Drive&Attach disk image to drive 8   # fire opens attach\r\n",
            &mut registry,
            &menu,
        );
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(
            action(&registry, 0, InputElementKind::Button, 0),
            Action::InvokeMenuEntry(attach)
        );
    }

    #[test]
    fn hotkey_errors() {
        let (menu, _, reset) = menu();
        let mut table = HotkeyTable::new();
        table.set(5, Modifiers::NONE, Some(reset));
        let report = parse_hotkeys("8192 Reset\nabc Reset\n7\n5 Nope\n", &mut table, &menu);
        assert!(matches!(report.diagnostics[0], CodecError::OutOfRange(1)));
        assert!(matches!(report.diagnostics[1], CodecError::Malformed(2)));
        assert!(matches!(report.diagnostics[2], CodecError::Malformed(3)));
        assert!(matches!(report.diagnostics[3], CodecError::PathUnresolved { line: 4, .. }));
        assert_eq!(table.get(5, Modifiers::NONE), None);
    }

    #[test]
    fn files_round_trip_on_disk() {
        let (menu, attach, reset) = menu();
        let dir = tempfile::tempdir().unwrap();
        let joymap = dir.path().join("maps").join("joymap.txt");
        let hotkeys = dir.path().join("hotkeys.txt");

        let mut registry = registry(2);
        registry.get_mut(1).unwrap().table.set_action(
            SlotAddress::new(InputElementKind::Ball, 0),
            Action::InvokeMenuEntry(attach),
        );
        dump_joymap(&joymap, &registry, &menu).unwrap();

        let mut table = HotkeyTable::new();
        table.set(113, Modifiers::CTRL, Some(reset));
        dump_hotkeys(&hotkeys, &table, &menu).unwrap();

        let mut loaded = registry.clone();
        loaded.clear_all();
        let report = load_joymap(&joymap, &mut loaded, &menu).unwrap();
        assert!(report.is_clean());
        for (original, reloaded) in registry.iter().zip(loaded.iter()) {
            assert_eq!(original.table, reloaded.table);
        }

        let mut reloaded = HotkeyTable::new();
        load_hotkeys(&hotkeys, &mut reloaded, &menu).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn missing_file_is_not_found() {
        let (menu, _, _) = menu();
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(1);
        let result = load_joymap(&dir.path().join("absent"), &mut registry, &menu);
        assert!(matches!(result, Err(CodecError::NotFound(_))));
    }

    fn arb_action(entries: Vec<MenuRef>) -> impl Strategy<Value = Action> {
        let pins = prop_oneof![
            Just(JoyPin::Up),
            Just(JoyPin::Down),
            Just(JoyPin::Left),
            Just(JoyPin::Right),
            Just(JoyPin::Fire),
        ];
        prop_oneof![
            Just(Action::None),
            (0u8..4, pins).prop_map(|(port, pin)| Action::Joystick { port, pin }),
            (-8i16..8, 0i16..8).prop_map(|(row, col)| Action::Key { row, col }),
            Just(Action::EnterRemapMode),
            Just(Action::ActivateMenu),
            proptest::sample::select(entries).prop_map(Action::InvokeMenuEntry),
        ]
    }

    proptest! {
        #[test]
        fn dump_then_load_restores_table(
            actions in proptest::collection::vec(arb_action(vec![MenuRef(2), MenuRef(3)]), 13)
        ) {
            let (menu, _, _) = menu();
            let mut registry = registry(1);
            {
                let table = &mut registry.get_mut(0).unwrap().table;
                let addresses: Vec<SlotAddress> = table.iter().map(|(address, _)| address).collect();
                for (address, action) in addresses.into_iter().zip(actions) {
                    table.set_action(address, action);
                }
            }
            let text = render_joymap(&registry, &menu);

            let mut loaded = registry.clone();
            loaded.clear_all();
            let report = parse_joymap(&text, &mut loaded, &menu);
            prop_assert!(report.is_clean());
            prop_assert_eq!(&registry.get(0).unwrap().table, &loaded.get(0).unwrap().table);
        }

        #[test]
        fn patch_leaves_unmentioned_cells(slot in 0usize..4, code in 3u8..5) {
            let (menu, _, _) = menu();
            let mut registry = registry(1);
            let before = registry.get(0).unwrap().table.clone();
            parse_joymap(&format!("0 1 {} {}\n", slot, code), &mut registry, &menu);

            let after = &registry.get(0).unwrap().table;
            for ((address, old), (_, new)) in before.iter().zip(after.iter()) {
                if address != SlotAddress::new(InputElementKind::Button, slot) {
                    prop_assert_eq!(old, new);
                }
            }
        }
    }
}
