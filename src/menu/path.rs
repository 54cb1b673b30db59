//! Conversion between menu references and `&`-delimited label paths.

use super::{EntryKind, MenuRef, MenuTree};

/// Separator between labels in a stored path. Menu labels may not contain it.
pub const PATH_DELIMITER: char = '&';

/// Label path of `entry`, or `None` if it is not reachable from the root.
pub fn path_of<T: MenuTree + ?Sized>(tree: &T, entry: MenuRef) -> Option<String> {
    let mut labels = Vec::new();
    if find(tree, tree.root(), entry, &mut labels) {
        Some(labels.join(&PATH_DELIMITER.to_string()))
    } else {
        None
    }
}

fn find<'a, T: MenuTree + ?Sized>(
    tree: &'a T,
    menu: MenuRef,
    target: MenuRef,
    labels: &mut Vec<&'a str>,
) -> bool {
    for child in tree.children(menu) {
        let Some(label) = tree.label(child) else {
            continue;
        };
        labels.push(label);
        if child == target {
            return true;
        }
        if tree.kind(child) == Some(EntryKind::Submenu) && find(tree, child, target, labels) {
            return true;
        }
        labels.pop();
    }
    false
}

/// Walk the tree label by label. Only submenus are descended into.
///
/// Trees that are not a [`super::MenuArena`] may repeat a label among
/// siblings, so every matching child is tried in display order.
pub fn resolve<T: MenuTree + ?Sized>(tree: &T, path: &str) -> Option<MenuRef> {
    let tokens: Vec<&str> = path.split(PATH_DELIMITER).collect();
    walk(tree, tree.root(), &tokens)
}

fn walk<T: MenuTree + ?Sized>(tree: &T, menu: MenuRef, tokens: &[&str]) -> Option<MenuRef> {
    let (token, rest) = tokens.split_first()?;
    tree.children(menu)
        .into_iter()
        .filter(|child| tree.label(*child) == Some(*token))
        .find_map(|child| {
            if rest.is_empty() {
                Some(child)
            } else if tree.kind(child) == Some(EntryKind::Submenu) {
                walk(tree, child, rest)
            } else {
                None
            }
        })
}
