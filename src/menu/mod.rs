//! Menu tree access used by the mapping tables.
//!
//! The tree itself belongs to the host UI. Mappings only hold [`MenuRef`]s,
//! which are stable ids handed out by the tree, and go through the
//! [`path`] resolver whenever a reference has to be written to disk.

pub mod path;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub use path::{path_of, resolve, PATH_DELIMITER};

/// Non-owning reference to an entry of the live menu tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MenuRef(pub u32);

impl fmt::Display for MenuRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "menu#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Leaf,
    Submenu,
}

/// Read-only view of the host's menu tree.
pub trait MenuTree {
    fn root(&self) -> MenuRef;

    /// Children of a submenu in display order. Empty for leaves and
    /// unknown references.
    fn children(&self, entry: MenuRef) -> Vec<MenuRef>;

    fn label(&self, entry: MenuRef) -> Option<&str>;

    fn kind(&self, entry: MenuRef) -> Option<EntryKind>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("Label contains the reserved path delimiter: {0}")]
    ReservedDelimiter(String),

    #[error("Parent entry is not a submenu: {0}")]
    NotASubmenu(MenuRef),

    #[error("Unknown menu entry: {0}")]
    UnknownEntry(MenuRef),

    #[error("{parent} already has an entry labelled {label:?}")]
    DuplicateLabel { parent: MenuRef, label: String },
}

#[derive(Debug, Clone)]
struct MenuNode {
    label: String,
    kind: EntryKind,
    children: Vec<MenuRef>,
}

/// Arena-backed menu tree.
///
/// Ids are never reused, so a reference to a detached entry stays harmless:
/// it simply stops being reachable from the root.
#[derive(Debug, Clone)]
pub struct MenuArena {
    nodes: Vec<MenuNode>,
}

impl Default for MenuArena {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![MenuNode {
                label: String::new(),
                kind: EntryKind::Submenu,
                children: Vec::new(),
            }],
        }
    }

    pub fn add_submenu(&mut self, parent: MenuRef, label: &str) -> Result<MenuRef, MenuError> {
        self.insert(parent, label, EntryKind::Submenu)
    }

    pub fn add_item(&mut self, parent: MenuRef, label: &str) -> Result<MenuRef, MenuError> {
        self.insert(parent, label, EntryKind::Leaf)
    }

    /// Unhook an entry (and its subtree) from its parent
    pub fn detach(&mut self, entry: MenuRef) -> Result<(), MenuError> {
        if self.node(entry).is_none() {
            return Err(MenuError::UnknownEntry(entry));
        }
        for node in &mut self.nodes {
            node.children.retain(|child| *child != entry);
        }
        debug!("Detached menu entry {}", entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn insert(&mut self, parent: MenuRef, label: &str, kind: EntryKind) -> Result<MenuRef, MenuError> {
        if label.contains(PATH_DELIMITER) {
            return Err(MenuError::ReservedDelimiter(label.to_string()));
        }
        let siblings = match self.node(parent) {
            Some(node) if node.kind == EntryKind::Submenu => &node.children,
            Some(_) => return Err(MenuError::NotASubmenu(parent)),
            None => return Err(MenuError::UnknownEntry(parent)),
        };
        if siblings.iter().any(|sibling| self.label(*sibling) == Some(label)) {
            return Err(MenuError::DuplicateLabel {
                parent,
                label: label.to_string(),
            });
        }

        let id = MenuRef(self.nodes.len() as u32);
        self.nodes.push(MenuNode {
            label: label.to_string(),
            kind,
            children: Vec::new(),
        });
        if let Some(node) = self.nodes.get_mut(parent.0 as usize) {
            node.children.push(id);
        }
        Ok(id)
    }

    fn node(&self, entry: MenuRef) -> Option<&MenuNode> {
        self.nodes.get(entry.0 as usize)
    }
}

impl MenuTree for MenuArena {
    fn root(&self) -> MenuRef {
        MenuRef(0)
    }

    fn children(&self, entry: MenuRef) -> Vec<MenuRef> {
        self.node(entry)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn label(&self, entry: MenuRef) -> Option<&str> {
        self.node(entry).map(|node| node.label.as_str())
    }

    fn kind(&self, entry: MenuRef) -> Option<EntryKind> {
        self.node(entry).map(|node| node.kind)
    }
}
