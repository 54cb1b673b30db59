//! Device registry, one action table per discovered device.

use super::table::{ActionTable, DefaultPolicy, ElementCounts};
use crate::controller::event::DeviceId;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What the input backend reports about a device at discovery time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub counts: ElementCounts,
    /// Axis positions sampled at discovery
    #[serde(default)]
    pub resting_axes: Vec<i16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    name: String,
    counts: ElementCounts,
    pub table: ActionTable,
}

impl Device {
    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counts(&self) -> ElementCounts {
        self.counts
    }
}

/// All devices known to the engine, indexed by discovery order.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    ports_swapped: bool,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device with its default table and return its id.
    pub fn register(&mut self, info: &DeviceInfo, policy: &DefaultPolicy) -> DeviceId {
        let id = self.devices.len();
        let mut table = ActionTable::with_defaults(id, info.counts, &info.resting_axes, policy);
        if self.ports_swapped {
            table.swap_ports();
        }
        info!(
            "Registered device {}: {} ({} axes, {} buttons, {} hats, {} balls)",
            id, info.name, info.counts.axes, info.counts.buttons, info.counts.hats, info.counts.balls
        );
        self.devices.push(Device {
            id,
            name: info.name.clone(),
            counts: info.counts,
            table,
        });
        id
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut()
    }

    /// Wipe every table's actions
    pub fn clear_all(&mut self) {
        for device in &mut self.devices {
            device.table.clear();
        }
    }

    pub fn ports_swapped(&self) -> bool {
        self.ports_swapped
    }

    /// Flip ports 1/2 on every joystick action of every device.
    ///
    /// Returns the new swapped flag.
    pub fn swap_ports(&mut self) -> bool {
        let changed: usize = self
            .devices
            .iter_mut()
            .map(|device| device.table.swap_ports())
            .sum();
        self.ports_swapped = !self.ports_swapped;
        info!(
            "Swapped joystick ports on {} actions, ports now {}",
            changed,
            if self.ports_swapped { "swapped" } else { "normal" }
        );
        self.ports_swapped
    }
}
