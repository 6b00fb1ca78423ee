//! Disk selection: which device the disk chart follows.

use tracing::debug;

use crate::series::DiskDeviceSet;

/// The currently selected disk device, if any.
///
/// A selection that is missing or not among the offered devices is replaced
/// by the first offered device when [`DiskSelection::resolve`] runs. A valid
/// selection only changes through [`DiskSelection::select`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskSelection {
    selected: Option<String>,
}

impl DiskSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(device: impl Into<String>) -> Self {
        Self {
            selected: Some(device.into()),
        }
    }

    /// Selected device, or `""` when nothing is selected (matches no disk).
    pub fn current(&self) -> &str {
        self.selected.as_deref().unwrap_or("")
    }

    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_valid_for(&self, devices: &DiskDeviceSet) -> bool {
        self.selected.as_deref().is_some_and(|d| devices.contains(d))
    }

    /// Explicit selection by the user.
    pub fn select(&mut self, device: impl Into<String>) {
        self.selected = Some(device.into());
    }

    /// Re-resolve a dangling selection against freshly fetched devices.
    /// Returns true when the selection changed.
    pub fn resolve(&mut self, devices: &DiskDeviceSet) -> bool {
        if self.is_valid_for(devices) {
            return false;
        }
        let Some(first) = devices.first() else {
            return false;
        };
        debug!(
            from = self.current(),
            to = first,
            "disk selection resolved to first device"
        );
        self.selected = Some(first.to_string());
        true
    }
}
