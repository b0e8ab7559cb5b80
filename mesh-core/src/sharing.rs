//! Folder-sharing planning.
//!
//! Unlike pairing, sharing is a full replace: the folder's device list must
//! equal the fleet's identity set, so devices that left the fleet are
//! dropped from the folder too.

use mesh_types::DeviceId;

/// What to do with one peer's folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingDecision {
    /// The folder is already shared with exactly the fleet.
    Unchanged,
    /// Replace the folder's device list with these devices.
    Replace(Vec<DeviceId>),
}

/// Unordered equality of two device lists.
pub fn same_members(a: &[DeviceId], b: &[DeviceId]) -> bool {
    let mut a: Vec<&DeviceId> = a.iter().collect();
    let mut b: Vec<&DeviceId> = b.iter().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Compare a folder's current sharing set against the target set.
pub fn plan_sharing(current: &[DeviceId], target: &[DeviceId]) -> SharingDecision {
    if same_members(current, target) {
        SharingDecision::Unchanged
    } else {
        SharingDecision::Replace(target.to_vec())
    }
}
