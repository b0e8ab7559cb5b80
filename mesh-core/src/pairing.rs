//! Pairing planning.
//!
//! A peer must know every other member of the fleet. Pairing is additive:
//! devices the peer knows but the fleet no longer contains are left alone.

use mesh_types::DeviceId;
use std::collections::HashSet;

/// Target devices the peer does not know yet, in target order.
///
/// `own` is the peer's own identity and is never returned: a peer cannot
/// pair with itself. Each device is returned at most once, since adding a
/// known device is rejected by the peer.
pub fn missing_devices(known: &[DeviceId], target: &[DeviceId], own: &DeviceId) -> Vec<DeviceId> {
    let mut planned = HashSet::new();
    target
        .iter()
        .filter(|id| *id != own && !known.contains(id))
        .filter(|id| planned.insert(*id))
        .cloned()
        .collect()
}
