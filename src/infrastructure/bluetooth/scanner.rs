//! Object Tree Scanner
//!
//! Finds GATT characteristics of one device in a managed-object snapshot.

use crate::domain::models::CharacteristicUuid;
use crate::infrastructure::bluetooth::object_tree::{PropertyValue, RemoteObjectTree};
use crate::infrastructure::bluetooth::protocol::GATT_CHARACTERISTIC_INTERFACE;
use tracing::trace;

/// True if `path` lies below `device_path` in the object hierarchy
pub fn is_descendant(path: &str, device_path: &str) -> bool {
    let device_path = device_path.trim_end_matches('/');
    path.strip_prefix(device_path)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

/// Path of the characteristic with `uuid` under `device_path`.
///
/// The stack exposes at most one characteristic per UUID per device, so the
/// first match in path order is returned without checking for others.
pub fn find_characteristic<'a>(
    tree: &'a RemoteObjectTree,
    device_path: &str,
    uuid: &CharacteristicUuid,
) -> Option<&'a str> {
    tree.iter()
        .filter(|(path, _)| is_descendant(path, device_path))
        .find_map(|(path, interfaces)| {
            let reported = interfaces
                .get(GATT_CHARACTERISTIC_INTERFACE)?
                .get("UUID")
                .and_then(PropertyValue::as_str)?;
            trace!("Characteristic {} reports UUID {}", path, reported);
            uuid.matches(reported).then_some(path)
        })
}
