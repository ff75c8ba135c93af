//! Characteristic Resolver
//!
//! Maps the START/STOP, KEY and VALUE roles to characteristic paths. Either
//! all three resolve or the session stops before any write.

use crate::domain::models::{CharacteristicUuid, Role};
use crate::infrastructure::bluetooth::error::ResolutionError;
use crate::infrastructure::bluetooth::object_tree::RemoteObjectTree;
use crate::infrastructure::bluetooth::protocol::{KEY_CHAR_UUID, STARTSTOP_CHAR_UUID, VALUE_CHAR_UUID};
use crate::infrastructure::bluetooth::scanner;
use crate::infrastructure::bluetooth::transport::{Endpoint, Endpoints};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// UUIDs identifying each role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicUuids {
    pub startstop: CharacteristicUuid,
    pub key: CharacteristicUuid,
    pub value: CharacteristicUuid,
}

impl Default for CharacteristicUuids {
    fn default() -> Self {
        Self {
            startstop: CharacteristicUuid(STARTSTOP_CHAR_UUID),
            key: CharacteristicUuid(KEY_CHAR_UUID),
            value: CharacteristicUuid(VALUE_CHAR_UUID),
        }
    }
}

impl CharacteristicUuids {
    pub fn for_role(&self, role: Role) -> &CharacteristicUuid {
        match role {
            Role::StartStop => &self.startstop,
            Role::Key => &self.key,
            Role::Value => &self.value,
        }
    }
}

pub fn resolve_endpoints(
    tree: &RemoteObjectTree,
    device_path: &str,
    uuids: &CharacteristicUuids,
) -> Result<Endpoints, ResolutionError> {
    let lookup = |role: Role| {
        let found = scanner::find_characteristic(tree, device_path, uuids.for_role(role));
        match found {
            Some(path) => info!("Found {} characteristic: {}", role, path),
            None => warn!(
                "{} characteristic {} not found under {}",
                role,
                uuids.for_role(role),
                device_path
            ),
        }
        found.map(|path| Endpoint {
            role,
            path: path.to_string(),
        })
    };

    let [startstop, key, value] = Role::ALL.map(lookup);
    match (startstop, key, value) {
        (Some(startstop), Some(key), Some(value)) => Ok(Endpoints {
            startstop,
            key,
            value,
        }),
        (startstop, key, value) => {
            let missing = [
                (Role::StartStop, startstop.is_none()),
                (Role::Key, key.is_none()),
                (Role::Value, value.is_none()),
            ]
            .into_iter()
            .filter_map(|(role, missing)| missing.then_some(role))
            .collect();

            Err(ResolutionError {
                device_path: device_path.to_string(),
                missing,
            })
        }
    }
}
