//! BlueZ Connection Module
//!
//! Handles the system bus connection, the device checks and GATT writes
//! through `org.bluez`.

use crate::infrastructure::bluetooth::error::{SessionError, TransportError};
use crate::infrastructure::bluetooth::object_tree::{PropertyMap, PropertyValue, RemoteObjectTree};
use crate::infrastructure::bluetooth::protocol::{
    BLUEZ_BUS_NAME, DEVICE_INTERFACE, GATT_CHARACTERISTIC_INTERFACE,
};
use crate::infrastructure::bluetooth::transport::CharacteristicWriter;
use async_trait::async_trait;
use dbus::arg::{cast, PropMap, RefArg, Variant};
use dbus::nonblock::stdintf::org_freedesktop_dbus::{ObjectManager, Properties};
use dbus::nonblock::{Proxy, SyncConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// What a programming run needs from the bus
#[async_trait(?Send)]
pub trait DeviceBus {
    type Writer: CharacteristicWriter;

    /// `Device1.Connected` of `device_path`; fails if the object does not exist
    async fn is_device_connected(&self, device_path: &str) -> Result<bool, SessionError>;

    /// Snapshot of every object BlueZ currently manages
    async fn fetch_object_tree(&self) -> Result<RemoteObjectTree, SessionError>;

    fn writer(&self) -> Self::Writer;
}

/// Connection to BlueZ on the system bus
pub struct BusSession {
    conn: Arc<SyncConnection>,
    call_timeout: Duration,
}

impl BusSession {
    /// Connect to the system bus. Must be called inside the tokio runtime.
    pub fn connect(call_timeout: Duration) -> Result<Self, SessionError> {
        let (resource, conn) = dbus_tokio::connection::new_system_sync()
            .map_err(|e| SessionError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            let err = resource.await;
            error!("Lost connection to D-Bus: {}", err);
        });

        info!("Connected to the system bus");
        Ok(Self { conn, call_timeout })
    }

    fn proxy<'a>(&self, path: dbus::Path<'a>) -> Proxy<'a, Arc<SyncConnection>> {
        Proxy::new(BLUEZ_BUS_NAME, path, self.call_timeout, self.conn.clone())
    }
}

#[async_trait(?Send)]
impl DeviceBus for BusSession {
    type Writer = DbusCharacteristicWriter;

    async fn is_device_connected(&self, device_path: &str) -> Result<bool, SessionError> {
        let not_found = || SessionError::DeviceNotFound {
            path: device_path.to_string(),
        };
        let path = dbus::Path::new(device_path.to_string()).map_err(|_| not_found())?;

        let connected = self
            .proxy(path)
            .get::<bool>(DEVICE_INTERFACE, "Connected")
            .await
            .map_err(|e| {
                debug!("Reading Connected of {} failed: {}", device_path, e);
                classify_device_error(device_path, e.name(), &e.to_string())
            })?;

        info!("Device {} connected: {}", device_path, connected);
        Ok(connected)
    }

    async fn fetch_object_tree(&self) -> Result<RemoteObjectTree, SessionError> {
        let objects = self
            .proxy(dbus::Path::from("/"))
            .get_managed_objects()
            .await
            .map_err(|e| SessionError::Introspection(e.to_string()))?;

        let tree: RemoteObjectTree = objects
            .into_iter()
            .map(|(path, interfaces)| {
                let interfaces = interfaces
                    .into_iter()
                    .map(|(name, props)| (name, property_map(&props)))
                    .collect();
                (path.to_string(), interfaces)
            })
            .collect();

        info!("Fetched {} managed objects", tree.len());
        Ok(tree)
    }

    fn writer(&self) -> DbusCharacteristicWriter {
        DbusCharacteristicWriter {
            conn: self.conn.clone(),
            call_timeout: self.call_timeout,
        }
    }
}

/// D-Bus errors meaning the device object or its `Device1` interface is absent
const MISSING_DEVICE_ERRORS: &[&str] = &[
    "org.freedesktop.DBus.Error.UnknownObject",
    "org.freedesktop.DBus.Error.UnknownInterface",
    "org.freedesktop.DBus.Error.UnknownProperty",
    "org.freedesktop.DBus.Error.InvalidArgs",
];

/// A missing device object is `DeviceNotFound`; anything else (BlueZ not
/// running, no reply, access denied) means the bus or service is unreachable.
fn classify_device_error(device_path: &str, name: Option<&str>, message: &str) -> SessionError {
    match name {
        Some(name) if MISSING_DEVICE_ERRORS.contains(&name) => SessionError::DeviceNotFound {
            path: device_path.to_string(),
        },
        _ => SessionError::Connection(message.to_string()),
    }
}

fn property_map(props: &PropMap) -> PropertyMap {
    props
        .iter()
        .map(|(name, value)| (name.clone(), property_value(value)))
        .collect()
}

fn property_value(value: &Variant<Box<dyn RefArg>>) -> PropertyValue {
    let inner: &dyn RefArg = &*value.0;
    if let Some(s) = inner.as_str() {
        PropertyValue::Text(s.to_string())
    } else if let Some(b) = cast::<bool>(inner) {
        PropertyValue::Bool(*b)
    } else if let Some(bytes) = cast::<Vec<u8>>(inner) {
        PropertyValue::Bytes(bytes.clone())
    } else {
        PropertyValue::Other
    }
}

/// Writes through `org.bluez.GattCharacteristic1.WriteValue`
pub struct DbusCharacteristicWriter {
    conn: Arc<SyncConnection>,
    call_timeout: Duration,
}

#[async_trait]
impl CharacteristicWriter for DbusCharacteristicWriter {
    async fn write_value(&self, path: &str, value: &[u8]) -> Result<(), TransportError> {
        let object_path = dbus::Path::new(path.to_string())
            .map_err(|e| TransportError::rejected(path, None, &e))?;

        let reply = {
            let proxy = Proxy::new(
                BLUEZ_BUS_NAME,
                object_path,
                self.call_timeout,
                self.conn.clone(),
            );
            // "request" asks for a write with response
            let mut options = PropMap::new();
            options.insert(
                "type".to_string(),
                Variant(Box::new("request".to_string()) as Box<dyn RefArg>),
            );
            proxy.method_call::<(), _, _, _>(
                GATT_CHARACTERISTIC_INTERFACE,
                "WriteValue",
                (value.to_vec(), options),
            )
        };

        reply.await.map_err(|e| {
            TransportError::rejected(path, e.name(), e.message().unwrap_or("write failed"))
        })
    }
}
