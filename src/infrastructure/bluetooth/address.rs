//! Hardware address to BlueZ object path

use std::fmt;
use std::str::FromStr;

/// BlueZ device object path for `address` under `adapter_path`.
///
/// `E8:df:24:50:C1:E4` under `/org/bluez/hci0` becomes
/// `/org/bluez/hci0/dev_E8_DF_24_50_C1_E4`. The address is not validated here.
pub fn device_path(adapter_path: &str, address: &str) -> String {
    format!(
        "{}/dev_{}",
        adapter_path.trim_end_matches('/'),
        address.trim().to_uppercase().replace(':', "_")
    )
}

/// A validated colon-separated Bluetooth address, as accepted on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdAddr(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Bluetooth address {0:?}, expected six hex octets like E8:DF:24:50:C1:E4")]
pub struct InvalidAddress(pub String);

impl FromStr for BdAddr {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<&str> = s.trim().split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(InvalidAddress(s.to_string()));
        }
        Ok(Self(s.trim().to_uppercase()))
    }
}

impl BdAddr {
    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn device_path(&self, adapter_path: &str) -> String {
        device_path(adapter_path, &self.0)
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
