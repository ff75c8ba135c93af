use serde::{Deserialize, Serialize};
use std::fmt;

/// One button of the remote: the key code selecting the button slot and the
/// IR waveform stored under it. Both are opaque to this program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrCodeEntry {
    #[serde(default)]
    pub name: String,
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

impl IrCodeEntry {
    pub fn new(name: &str, key: &[u8], value: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }
}

/// The three programming endpoints exposed by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// START/STOP control
    StartStop,
    /// KEY selector
    Key,
    /// VALUE payload
    Value,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::StartStop, Role::Key, Role::Value];

    pub fn label(&self) -> &'static str {
        match self {
            Self::StartStop => "START/STOP",
            Self::Key => "KEY",
            Self::Value => "VALUE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase of a programming session.
///
/// `Writing(i)` carries the zero-based index of the entry being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Started,
    Writing(usize),
    Stopped,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Started => f.write_str("start"),
            Self::Writing(i) => write!(f, "writing entry {}", i + 1),
            Self::Stopped => f.write_str("stop"),
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim()).map_err(D::Error::custom)
    }
}

/// Wrapper so a bare UUID string in JSON is validated on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacteristicUuid(pub uuid::Uuid);

impl CharacteristicUuid {
    /// Case-insensitive comparison against the string form BlueZ reports
    pub fn matches(&self, reported: &str) -> bool {
        uuid::Uuid::parse_str(reported.trim())
            .map(|u| u == self.0)
            .unwrap_or(false)
    }
}

impl fmt::Display for CharacteristicUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_rejects_bad_hex() {
        let odd = serde_json::from_str::<IrCodeEntry>(r#"{"key":"001","value":"00"}"#);
        assert!(odd.unwrap_err().to_string().contains("Odd number of digits"));

        let digit = serde_json::from_str::<IrCodeEntry>(r#"{"key":"0g","value":"00"}"#);
        assert!(digit.unwrap_err().to_string().contains("Invalid character 'g' at position 1"));

        assert!(serde_json::from_str::<IrCodeEntry>(r#"{"key":"00","value":"é0"}"#).is_err());
    }

    #[test]
    fn test_entry_json_uses_hex() {
        let entry = IrCodeEntry::new("Mute", &[0x00, 0xa4], &[0x00]);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"name":"Mute","key":"00a4","value":"00"}"#);

        let parsed: IrCodeEntry = serde_json::from_str(r#"{"key":"001A","value":"00"}"#).unwrap();
        assert_eq!(parsed.key, vec![0x00, 0x1a]);
        assert!(parsed.name.is_empty());

        let padded: IrCodeEntry = serde_json::from_str(r#"{"key":" 0221017C ","value":""}"#).unwrap();
        assert_eq!(padded.key, vec![0x02, 0x21, 0x01, 0x7c]);
        assert!(padded.value.is_empty());
    }

    #[test]
    fn test_uuid_matches_any_case() {
        let uuid: CharacteristicUuid =
            serde_json::from_str(r#""d343bfc1-5a21-4f05-bc7d-af01f617b664""#).unwrap();
        assert!(uuid.matches("D343BFC1-5A21-4F05-BC7D-AF01F617B664"));
        assert!(uuid.matches("d343bfc1-5a21-4f05-bc7d-af01f617b664"));
        assert!(!uuid.matches("d343bfc2-5a21-4f05-bc7d-af01f617b664"));
        assert!(!uuid.matches("not-a-uuid"));
    }

    #[test]
    fn test_uuid_json_is_a_plain_string() {
        let uuid = CharacteristicUuid(uuid::Uuid::from_u128(0xd343bfc2_5a21_4f05_bc7d_af01f617b664));
        assert_eq!(
            serde_json::to_string(&uuid).unwrap(),
            r#""d343bfc2-5a21-4f05-bc7d-af01f617b664""#
        );
        assert!(serde_json::from_str::<CharacteristicUuid>(r#""not-a-uuid""#).is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Writing(1).to_string(), "writing entry 2");
        assert_eq!(Role::Key.to_string(), "KEY");
    }
}
