//! Built-in IR code table
//!
//! Default button table for the G10 voice remote. Waveforms are the raw
//! blobs the remote expects on its VALUE characteristic; `00` leaves a
//! button without an IR function.

use crate::domain::models::IrCodeEntry;

const VOL_UP: &str = "0221017c0020123c000a0046000a001e000a001e000a001e000a001e000a001e000a001e000a0046000a001e000a0046000a001e000a001e000a001e000a0046000a001e000a06ff000a0046000a001e000a001e000a001e000a001e000a0046000a0046000a001e000a0046000a001e000a0046000a0046000a0046000a001e000a0046000a05f4";
const VOL_DOWN: &str = "0221017c0020123c000a0046000a001e000a001e000a001e000a001e000a0046000a001e000a0046000a001e000a0046000a001e000a001e000a001e000a0046000a001e000a06d7000a0046000a001e000a001e000a001e000a001e000a001e000a0046000a001e000a0046000a001e000a0046000a0046000a0046000a001e000a0046000a06d7";
const INPUT: &str = "0221017c0020123c000a0046000a001e000a001e000a001e000a001e000a001e000a0046000a0046000a001e000a0046000a001e000a001e000a001e000a0046000a001e000a06d7000a0046000a001e000a001e000a001e000a001e000a0046000a001e000a001e000a0046000a001e000a0046000a0046000a0046000a001e000a0046000a05f4";

/// (name, key code, waveform hex), in programming order
const DEFAULT_TABLE: &[(&str, [u8; 2], &str)] = &[
    ("VolUp", [0x00, 0x18], VOL_UP),
    ("VolDown", [0x00, 0x19], VOL_DOWN),
    ("Mute", [0x00, 0xa4], "00"),
    ("Power", [0x00, 0x1a], "00"),
    ("Input", [0x00, 0xb2], INPUT),
];

pub fn default_code_table() -> Vec<IrCodeEntry> {
    DEFAULT_TABLE
        .iter()
        .map(|(name, key, waveform)| {
            // Constant table, covered by test_default_table_decodes
            let value = hex::decode(waveform).expect("built-in IR waveform is valid hex");
            IrCodeEntry::new(name, key, &value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_decodes() {
        let table = default_code_table();
        assert_eq!(table.len(), 5);
        assert_eq!(table[0].name, "VolUp");
        assert_eq!(table[0].key, vec![0x00, 0x18]);
        assert_eq!(table[0].value.len(), VOL_UP.len() / 2);
        assert_eq!(&table[0].value[..4], &[0x02, 0x21, 0x01, 0x7c]);
        assert_eq!(table[2].value, vec![0x00]);
    }

    #[test]
    fn test_default_table_order() {
        let keys: Vec<u8> = default_code_table().iter().map(|e| e.key[1]).collect();
        assert_eq!(keys, vec![0x18, 0x19, 0xa4, 0x1a, 0xb2]);
    }
}
