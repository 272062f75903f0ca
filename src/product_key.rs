//! Product key decoding and formatting.
//!
//! Windows and Office store their product keys as a binary `DigitalProductId`
//! registry value. The first 15 bytes hold a little-endian integer that, written
//! out in base 24 over the alphabet `BCDFGHJKMPQRTVWXY2346789`, gives the
//! 25-character key.
//!
//! # Example
//!
//! ```rust
//! use keyscope::product_key::{decode_windows_key, is_well_formed_key};
//!
//! let digital_product_id = [0u8; 15];
//! let key = decode_windows_key(&digital_product_id);
//! assert_eq!(key, "BBBBB-BBBBB-BBBBB-BBBBB-BBBBB");
//! assert!(is_well_formed_key(&key));
//! ```

use crate::errors::{InventoryError, InventoryResult};

/// Alphabet used by product keys. Index = base-24 digit.
pub const KEY_ALPHABET: &[u8; 24] = b"BCDFGHJKMPQRTVWXY2346789";

/// Number of bytes of the digital product id that encode the key.
pub const KEY_BUFFER_LEN: usize = 15;

/// Number of characters in a product key, without dashes.
pub const KEY_LENGTH: usize = 25;

/// Characters per dash-separated group.
const GROUP_LENGTH: usize = 5;

/// Offsets at which Office keys get a dash inserted.
const OFFICE_DASH_OFFSETS: [usize; 4] = [5, 11, 17, 23];

/// Returned in place of a key when decoding fails.
pub const DECODING_ERROR: &str = "Key decoding error";

/// Decode `key_length` base-24 characters from the first 15 bytes of `buffer`.
///
/// The digits come out least significant first and are stored from the end of
/// the output backwards, so the result reads most significant first.
///
/// `buffer` itself is never modified: the division runs on a local copy.
///
/// # Errors
///
/// Returns [`InventoryError::KeyBufferTooShort`] if `buffer` holds fewer than
/// 15 bytes.
pub fn decode_product_key(buffer: &[u8], key_length: usize) -> InventoryResult<String> {
    if buffer.len() < KEY_BUFFER_LEN {
        return Err(InventoryError::KeyBufferTooShort { len: buffer.len() });
    }

    let mut digits = [0u8; KEY_BUFFER_LEN];
    digits.copy_from_slice(&buffer[..KEY_BUFFER_LEN]);

    let mut key = vec![0u8; key_length];
    for slot in key.iter_mut().rev() {
        let mut current: u32 = 0;
        for byte in digits.iter_mut().rev() {
            current = (current << 8) | u32::from(*byte);
            *byte = (current / 24) as u8;
            current %= 24;
        }
        *slot = KEY_ALPHABET[current as usize];
    }

    // Every byte comes from KEY_ALPHABET, which is ASCII.
    Ok(key.into_iter().map(char::from).collect())
}

/// Split a raw key into five-character groups joined by dashes.
pub fn format_windows_key(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    chars
        .chunks(GROUP_LENGTH)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// Insert dashes into a raw key at offsets 5, 11, 17 and 23.
///
/// Each offset counts the dashes already inserted, so a 25-character key comes
/// out in the same `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX` shape as
/// [`format_windows_key`]. Offsets past the end of a shorter input are skipped.
pub fn format_office_key(raw: &str) -> String {
    let mut formatted: Vec<char> = raw.chars().collect();
    for offset in OFFICE_DASH_OFFSETS {
        if offset > formatted.len() {
            break;
        }
        formatted.insert(offset, '-');
    }
    formatted.into_iter().collect()
}

/// Decode and format a Windows `DigitalProductId`.
///
/// Falls back to [`DECODING_ERROR`] when the buffer cannot be decoded.
pub fn decode_windows_key(digital_product_id: &[u8]) -> String {
    match decode_product_key(digital_product_id, KEY_LENGTH) {
        Ok(raw) => format_windows_key(&raw),
        Err(e) => {
            log::warn!("Failed to decode Windows product key: {e}");
            DECODING_ERROR.to_string()
        }
    }
}

/// Decode and format an Office `DigitalProductId`.
///
/// Falls back to [`DECODING_ERROR`] when the buffer cannot be decoded.
pub fn decode_office_key(digital_product_id: &[u8]) -> String {
    match decode_product_key(digital_product_id, KEY_LENGTH) {
        Ok(raw) => format_office_key(&raw),
        Err(e) => {
            log::warn!("Failed to decode Office product key: {e}");
            DECODING_ERROR.to_string()
        }
    }
}

/// Check that `key` looks like `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX` with every
/// character drawn from [`KEY_ALPHABET`].
pub fn is_well_formed_key(key: &str) -> bool {
    let groups: Vec<&str> = key.split('-').collect();
    if groups.len() != KEY_LENGTH / GROUP_LENGTH {
        return false;
    }

    groups.iter().all(|group| {
        group.len() == GROUP_LENGTH && group.bytes().all(|b| KEY_ALPHABET.contains(&b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [u8; 15] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    #[test]
    fn zero_buffer_decodes_to_first_symbol() {
        let key = decode_product_key(&[0u8; 15], KEY_LENGTH).unwrap();
        assert_eq!(key, "B".repeat(KEY_LENGTH));
    }

    #[test]
    fn least_significant_byte_ends_up_last() {
        let mut buffer = [0u8; 15];
        buffer[0] = 1;
        assert_eq!(
            decode_windows_key(&buffer),
            "BBBBB-BBBBB-BBBBB-BBBBB-BBBBC"
        );

        // 25 = 1 * 24 + 1
        buffer[0] = 25;
        assert_eq!(
            decode_windows_key(&buffer),
            "BBBBB-BBBBB-BBBBB-BBBBB-BBBCC"
        );
    }

    #[test]
    fn decodes_known_buffer() {
        assert_eq!(decode_windows_key(&SAMPLE), "QWXBG-9RBY2-MCG7P-KT6GW-XP4VP");
        assert_eq!(
            decode_windows_key(&[0xFF; 15]),
            "TW7HQ-JY9P9-CFDMG-RH9H7-9BKDX"
        );
    }

    #[test]
    fn only_first_fifteen_bytes_matter() {
        let mut longer = SAMPLE.to_vec();
        longer.extend_from_slice(&[0xAB; 40]);
        assert_eq!(
            decode_product_key(&longer, KEY_LENGTH).unwrap(),
            decode_product_key(&SAMPLE, KEY_LENGTH).unwrap()
        );
    }

    #[test]
    fn decoding_leaves_input_untouched() {
        let buffer = SAMPLE;
        let first = decode_product_key(&buffer, KEY_LENGTH).unwrap();
        let second = decode_product_key(&buffer, KEY_LENGTH).unwrap();
        assert_eq!(first, second);
        assert_eq!(buffer, SAMPLE);
    }

    #[test]
    fn respects_requested_length() {
        let key = decode_product_key(&SAMPLE, 10).unwrap();
        assert_eq!(key.len(), 10);
        assert!(decode_product_key(&SAMPLE, 0).unwrap().is_empty());
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = decode_product_key(&[0u8; 14], KEY_LENGTH).unwrap_err();
        assert!(matches!(err, InventoryError::KeyBufferTooShort { len: 14 }));
        assert!(decode_product_key(&[], KEY_LENGTH).is_err());
    }

    #[test]
    fn short_buffer_formats_as_decoding_error() {
        assert_eq!(decode_windows_key(&[1, 2, 3]), DECODING_ERROR);
        assert_eq!(decode_office_key(&[1, 2, 3]), DECODING_ERROR);
    }

    #[test]
    fn both_formats_agree() {
        let raw = decode_product_key(&SAMPLE, KEY_LENGTH).unwrap();
        let windows = format_windows_key(&raw);
        let office = format_office_key(&raw);

        assert_eq!(windows, office);
        assert_eq!(windows.len(), 29);
        for pos in OFFICE_DASH_OFFSETS {
            assert_eq!(windows.as_bytes()[pos], b'-', "no dash at {pos}");
        }
    }

    #[test]
    fn office_format_tolerates_short_input() {
        assert_eq!(format_office_key("ABC"), "ABC");
        assert_eq!(format_office_key("ABCDEFG"), "ABCDE-FG");
    }

    #[test]
    fn well_formed_key_check() {
        assert!(is_well_formed_key("QWXBG-9RBY2-MCG7P-KT6GW-XP4VP"));
        assert!(!is_well_formed_key("QWXBG-9RBY2-MCG7P-KT6GW"));
        assert!(!is_well_formed_key("QWXBG-9RBY2-MCG7P-KT6GW-XP4V"));
        // 'A' and '5' are not part of the alphabet
        assert!(!is_well_formed_key("AWXBG-9RBY2-MCG7P-KT6GW-XP4VP"));
        assert!(!is_well_formed_key("QWXBG-9RBY5-MCG7P-KT6GW-XP4VP"));
        assert!(!is_well_formed_key(""));
    }
}
