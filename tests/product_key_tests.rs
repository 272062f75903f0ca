use keyscope::product_key::{
    decode_office_key, decode_product_key, decode_windows_key, format_office_key,
    format_windows_key, is_well_formed_key, KEY_ALPHABET, KEY_LENGTH,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded so failures are reproducible.
fn sample_buffers(count: usize) -> Vec<[u8; 15]> {
    let mut rng = StdRng::seed_from_u64(0x2545_F491_4F6C_DD1D);
    (0..count)
        .map(|_| {
            let mut buffer = [0u8; 15];
            rng.fill(&mut buffer);
            buffer
        })
        .collect()
}

#[test]
fn decoded_keys_use_only_the_alphabet() {
    for buffer in sample_buffers(200) {
        let key = decode_product_key(&buffer, KEY_LENGTH).unwrap();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(
            key.bytes().all(|b| KEY_ALPHABET.contains(&b)),
            "unexpected character in {key}"
        );
    }
}

#[test]
fn decoding_is_deterministic() {
    for buffer in sample_buffers(50) {
        let copy = buffer;
        assert_eq!(
            decode_product_key(&buffer, KEY_LENGTH).unwrap(),
            decode_product_key(&copy, KEY_LENGTH).unwrap()
        );
    }
}

#[test]
fn windows_and_office_display_forms_match() {
    for buffer in sample_buffers(50) {
        let windows = decode_windows_key(&buffer);
        let office = decode_office_key(&buffer);

        assert_eq!(windows, office);
        assert_eq!(windows.len(), 29);
        assert!(is_well_formed_key(&windows), "malformed {windows}");
        for (i, c) in windows.char_indices() {
            assert_eq!(c == '-', [5, 11, 17, 23].contains(&i), "at {i} in {windows}");
        }
    }
}

#[test]
fn formatting_from_raw_string() {
    let raw = "BCDFGHJKMPQRTVWXY23467896";
    assert_eq!(format_windows_key(raw), "BCDFG-HJKMP-QRTVW-XY234-67896");
    assert_eq!(format_office_key(raw), "BCDFG-HJKMP-QRTVW-XY234-67896");
}

#[test]
fn buffers_under_fifteen_bytes_are_rejected() {
    for len in 0..15 {
        let buffer = vec![0xAAu8; len];
        assert!(
            decode_product_key(&buffer, KEY_LENGTH).is_err(),
            "{len}-byte buffer was accepted"
        );
    }
}
