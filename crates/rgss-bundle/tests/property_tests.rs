use proptest::collection::{hash_set, vec};
use proptest::prelude::*;
use rgss_bundle::{ScriptRecord, decode, encode};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_decode_inverts_encode(
        ids in hash_set(0..i32::MAX, 0..8),
        titles in vec("[A-Za-z_ ]{0,12}", 8),
        payloads in vec(vec(any::<u8>(), 0..64), 8),
    ) {
        let records: Vec<ScriptRecord> = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| ScriptRecord::new(id, titles[i].clone(), payloads[i].clone()))
            .collect();

        let bytes = encode(&records).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), records);
    }

    #[test]
    fn test_decode_never_panics(bytes in vec(any::<u8>(), 0..256)) {
        let _ = decode(&bytes);
    }
}
