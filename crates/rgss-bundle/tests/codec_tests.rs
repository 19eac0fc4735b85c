use pretty_assertions::assert_eq;
use rgss_bundle::marshal::Writer;
use rgss_bundle::{Error, ScriptRecord, SectionIdAllocator, compression, decode, decode_with, encode};

fn record(id: i32, title: &str, text: &str) -> ScriptRecord {
    ScriptRecord::from_text(id, title, text.as_bytes()).unwrap()
}

#[test]
fn test_roundtrip_preserves_records_and_order() {
    let records = vec![
        record(11, "Game_System", "class Game_System\nend\n"),
        record(22, "Main", "rgss_main { SceneManager.run }\n"),
        record(1_999_999_999, "", ""),
    ];

    let bytes = encode(&records).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded, records);
    assert_eq!(decoded[0].text().unwrap(), "class Game_System\nend\n");
    assert_eq!(decoded[2].display_title(2), "Untitled_2");
}

#[test]
fn test_encode_starts_with_marshal_header_and_array() {
    let bytes = encode(&[record(1, "A", "")]).unwrap();
    assert_eq!(&bytes[..4], &[0x04, 0x08, b'[', 0x06]);
}

#[test]
fn test_encode_rejects_duplicate_ids() {
    let err = encode(&[record(7, "A", ""), record(7, "B", "")]).unwrap_err();
    assert!(matches!(err, Error::DuplicateSectionId { section_id: 7 }));
}

#[test]
fn test_empty_container_roundtrips() {
    let bytes = encode(&[]).unwrap();
    assert!(decode(&bytes).unwrap().is_empty());
}

#[test]
fn test_legacy_and_nested_records_get_fresh_ids() {
    let payload = compression::deflate(b"p 1").unwrap();

    let mut writer = Writer::new();
    writer.write_array_header(3);
    // tagged
    writer.write_array_header(3);
    writer.write_integer(5);
    writer.write_utf8(b"Tagged");
    writer.write_bytes(&payload);
    // legacy
    writer.write_array_header(2);
    writer.write_utf8(b"Legacy");
    writer.write_bytes(&payload);
    // nested
    writer.write_array_header(1);
    writer.write_array_header(3);
    writer.write_integer(5);
    writer.write_utf8(b"Nested");
    writer.write_bytes(&payload);
    let bytes = writer.into_bytes();

    let mut allocator = SectionIdAllocator::with_seed(7);
    let records = decode_with(&bytes, &mut allocator).unwrap();

    let titles: Vec<_> = records.iter().map(|r| r.title_lossy()).collect();
    assert_eq!(titles, vec!["Tagged", "Legacy", "Nested"]);
    assert_eq!(records[0].section_id, 5);
    assert_ne!(records[1].section_id, 5);
    assert_ne!(records[2].section_id, 5);
    assert_ne!(records[1].section_id, records[2].section_id);
    assert!(records.iter().all(|r| r.text().unwrap() == "p 1"));
}

#[test]
fn test_nil_title_decodes_as_empty() {
    let mut writer = Writer::new();
    writer.write_array_header(1);
    writer.write_array_header(3);
    writer.write_integer(3);
    let mut bytes = writer.into_bytes();
    bytes.push(b'0');
    bytes.extend_from_slice(&[b'"', 0x00]);

    let records = decode(&bytes).unwrap();
    assert!(records[0].title.is_empty());
}

#[test]
fn test_bad_header_is_corrupt_container() {
    let err = decode(&[0x04, 0x07, b'[', 0x00]).unwrap_err();
    assert!(matches!(err, Error::CorruptContainer { .. }));
}

#[test]
fn test_truncated_container_is_corrupt() {
    let bytes = encode(&[record(1, "Main", "p 1")]).unwrap();
    let err = decode(&bytes[..bytes.len() - 3]).unwrap_err();
    assert!(matches!(err, Error::CorruptContainer { .. }));
}

#[test]
fn test_top_level_must_be_array() {
    let err = decode(&[0x04, 0x08, b'i', 0x06]).unwrap_err();
    assert!(matches!(err, Error::CorruptContainer { offset: 2, .. }));
}

#[test]
fn test_record_with_wrong_arity_names_offset() {
    let mut writer = Writer::new();
    writer.write_array_header(1);
    writer.write_array_header(4);
    for id in 0..4 {
        writer.write_integer(id);
    }
    let bytes = writer.into_bytes();

    match decode(&bytes).unwrap_err() {
        Error::CorruptContainer { offset, message } => {
            assert_eq!(offset, 4);
            assert!(message.contains("4 fields"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_corrupt_payload_only_affects_its_record() {
    let good = record(1, "Good", "p 1");
    let bad = ScriptRecord::new(2, "Bad", b"definitely not zlib".to_vec());
    let bytes = encode(&[good, bad]).unwrap();

    let records = decode(&bytes).unwrap();
    assert_eq!(records[0].text().unwrap(), "p 1");
    assert!(matches!(
        records[1].text(),
        Err(Error::CorruptRecord { section_id: 2, .. })
    ));
}

#[test]
fn test_large_ids_use_bignum_and_roundtrip() {
    let records = vec![record(i32::MAX - 1, "Big", "")];
    let bytes = encode(&records).unwrap();

    // '[' len, '[' len, then the id tag
    assert_eq!(bytes[6], b'l');
    assert_eq!(decode(&bytes).unwrap(), records);
}
