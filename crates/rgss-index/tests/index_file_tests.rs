use pretty_assertions::assert_eq;
use rgss_fs::NormalizedPath;
use rgss_index::{Error, IndexEntry, IndexFile, OrderKey};
use std::fs;
use tempfile::TempDir;

fn index_with(content: &str) -> (TempDir, IndexFile) {
    let temp = TempDir::new().unwrap();
    let scripts = temp.path().join("Scripts");
    fs::create_dir_all(&scripts).unwrap();
    fs::write(scripts.join("info.txt"), content).unwrap();
    let index = IndexFile::new(NormalizedPath::new(&scripts));
    (temp, index)
}

fn raw(index: &IndexFile) -> String {
    fs::read_to_string(index.path().to_native()).unwrap()
}

#[test]
fn test_missing_index_is_reported() {
    let temp = TempDir::new().unwrap();
    let index = IndexFile::new(NormalizedPath::new(temp.path()));

    assert!(!index.is_valid());
    assert!(matches!(index.read(), Err(Error::IndexFileMissing { .. })));
}

#[test]
fn test_read_skips_placeholders_and_blanks() {
    let (_temp, index) = index_with("Game_System.rb\nUntitled_1.rb\n\n  Main.rb  \r\n");

    assert_eq!(index.read().unwrap(), vec!["Game_System.rb", "Main.rb"]);
    assert_eq!(
        index.read_all().unwrap(),
        vec!["Game_System.rb", "Untitled_1.rb", "", "Main.rb"]
    );
}

#[test]
fn test_entries_are_typed_and_resolved() {
    let (_temp, index) = index_with("003.5-Scene_Map.rb\nUntitled_1.rb\n\nMain.rb\n");
    let entries = index.entries().unwrap();

    match &entries[0] {
        IndexEntry::Script {
            line,
            label,
            key,
            path,
            ..
        } => {
            assert_eq!(*line, 1);
            assert_eq!(label, "Scene_Map");
            assert_eq!(key.as_ref(), OrderKey::parse("003.5").as_ref());
            assert!(path.as_str().ends_with("Scripts/003.5-Scene_Map.rb"));
        }
        other => panic!("unexpected entry: {other:?}"),
    }
    assert!(matches!(entries[1], IndexEntry::Placeholder { n: 1, .. }));
    assert!(matches!(entries[2], IndexEntry::Blank { line: 3 }));
    match &entries[3] {
        IndexEntry::Script { key, label, .. } => {
            assert!(key.is_none());
            assert_eq!(label, "Main");
        }
        other => panic!("unexpected entry: {other:?}"),
    }
}

#[test]
fn test_write_replaces_content_and_keeps_backup() {
    let (_temp, index) = index_with("Old.rb\n");

    index.write(&["Game_System.rb", "Main.rb"]).unwrap();

    assert_eq!(raw(&index), "Game_System.rb\nMain.rb\n");
    let backup = fs::read_to_string(index.backup_path().to_native()).unwrap();
    assert_eq!(backup, "Old.rb\n");
}

#[test]
fn test_write_without_existing_index_creates_it() {
    let temp = TempDir::new().unwrap();
    let index = IndexFile::new(NormalizedPath::new(temp.path().join("Scripts")));

    index.write(&["Main.rb"]).unwrap();

    assert!(index.is_valid());
    assert!(!index.backup_path().exists());
}

#[test]
fn test_patch_line_changes_only_the_target() {
    let (_temp, index) = index_with("A.rb\r\nB.rb\r\nC.rb");

    assert!(index.patch_line(|line| line == "B.rb", "Renamed.rb").unwrap());

    assert_eq!(raw(&index), "A.rb\r\nRenamed.rb\r\nC.rb");
}

#[test]
fn test_patch_line_without_match_writes_nothing() {
    let (_temp, index) = index_with("A.rb\n");

    assert!(!index.patch_line(|line| line == "Z.rb", "Y.rb").unwrap());
    assert!(!index.backup_path().exists());
}

#[test]
fn test_insert_after_adds_one_line() {
    let (_temp, index) = index_with("003-A.rb\n004-B.rb\n");

    assert!(index.insert_after(|line| line == "003-A.rb", "003.5-New.rb").unwrap());

    assert_eq!(raw(&index), "003-A.rb\n003.5-New.rb\n004-B.rb\n");
}

#[test]
fn test_insert_after_last_line_without_newline() {
    let (_temp, index) = index_with("A.rb");

    index.insert_after(|line| line == "A.rb", "B.rb").unwrap();

    assert_eq!(raw(&index), "A.rb\nB.rb\n");
}

#[test]
fn test_append_and_remove_line() {
    let (_temp, index) = index_with("A.rb\nB.rb\n");

    index.append("C.rb").unwrap();
    assert!(index.remove_line(|line| line == "A.rb").unwrap());

    assert_eq!(raw(&index), "B.rb\nC.rb\n");
}

#[test]
fn test_restore_backup_undoes_last_edit() {
    let (_temp, index) = index_with("A.rb\nB.rb\n");

    index.remove_line(|line| line == "A.rb").unwrap();
    index.restore_backup().unwrap();

    assert_eq!(raw(&index), "A.rb\nB.rb\n");
}

#[test]
fn test_restore_without_backup_fails() {
    let (_temp, index) = index_with("A.rb\n");
    assert!(matches!(
        index.restore_backup(),
        Err(Error::BackupMissing { .. })
    ));
}

#[test]
fn test_check_format_accepts_ordered_index() {
    let (_temp, index) = index_with("000-Header.rb\n001.25-Main.rb\nUntitled_2.rb\n\n");
    index.check_format().unwrap();
}

#[test]
fn test_check_format_rejects_unmigrated_lines() {
    let (_temp, index) = index_with("000-Header.rb\nMain.rb\n");

    match index.check_format() {
        Err(Error::IndexFileUnrecognizedFormat { line, content, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(content, "Main.rb");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_script_with_only_raw_sidecar_is_preserved() {
    let (_temp, index) = index_with("Broken.rb\nMain.rb\n");
    fs::write(index.raw_payload_path("Broken.rb").to_native(), b"\x78\x00").unwrap();
    fs::write(index.resolve("Main.rb").to_native(), "").unwrap();

    assert_eq!(index.raw_payload_path("Broken.rb").file_name(), Some("Broken.rb.raw"));
    assert!(index.is_preserved("Broken.rb"));
    assert!(!index.is_preserved("Main.rb"));

    // Extracted text takes over from the sidecar
    fs::write(index.resolve("Broken.rb").to_native(), "fixed").unwrap();
    assert!(!index.is_preserved("Broken.rb"));
}
