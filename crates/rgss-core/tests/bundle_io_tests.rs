use std::fs;

use pretty_assertions::assert_eq;
use rgss_bundle::{SectionIdAllocator, decode};
use rgss_core::{NamingScheme, SyncEngine, repack, repack_with, unpack};
use rgss_test_utils::{ContainerBuilder, TestProject};

const GAME_SYSTEM: &str = "class Game_System\n  def initialize; end\nend\n";
const MAIN: &str = "rgss_main { SceneManager.run }\n";

fn sample_container() -> Vec<u8> {
    ContainerBuilder::new()
        .script(11, "Game_System", GAME_SYSTEM)
        .script(22, "Main", MAIN)
        .build()
}

#[test]
fn test_unpack_writes_scripts_and_index() {
    let project = TestProject::new();

    let outcome = unpack(&sample_container(), &project.scripts_dir(), NamingScheme::Plain).unwrap();

    assert_eq!(outcome.written, vec!["Game_System.rb", "Main.rb"]);
    assert!(outcome.corrupt.is_empty());
    assert_eq!(project.read("Scripts/Game_System.rb"), GAME_SYSTEM);
    assert_eq!(project.read("Scripts/Main.rb"), MAIN);
    project.assert_index_lines(&["Game_System.rb", "Main.rb"]);

    let labels: Vec<&str> = outcome.tree.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["Game_System", "Main"]);
}

#[test]
fn test_unpack_is_idempotent() {
    let project = TestProject::new();
    let container = sample_container();

    unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();
    let first_index = project.read_index();
    let first_main = project.read("Scripts/Main.rb");

    unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    assert_eq!(project.read_index(), first_index);
    assert_eq!(project.read("Scripts/Main.rb"), first_main);
    // The second run backed up the first index
    assert_eq!(project.read("Scripts/info.txt.bak"), first_index);
}

#[test]
fn test_unpack_ordered_names() {
    let project = TestProject::new();

    unpack(&sample_container(), &project.scripts_dir(), NamingScheme::Ordered).unwrap();

    project.assert_index_lines(&["000-Game_System.rb", "001-Main.rb"]);
    SyncEngine::load(project.scripts_dir(), NamingScheme::Ordered).unwrap();
}

#[test]
fn test_untitled_records_become_placeholders() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Game_System", GAME_SYSTEM)
        .untitled(2, "")
        .script(3, "", "")
        .script(4, "Main", MAIN)
        .build();

    let outcome = unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    project.assert_index_lines(&["Game_System.rb", "Untitled_1.rb", "Untitled_2.rb", "Main.rb"]);
    project.assert_file_exists("Scripts/Untitled_1.rb");
    assert_eq!(outcome.tree.len(), 2, "placeholders are hidden from the tree");
}

#[test]
fn test_corrupt_record_is_kept_as_raw_payload_and_reported() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Game_System", GAME_SYSTEM)
        .corrupt(2, "Broken")
        .script(3, "Main", MAIN)
        .build();

    let outcome = unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    assert_eq!(outcome.corrupt.len(), 1);
    assert_eq!(outcome.corrupt[0].position, 1);
    assert_eq!(outcome.corrupt[0].section_id, 2);
    assert_eq!(outcome.corrupt[0].title, "Broken");
    assert_eq!(outcome.corrupt[0].file_name, "Broken.rb");
    assert_eq!(outcome.written, vec!["Game_System.rb", "Main.rb"]);
    project.assert_file_not_exists("Scripts/Broken.rb");
    project.assert_file_exists("Scripts/Broken.rb.raw");
    project.assert_index_lines(&["Game_System.rb", "Broken.rb", "Main.rb"]);
    let names: Vec<&str> = outcome.tree.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["Game_System", "Main"]);
}

#[test]
fn test_repack_writes_corrupt_payload_back_unchanged() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Game_System", GAME_SYSTEM)
        .corrupt(2, "Broken")
        .script(3, "Main", MAIN)
        .build();
    let outcome = unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    let records = decode(&repack(&outcome.index, NamingScheme::Plain).unwrap()).unwrap();

    let titles: Vec<String> = records.iter().map(|r| r.title_lossy()).collect();
    assert_eq!(titles, vec!["Game_System", "Broken", "Main"]);
    assert_eq!(records[1].payload, b"definitely not zlib".to_vec());
    assert_eq!(records[2].text().unwrap(), MAIN);
}

#[test]
fn test_recovered_corrupt_script_replaces_raw_payload() {
    let project = TestProject::new();
    let container = ContainerBuilder::new().corrupt(2, "Broken").build();
    let outcome = unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    // Text rewritten by hand wins over the stored payload
    project.write_script("Broken.rb", "fixed\n");
    let records = decode(&repack(&outcome.index, NamingScheme::Plain).unwrap()).unwrap();

    assert_eq!(records[0].text().unwrap(), "fixed\n");
}

#[test]
fn test_duplicate_titles_get_position_suffix() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Patch", "a = 1\n")
        .script(2, "Patch", "b = 2\n")
        .build();

    unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    project.assert_index_lines(&["Patch.rb", "Patch_1.rb"]);
    assert_eq!(project.read("Scripts/Patch_1.rb"), "b = 2\n");
}

#[test]
fn test_suffixed_title_never_overwrites_an_earlier_script() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Patch_2", "first\n")
        .script(2, "Patch", "second\n")
        .script(3, "Patch", "third\n")
        .build();

    let outcome = unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    project.assert_index_lines(&["Patch_2.rb", "Patch.rb", "Patch_2_2.rb"]);
    assert_eq!(project.read("Scripts/Patch_2.rb"), "first\n");
    assert_eq!(project.read("Scripts/Patch_2_2.rb"), "third\n");

    let records = decode(&repack(&outcome.index, NamingScheme::Plain).unwrap()).unwrap();
    let texts: Vec<String> = records.iter().map(|r| r.text().unwrap()).collect();
    assert_eq!(texts, vec!["first\n", "second\n", "third\n"]);
}

#[test]
fn test_titles_differing_only_in_case_get_distinct_files() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Window", "a\n")
        .script(2, "window", "b\n")
        .build();

    unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    project.assert_index_lines(&["Window.rb", "window_1.rb"]);
}

#[test]
fn test_legacy_layouts_unpack() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .legacy("Game_System", GAME_SYSTEM)
        .nested(5, "Scene_Map", "class Scene_Map; end\n")
        .script(7, "Main", MAIN)
        .build();

    unpack(&container, &project.scripts_dir(), NamingScheme::Plain).unwrap();

    project.assert_index_lines(&["Game_System.rb", "Scene_Map.rb", "Main.rb"]);
    assert_eq!(project.read("Scripts/Scene_Map.rb"), "class Scene_Map; end\n");
}

#[test]
fn test_repack_round_trip() {
    let project = TestProject::new();
    let outcome = unpack(&sample_container(), &project.scripts_dir(), NamingScheme::Plain).unwrap();

    let bytes = repack(&outcome.index, NamingScheme::Plain).unwrap();
    let records = decode(&bytes).unwrap();

    let titles: Vec<String> = records.iter().map(|r| r.title_lossy()).collect();
    assert_eq!(titles, vec!["Game_System", "Main"]);
    assert_eq!(records[0].text().unwrap(), GAME_SYSTEM);
    assert_eq!(records[1].text().unwrap(), MAIN);
    assert_ne!(records[0].section_id, records[1].section_id);
}

#[test]
fn test_repack_follows_edited_index() {
    let project = TestProject::new();
    let outcome = unpack(&sample_container(), &project.scripts_dir(), NamingScheme::Plain).unwrap();

    let mut engine = SyncEngine::load(project.scripts_dir(), NamingScheme::Plain).unwrap();
    engine.add_node(Some("Game_System"), "Game_Party").unwrap();
    engine.rename_node("Main", "Main_Loop").unwrap();

    let records = decode(&repack(&outcome.index, NamingScheme::Plain).unwrap()).unwrap();
    let titles: Vec<String> = records.iter().map(|r| r.title_lossy()).collect();
    assert_eq!(titles, vec!["Game_System", "Game_Party", "Main_Loop"]);
    assert_eq!(records[1].text().unwrap(), "");
}

#[test]
fn test_repack_strips_order_keys_and_placeholders() {
    let project = TestProject::new();
    let container = ContainerBuilder::new()
        .script(1, "Game_System", GAME_SYSTEM)
        .untitled(2, "")
        .script(3, "Main", MAIN)
        .build();
    let outcome = unpack(&container, &project.scripts_dir(), NamingScheme::Ordered).unwrap();
    project.assert_index_lines(&["000-Game_System.rb", "001-Untitled_1.rb", "002-Main.rb"]);

    let mut allocator = SectionIdAllocator::with_seed(9);
    let bytes = repack_with(&outcome.index, NamingScheme::Ordered, &mut allocator).unwrap();
    let records = decode(&bytes).unwrap();

    let titles: Vec<String> = records.iter().map(|r| r.title_lossy()).collect();
    assert_eq!(titles, vec!["Game_System", "", "Main"]);
}

#[test]
fn test_repack_without_index_uses_sorted_directory() {
    let project = TestProject::new();
    project.write_script("B_Second.rb", "2");
    project.write_script("A_First.rb", "1");
    project.write_script("readme.txt", "not a script");

    let index = rgss_index::IndexFile::new(project.scripts_dir());
    let records = decode(&repack(&index, NamingScheme::Plain).unwrap()).unwrap();

    let titles: Vec<String> = records.iter().map(|r| r.title_lossy()).collect();
    assert_eq!(titles, vec!["A_First", "B_Second"]);
}

#[test]
fn test_repack_skips_blank_lines() {
    let project = TestProject::new();
    project.write_script("A.rb", "a");
    project.write_script("B.rb", "b");
    fs::write(project.scripts_path().join("info.txt"), "A.rb\n\nB.rb\n").unwrap();

    let index = rgss_index::IndexFile::new(project.scripts_dir());
    let records = decode(&repack(&index, NamingScheme::Plain).unwrap()).unwrap();

    assert_eq!(records.len(), 2);
}

#[test]
fn test_repack_missing_script_fails() {
    let project = TestProject::new();
    project.write_index(&["Ghost.rb"]);

    let index = rgss_index::IndexFile::new(project.scripts_dir());
    assert!(repack(&index, NamingScheme::Plain).is_err());
}
