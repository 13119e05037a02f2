use indexmap::IndexMap;
use kistamp::error::Error;
use kistamp::resolver::{Overrides, ResolverConfig};
use kistamp::walker::{process_tree, TreeJob};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BOARD_LINE: &str = "(gr_text ${PROJECT_NAME} (at 0 0))\n";

fn full_overrides() -> Overrides {
    Overrides {
        repo_url: Some("https://example.com/team/proj".to_string()),
        name: Some("proj".to_string()),
        version: Some("v1.0.0".to_string()),
        version_date: Some("2026-01-01".to_string()),
        build_date: Some("2026-01-02".to_string()),
        source_file_path: None,
    }
}

fn tree_job(src_root: &Path, dst_root: Option<PathBuf>) -> TreeJob {
    TreeJob {
        src_root: src_root.to_path_buf(),
        pattern: "*.kicad_pcb".to_string(),
        dst_root,
        extra_vars: IndexMap::new(),
        resolver: ResolverConfig::default(),
        overrides: full_overrides(),
        kicad_pcb: false,
        dry: false,
        verbose: false,
    }
}

#[test]
fn test_in_place_run_rewrites_matching_files_only() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.kicad_pcb"), BOARD_LINE).unwrap();
    fs::write(dir.path().join("note.txt"), "name: ${PROJECT_NAME}\n").unwrap();

    // Destination root equal to the source root selects in-place mode.
    let job = tree_job(dir.path(), Some(dir.path().to_path_buf()));
    process_tree(&job).unwrap();

    let board = fs::read_to_string(dir.path().join("a.kicad_pcb")).unwrap();
    assert_eq!(board, "(gr_text proj (at 0 0))\n");
    let note = fs::read_to_string(dir.path().join("note.txt")).unwrap();
    assert_eq!(note, "name: ${PROJECT_NAME}\n");

    // No temporary files may survive the run.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_mirrored_run_mirrors_the_relative_layout() {
    let dir = TempDir::new().unwrap();
    let src_root = dir.path().join("src");
    let dst_root = dir.path().join("gen");
    fs::create_dir_all(src_root.join("sub")).unwrap();
    fs::write(src_root.join("a.kicad_pcb"), BOARD_LINE).unwrap();
    fs::write(src_root.join("sub/b.kicad_pcb"), BOARD_LINE).unwrap();

    let job = tree_job(&src_root, Some(dst_root.clone()));
    process_tree(&job).unwrap();

    let a = fs::read_to_string(dst_root.join("a.kicad_pcb")).unwrap();
    assert_eq!(a, "(gr_text proj (at 0 0))\n");
    let b = fs::read_to_string(dst_root.join("sub/b.kicad_pcb")).unwrap();
    assert_eq!(b, "(gr_text proj (at 0 0))\n");

    // Sources are left untouched in mirrored mode.
    let src = fs::read_to_string(src_root.join("a.kicad_pcb")).unwrap();
    assert_eq!(src, BOARD_LINE);
}

#[test]
fn test_destination_inside_source_is_excluded() {
    let dir = TempDir::new().unwrap();
    let dst_root = dir.path().join("gen");
    fs::write(dir.path().join("a.kicad_pcb"), BOARD_LINE).unwrap();

    let job = tree_job(dir.path(), Some(dst_root.clone()));
    process_tree(&job).unwrap();
    assert!(dst_root.join("a.kicad_pcb").exists());

    // A second run must not descend into its own previous output.
    process_tree(&job).unwrap();
    assert!(!dst_root.join("gen").exists());
}

#[test]
fn test_dry_run_mutates_nothing() {
    let dir = TempDir::new().unwrap();
    let src_root = dir.path().join("src");
    let dst_root = dir.path().join("gen");
    fs::create_dir_all(&src_root).unwrap();
    fs::write(src_root.join("a.kicad_pcb"), BOARD_LINE).unwrap();

    let mut job = tree_job(&src_root, Some(dst_root.clone()));
    job.dry = true;
    process_tree(&job).unwrap();
    assert!(!dst_root.exists());

    // In-place dry run: the source stays bit-identical.
    let mut job = tree_job(&src_root, Some(src_root.clone()));
    job.dry = true;
    process_tree(&job).unwrap();
    let src = fs::read_to_string(src_root.join("a.kicad_pcb")).unwrap();
    assert_eq!(src, BOARD_LINE);
}

#[test]
fn test_failed_in_place_write_leaves_the_original() {
    let dir = TempDir::new().unwrap();
    // Invalid UTF-8 makes the line reader fail mid-file.
    let original: &[u8] = b"(gr_text \xff${PROJECT_NAME} (at 0 0))\n";
    fs::write(dir.path().join("bad.kicad_pcb"), original).unwrap();

    let job = tree_job(dir.path(), Some(dir.path().to_path_buf()));
    let err = process_tree(&job).unwrap_err();
    assert!(matches!(err, Error::IoError(_)));

    let content = fs::read(dir.path().join("bad.kicad_pcb")).unwrap();
    assert_eq!(content, original);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_plain_name_glob_matches_in_subdirectories() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("b.kicad_pcb"), BOARD_LINE).unwrap();
    fs::write(dir.path().join("sub/b.kicad_pcb"), BOARD_LINE).unwrap();

    let mut job = tree_job(dir.path(), Some(dir.path().to_path_buf()));
    job.pattern = "b.kicad_pcb".to_string();
    process_tree(&job).unwrap();

    let top = fs::read_to_string(dir.path().join("b.kicad_pcb")).unwrap();
    assert_eq!(top, "(gr_text proj (at 0 0))\n");
    let nested = fs::read_to_string(dir.path().join("sub/b.kicad_pcb")).unwrap();
    assert_eq!(nested, "(gr_text proj (at 0 0))\n");
}

#[test]
fn test_directory_glob_matches_at_any_depth() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("hw/boards")).unwrap();
    fs::write(dir.path().join("hw/boards/a.kicad_pcb"), BOARD_LINE).unwrap();

    let mut job = tree_job(dir.path(), Some(dir.path().to_path_buf()));
    job.pattern = "boards/*.kicad_pcb".to_string();
    process_tree(&job).unwrap();

    let content = fs::read_to_string(dir.path().join("hw/boards/a.kicad_pcb")).unwrap();
    assert_eq!(content, "(gr_text proj (at 0 0))\n");
}

#[test]
fn test_source_file_path_is_per_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.kicad_pcb"),
        "(gr_text ${SOURCE_FILE_PATH} (at 0 0))\n",
    )
    .unwrap();

    let job = tree_job(dir.path(), Some(dir.path().to_path_buf()));
    process_tree(&job).unwrap();

    let content = fs::read_to_string(dir.path().join("a.kicad_pcb")).unwrap();
    assert!(content.contains("a.kicad_pcb"), "got: {}", content);
    assert!(!content.contains("${SOURCE_FILE_PATH}"));
}

#[test]
fn test_invalid_glob_pattern_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut job = tree_job(dir.path(), None);
    job.pattern = "[".to_string();
    let err = process_tree(&job).unwrap_err();
    assert!(matches!(err, Error::GlobError { .. }));
}
