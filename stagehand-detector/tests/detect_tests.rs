//! Watermark-boundary and asset-selection tests for `stagehand-detector`.
//!
//! Every test builds its own `TempDir` tree and pins mtimes with `filetime`.

use std::fs;
use std::path::Path;

use filetime::{set_file_mtime, FileTime};
use rstest::rstest;
use stagehand_core::{AssetId, Watermark};
use stagehand_detector::{detect, detect_assets, detect_scripts};
use tempfile::TempDir;

const MARK: i64 = 1_700_000_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_at(path: &Path, content: &str, mtime: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write fixture");
    set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).expect("set mtime");
}

fn bundle(root: &Path, dir: &str, descriptor: &str, mtime: i64) {
    write_at(&root.join(dir).join("config.txt"), descriptor, mtime);
}

fn names(root: &Path) -> Vec<String> {
    detect_assets(root, Watermark::from_secs(MARK))
        .expect("detect assets")
        .into_iter()
        .map(|a| a.name)
        .collect()
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

#[rstest]
#[case(MARK - 60, false)]
#[case(MARK, false)]
#[case(MARK + 1, true)]
fn script_selection_is_strictly_after_watermark(#[case] mtime: i64, #[case] selected: bool) {
    let tmp = TempDir::new().expect("tempdir");
    write_at(&tmp.path().join("trigger.gs"), "include \"x\"", mtime);

    let scripts = detect_scripts(tmp.path(), Watermark::from_secs(MARK)).expect("detect");
    assert_eq!(scripts.len(), usize::from(selected));
}

#[test]
fn scripts_are_absolute_sorted_and_flat() {
    let tmp = TempDir::new().expect("tempdir");
    write_at(&tmp.path().join("zeta.gs"), "z", MARK + 5);
    write_at(&tmp.path().join("alpha.gs"), "a", MARK + 5);
    write_at(&tmp.path().join("nested").join("deep.gs"), "d", MARK + 5);

    let scripts = detect_scripts(tmp.path(), Watermark::from_secs(MARK)).expect("detect");
    let files: Vec<_> = scripts
        .iter()
        .map(|s| s.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["alpha.gs", "zeta.gs"]);
    assert!(scripts.iter().all(|s| s.path.is_absolute()));
}

#[cfg(unix)]
#[test]
fn linked_units_keep_their_own_names() {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new().expect("tempdir");
    let shared = tmp.path().join("shared");
    write_at(&shared.join("real_impl.gs"), "impl", MARK + 5);
    bundle(&shared, "real_bundle", "kuid <kuid:1:1>\n", MARK + 5);

    let scripts_dir = tmp.path().join("scripts");
    let assets_dir = tmp.path().join("assets");
    fs::create_dir_all(&scripts_dir).expect("mkdir scripts");
    fs::create_dir_all(&assets_dir).expect("mkdir assets");
    write_at(&scripts_dir.join("zeta.gs"), "z", MARK + 5);
    symlink(shared.join("real_impl.gs"), scripts_dir.join("loco.gs")).expect("link script");
    symlink(shared.join("real_bundle"), assets_dir.join("loco")).expect("link bundle");

    let changes = detect(&scripts_dir, &assets_dir, Watermark::from_secs(MARK)).expect("detect");
    let files: Vec<_> = changes
        .scripts
        .iter()
        .map(|s| s.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["loco.gs", "zeta.gs"]);
    assert!(changes.scripts.iter().all(|s| s.path.is_absolute()));

    assert_eq!(changes.assets.len(), 1);
    let asset = &changes.assets[0];
    assert!(asset.path.is_absolute());
    assert_eq!(asset.path.file_name().unwrap(), "loco");
    assert_eq!(asset.name, "loco");
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[test]
fn bundle_qualifies_through_any_nested_file() {
    let tmp = TempDir::new().expect("tempdir");
    bundle(tmp.path(), "loco", "kuid <kuid:1:1>\nusername \"Loco\"\n", MARK - 100);
    write_at(
        &tmp.path().join("loco").join("textures").join("body.texture"),
        "px",
        MARK + 10,
    );
    bundle(tmp.path(), "stale", "kuid <kuid:2:2>\nusername \"Stale\"\n", MARK - 100);

    assert_eq!(names(tmp.path()), vec!["Loco"]);
}

#[test]
fn bundle_without_descriptor_is_skipped() {
    let tmp = TempDir::new().expect("tempdir");
    write_at(&tmp.path().join("orphan").join("mesh.im"), "m", MARK + 10);
    assert!(names(tmp.path()).is_empty());
}

#[test]
fn descriptor_without_identifier_excludes_asset() {
    let tmp = TempDir::new().expect("tempdir");
    bundle(tmp.path(), "broken", "username \"No Id\"\n", MARK + 10);
    bundle(tmp.path(), "fine", "kuid <kuid:9:9>\nusername \"Fine\"\n", MARK + 10);

    assert_eq!(names(tmp.path()), vec!["Fine"]);
}

#[test]
fn duplicate_identifier_keeps_first_bundle() {
    let tmp = TempDir::new().expect("tempdir");
    bundle(tmp.path(), "a_first", "kuid <kuid:5:5>\nusername \"First\"\n", MARK + 10);
    bundle(tmp.path(), "b_second", "kuid <kuid:5:5>\nusername \"Second\"\n", MARK + 10);

    let assets = detect_assets(tmp.path(), Watermark::from_secs(MARK)).expect("detect");
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].id, AssetId::from("kuid:5:5"));
    assert!(assets[0].path.ends_with("a_first"));
}

#[test]
fn assets_sorted_case_insensitively_by_name() {
    let tmp = TempDir::new().expect("tempdir");
    bundle(tmp.path(), "1", "kuid <kuid:1:1>\nusername \"gamma\"\n", MARK + 10);
    bundle(tmp.path(), "2", "kuid <kuid:1:2>\nusername \"Alpha\"\n", MARK + 10);
    bundle(tmp.path(), "3", "kuid <kuid:1:3>\nusername \"beta\"\n", MARK + 10);

    assert_eq!(names(tmp.path()), vec!["Alpha", "beta", "gamma"]);
}

#[test]
fn loose_files_in_assets_root_are_ignored() {
    let tmp = TempDir::new().expect("tempdir");
    write_at(&tmp.path().join("readme.txt"), "notes", MARK + 10);
    assert!(names(tmp.path()).is_empty());
}

// ---------------------------------------------------------------------------
// Combined
// ---------------------------------------------------------------------------

#[test]
fn detect_does_not_touch_the_filesystem() {
    let tmp = TempDir::new().expect("tempdir");
    let scripts = tmp.path().join("scripts");
    let assets = tmp.path().join("assets");
    write_at(&scripts.join("a.gs"), "a", MARK + 1);
    bundle(&assets, "loco", "kuid <kuid:1:1>\nusername \"Loco\"\n", MARK + 1);

    let changes = detect(&scripts, &assets, Watermark::from_secs(MARK)).expect("detect");
    assert_eq!(changes.scripts.len(), 1);
    assert_eq!(changes.assets.len(), 1);
    assert_eq!(changes.total_units(), 2);

    let mtime = fs::metadata(scripts.join("a.gs")).unwrap().modified().unwrap();
    assert_eq!(FileTime::from_system_time(mtime), FileTime::from_unix_time(MARK + 1, 0));
}
