use std::path::PathBuf;

use distcore::platform::{Overrides, PlatformContext};
use distcore::select;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn ctx(target_os: &str) -> PlatformContext {
    let root = fixtures_root();
    PlatformContext::resolve(Overrides {
        root: Some(root),
        host_os: Some("linux".into()),
        host_arch: Some("amd64".into()),
        target_os: Some(target_os.into()),
        target_arch: Some("amd64".into()),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn linux_target_picks_up_multi_os_tagged_file_and_drops_windows_only() {
    let ctx = ctx("linux");
    let selection = select::select(&ctx, "pkg/sample").unwrap();
    assert!(selection.files.iter().any(|f| f == "foo.c"));
    assert!(!selection.files.iter().any(|f| f == "windows.c"));
}

#[test]
fn windows_target_picks_up_the_name_sniffed_file_and_drops_tagged_one() {
    let ctx = ctx("windows");
    let selection = select::select(&ctx, "pkg/sample").unwrap();
    assert!(!selection.files.iter().any(|f| f == "foo.c"));
    assert!(selection.files.iter().any(|f| f == "windows.c"));
}
