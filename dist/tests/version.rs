use std::process::Command;

#[test]
fn version_subcommand_reports_configured_version() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("include")).unwrap();
    std::fs::write(dir.path().join("include/bootstrap.h"), "").unwrap();
    std::fs::write(dir.path().join("VERSION"), "v9.9.9\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_dist"))
        .env("DIST_ROOT", dir.path())
        .env("DIST_HOST_OS", "linux")
        .env("DIST_HOST_ARCH", "amd64")
        .arg("version")
        .output()
        .expect("failed to run dist binary");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "v9.9.9");
}
