/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

#[test]
fn binary_shows_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_placemap"))
        .arg("--help")
        .output()
        .expect("Failed to execute placemap");

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("placemap"), "Help output should mention placemap");
    assert!(stdout.contains("--center"));
}

#[test]
fn bad_center_fails_gracefully() {
    let output = Command::new(env!("CARGO_BIN_EXE_placemap"))
        .args(["--center", "north"])
        .output()
        .expect("Failed to execute placemap");

    assert!(!output.status.success(), "Invalid center should return error status");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked at"), "Invalid center should not cause panic");
}
