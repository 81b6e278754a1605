//! Startup failures of the server binary.

use std::process::Command;

#[test]
fn test_invalid_port_exits_with_message() {
    let output = Command::new(env!("CARGO_BIN_EXE_cross-stitch-tracker"))
        .env("PORT", "not-a-port")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"), "{}", stderr);
    assert!(stderr.contains("PORT"), "{}", stderr);
}
