use serial_test::serial;
use std::process::Command;

const BINARY: &str = env!("CARGO_BIN_EXE_arena-leaderboard");

/// Test that the application exits with error code when database connection fails
#[test]
#[serial]
fn test_application_exits_on_connection_failure() {
    let output = Command::new(BINARY)
        .env(
            "CONNECTION_STRING",
            "host=invalid_host port=5432 user=postgres password=wrong dbname=nonexistent connect_timeout=5"
        )
        .env("RUST_LOG", "error")
        .arg("--once")
        .output()
        .expect("Failed to execute arena-leaderboard");

    assert!(!output.status.success(), "Process should fail with invalid connection");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to connect to database"),
        "Should log connection error. Got: {}",
        stderr
    );
    assert!(
        stderr.contains("Application cannot start without a valid database connection"),
        "Should log clear message about needing database connection"
    );
}

/// Test that the application handles missing CONNECTION_STRING environment variable
#[test]
#[serial]
fn test_application_exits_on_missing_connection_string() {
    // Run from a directory without .env so nothing is picked up implicitly
    let temp_dir = std::env::temp_dir().join("arena_leaderboard_test");
    std::fs::create_dir_all(&temp_dir).ok();

    let output = Command::new(BINARY)
        .current_dir(&temp_dir)
        .env_clear()
        .env("RUST_LOG", "error")
        .env("PATH", std::env::var("PATH").unwrap_or_default())
        .output()
        .expect("Failed to execute arena-leaderboard");

    std::fs::remove_dir_all(&temp_dir).ok();

    assert!(
        !output.status.success(),
        "Process should fail without CONNECTION_STRING"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("CONNECTION_STRING environment variable must be set"),
        "Should report missing CONNECTION_STRING. Got: {}",
        stderr
    );
}
