//! CLI-level tests that drive the compiled `pidx` binary.
//!
//! These never reach the network: they check argument parsing and that
//! missing configuration fails fast, before any request is made.

use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn pidx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pidx");
    path
}

/// Run `pidx` in an empty temp dir with a scrubbed environment, so no
/// ambient `.env` or exported variables leak into the test.
fn run_pidx(args: &[&str], env: &[(&str, &str)]) -> (String, String, bool) {
    let tmp = TempDir::new().unwrap();
    let mut command = Command::new(pidx_binary());
    command
        .current_dir(tmp.path())
        .args(args)
        .env_remove("PINECONE_API_KEY")
        .env_remove("PINECONE_ENVIRONMENT")
        .env_remove("PINECONE_INDEX")
        .env_remove("PINECONE_NAMESPACE")
        .env_remove("SQUAD_URL");
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pidx binary: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn help_lists_commands() {
    let (stdout, _, success) = run_pidx(&["--help"], &[]);
    assert!(success);
    assert!(stdout.contains("index"));
    assert!(stdout.contains("query"));
    assert!(stdout.contains("status"));
}

#[test]
fn missing_api_key_fails_fast() {
    let (_, stderr, success) = run_pidx(
        &["status"],
        &[
            ("PINECONE_ENVIRONMENT", "us-east1-gcp"),
            ("PINECONE_INDEX", "squad"),
        ],
    );
    assert!(!success);
    assert!(
        stderr.contains("PINECONE_API_KEY"),
        "stderr should name the missing variable: {}",
        stderr
    );
}

#[test]
fn missing_index_fails_fast() {
    let (_, stderr, success) = run_pidx(
        &["status"],
        &[
            ("PINECONE_API_KEY", "test-key"),
            ("PINECONE_ENVIRONMENT", "us-east1-gcp"),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("PINECONE_INDEX"), "{}", stderr);
}

#[test]
fn unknown_progress_mode_is_rejected() {
    let (_, stderr, success) = run_pidx(
        &["index", "--progress", "fancy"],
        &[
            ("PINECONE_API_KEY", "test-key"),
            ("PINECONE_ENVIRONMENT", "us-east1-gcp"),
            ("PINECONE_INDEX", "squad"),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("progress mode"), "{}", stderr);
}

#[test]
fn zero_chunk_size_flag_errors_without_panicking() {
    let env = [
        ("PINECONE_API_KEY", "test-key"),
        ("PINECONE_ENVIRONMENT", "us-east1-gcp"),
        ("PINECONE_INDEX", "squad"),
    ];
    let (_, stderr, success) = run_pidx(&["index", "--chunk-size", "0"], &env);
    assert!(!success);
    assert!(stderr.contains("--chunk-size"), "{}", stderr);
    assert!(!stderr.contains("panicked"), "{}", stderr);

    let (_, stderr, success) = run_pidx(&["index", "--batch-size", "0"], &env);
    assert!(!success);
    assert!(stderr.contains("--batch-size"), "{}", stderr);
    assert!(!stderr.contains("panicked"), "{}", stderr);
}

#[test]
fn zero_chunk_size_is_rejected_before_any_work() {
    let (_, stderr, success) = run_pidx(
        &["status"],
        &[
            ("PINECONE_API_KEY", "test-key"),
            ("PINECONE_ENVIRONMENT", "us-east1-gcp"),
            ("PINECONE_INDEX", "squad"),
            ("PIDX_CHUNK_SIZE", "0"),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("PIDX_CHUNK_SIZE"), "{}", stderr);
}
