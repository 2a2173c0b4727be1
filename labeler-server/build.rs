//! Build script for labeler-server
//!
//! Exposes `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` to the crate for
//! the startup log line and `/api/buildinfo`.

use std::path::Path;
use std::process::Command;

/// Workspace-level git metadata; the script reruns when HEAD moves
const GIT_HEAD: &str = "../.git/HEAD";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    if Path::new(GIT_HEAD).exists() {
        println!("cargo:rerun-if-changed={}", GIT_HEAD);
    }

    println!("cargo:rustc-env=GIT_HASH={}", git_hash().as_deref().unwrap_or("unknown"));
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string())
    );
}

/// Short commit hash, with a `-dirty` suffix for uncommitted changes
fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8", "--exclude=*"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}
