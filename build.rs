use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    // Local build counter, bumped on every build script run
    let counter = Path::new("BUILD_NUMBER");
    let previous: u64 = fs::read_to_string(counter)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    let build = previous + 1;
    if let Err(e) = fs::write(counter, build.to_string()) {
        println!("cargo:warning=could not update BUILD_NUMBER: {}", e);
    }

    let profile = match std::env::var("PROFILE").as_deref() {
        Ok("release") => "release",
        _ => "development",
    };

    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=PERZIP_VERSION={}", version);
    println!("cargo:rustc-env=PERZIP_BUILD={}", build);
    println!("cargo:rustc-env=PERZIP_PROFILE={}", profile);
    println!("cargo:rustc-env=PERZIP_GIT_HASH={}", git_hash);

    println!("cargo:rerun-if-changed=BUILD_NUMBER");
    println!("cargo:rerun-if-env-changed=PROFILE");
}
