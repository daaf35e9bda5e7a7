//! Stamps the build with a version label.
//!
//! Release builds (HEAD sits on a tag) report the crate version. Anything else
//! reports `dev@<short hash>` so generated sites can be traced back to the
//! commit that produced them via their `<meta name="generator">` tag.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let version = env!("CARGO_PKG_VERSION");
    let label = if git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some() {
        version.to_string()
    } else {
        match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) if !hash.is_empty() => format!("dev@{hash}"),
            _ => format!("{version}-dev"),
        }
    };

    println!("cargo:rustc-env=LEAFPRESS_VERSION={label}");
}
