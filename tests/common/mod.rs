// Test utility module for copylint integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// End-to-end tests drive the real `git` binary; skip quietly where it is
/// not installed.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Run one git command in `dir` with identity pinned and host config
/// isolated.
pub fn git(dir: &Path, args: &[&str]) {
    git_as(dir, "john.doe", args);
}

pub fn git_as(dir: &Path, author: &str, args: &[&str]) {
    let output = Command::new("git")
        .arg("-c")
        .arg(format!("user.name={author}"))
        .arg("-c")
        .arg(format!("user.email={author}@example.com"))
        .arg("-c")
        .arg("commit.gpgsign=false")
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn init_repo(dir: &Path) {
    git(dir, &["init", "--quiet"]);
}

pub fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "."]);
    git(dir, &["commit", "--quiet", "-m", message]);
}

/// Write a static config with the default alias map and template.
pub fn write_static_config(dir: &Path, excluded: &[&str]) -> PathBuf {
    let path = dir.join("static_config.json");
    let excluded_json = excluded
        .iter()
        .map(|section| format!("\"{section}\""))
        .collect::<Vec<_>>()
        .join(", ");
    std::fs::write(
        &path,
        format!(
            r#"{{
    "author_aliases": {{
        "john.doe": "John Doe",
        "j.doe": "John Doe"
    }},
    "copyright_field_template": "(c) %CURRENT_YEAR%, Inc.",
    "excluded_path_sections": [{excluded_json}]
}}"#
        ),
    )
    .unwrap();
    path
}
