use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Workspace root: `REPO_ROOT` when it exists, else two levels above this crate.
pub fn repo_root() -> Result<PathBuf> {
    if let Ok(v) = env::var("REPO_ROOT") {
        let p = PathBuf::from(v);
        if p.exists() {
            return Ok(p);
        }
    }
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    Ok(manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .context("failed to infer repo root from CARGO_MANIFEST_DIR")?
        .to_path_buf())
}

/// Non-empty, non-comment lines of a questions file.
pub fn question_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

/// Shorten `text` to `max` characters for one-line display.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}…", cut)
    }
}
