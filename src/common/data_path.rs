// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DATA_DIR";

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn env_data_dir() -> Option<String> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the active data directory using precedence:
/// 1) explicit setting
/// 2) `DATA_DIR`
/// 3) cwd
pub fn resolve_data_dir(explicit_data_dir: Option<&str>) -> PathBuf {
    match explicit_data_dir
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(env_data_dir)
    {
        Some(dir) => absolute(PathBuf::from(dir)),
        None => absolute(PathBuf::from(".")),
    }
}

/// Resolve a possibly relative file path against the data directory.
pub fn resolve_data_path(raw_path: &str, explicit_data_dir: Option<&str>) -> PathBuf {
    let as_path = Path::new(raw_path);
    if as_path.is_absolute() {
        return as_path.to_path_buf();
    }
    resolve_data_dir(explicit_data_dir).join(as_path)
}

/// Turn a bare SQLite file path into a connection URL. URLs pass through.
pub fn sqlite_url(raw: &str, explicit_data_dir: Option<&str>) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite:") {
        return trimmed.to_string();
    }
    format!(
        "sqlite://{}",
        resolve_data_path(trimmed, explicit_data_dir).display()
    )
}
