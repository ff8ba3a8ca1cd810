use anyhow::Result;
use std::path::{Path, PathBuf};

pub const LOG_FOLDER_NAME: &str = "Explorer_Wizard_Log";
pub const CONFIG_FILE_NAME: &str = "explorer-wizard.toml";
pub const CONFIG_ENV_VAR: &str = "EXPLORER_WIZARD_CONFIG";

/// Resolve deployment folder (absolute path)
pub fn resolve_deployment_folder() -> Result<PathBuf> {
    // Prefer the folder where the executable lives (works in dev and deployed)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return Ok(dir.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(cwd)
}

/// Resolve log folder (absolute path)
///
/// Walks up from the working directory looking for an existing `Explorer_Wizard_Log/`
/// so nested invocations share one folder; otherwise creates it next to the executable.
pub fn resolve_log_folder() -> Result<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(found) = find_upwards(&cwd, LOG_FOLDER_NAME, 12) {
            return Ok(found);
        }
    }

    let base = resolve_deployment_folder()?;
    let log_dir = base.join(LOG_FOLDER_NAME);
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
    Ok(log_dir)
}

/// Resolve the optional config file. Order: `$EXPLORER_WIZARD_CONFIG`, working directory,
/// executable folder, then the per-user config directory. Returns `None` when no file exists.
pub fn resolve_config_file() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(explicit));
    }

    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    if let Ok(dir) = resolve_deployment_folder() {
        candidates.push(dir);
    }
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("explorer-wizard"));
    }

    first_existing(&candidates, CONFIG_FILE_NAME)
}

fn first_existing(dirs: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|d| d.join(file_name))
        .find(|p| p.is_file())
}

fn find_upwards(start: &Path, name: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    for _ in 0..max_levels {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_upwards_locates_ancestor_folder() {
        let root = tempfile::tempdir().unwrap();
        let logs = root.path().join(LOG_FOLDER_NAME);
        std::fs::create_dir_all(&logs).unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_upwards(&nested, LOG_FOLDER_NAME, 12).unwrap();
        assert_eq!(found, logs);
    }

    #[test]
    fn find_upwards_respects_level_limit() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join(LOG_FOLDER_NAME)).unwrap();
        let nested = root.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();

        assert!(find_upwards(&nested, LOG_FOLDER_NAME, 2).is_none());
    }

    #[test]
    fn first_existing_skips_missing_candidates() {
        let empty = tempfile::tempdir().unwrap();
        let with_file = tempfile::tempdir().unwrap();
        let cfg = with_file.path().join(CONFIG_FILE_NAME);
        std::fs::write(&cfg, "api_base_url = \"http://localhost\"\n").unwrap();

        let dirs = vec![empty.path().to_path_buf(), with_file.path().to_path_buf()];
        assert_eq!(first_existing(&dirs, CONFIG_FILE_NAME), Some(cfg));
        assert_eq!(first_existing(&dirs[..1], CONFIG_FILE_NAME), None);
    }
}
