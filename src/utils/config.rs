use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const JSON_DIR_KEY: &str = "ANNOTATION_JSON_DIR";
pub const DB_PATH_KEY: &str = "ANNOTATION_DB_PATH";

const DEFAULT_JSON_DIR: &str = "data/json";
const DEFAULT_DB_PATH: &str = "data/sqlite.db";
const SEARCH_DEPTH: usize = 5;

/// Values given on the command line; these win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub json_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub in_memory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub json_dir: PathBuf,
    pub storage: StorageLocation,
}

#[derive(Debug, Default, PartialEq)]
struct EnvPaths {
    json_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

/// Resolve where documents are read from and where the database lives.
///
/// Command line first, then the env file, then the defaults. When the json
/// directory came from the env file or the default and does not exist, the
/// working directory (and its parent) is searched for a `json` directory and
/// the result is saved to the env file for next time.
pub fn resolve_paths(env_path: &Path, overrides: &Overrides) -> Result<RunPaths> {
    let root = std::env::current_dir()?;
    resolve_paths_from(&root, env_path, overrides)
}

fn resolve_paths_from(root: &Path, env_path: &Path, overrides: &Overrides) -> Result<RunPaths> {
    let env = if env_path.exists() {
        let env = load_from_env(env_path)?;
        info!("Loaded settings from {:?}", env_path);
        env
    } else {
        EnvPaths::default()
    };

    let json_dir = match &overrides.json_dir {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(anyhow!("JSON directory {:?} does not exist", dir));
            }
            dir.clone()
        }
        None => {
            let configured = env
                .json_dir
                .clone()
                .unwrap_or_else(|| root.join(DEFAULT_JSON_DIR));
            if configured.is_dir() {
                configured
            } else {
                warn!("JSON directory {:?} not found. Searching filesystem...", configured);
                let found = find_dir(root, "json", SEARCH_DEPTH)?;
                info!("Found JSON directory: {:?}", found);
                save_to_env(env_path, JSON_DIR_KEY, &found)?;
                info!("Saved {} to {:?}", JSON_DIR_KEY, env_path);
                found
            }
        }
    };

    let storage = if overrides.in_memory {
        StorageLocation::Memory
    } else {
        let path = overrides
            .db_path
            .clone()
            .or(env.db_path)
            .unwrap_or_else(|| root.join(DEFAULT_DB_PATH));
        StorageLocation::File(path)
    };

    Ok(RunPaths { json_dir, storage })
}

fn find_dir(root: &Path, dirname: &str, max_depth: usize) -> Result<PathBuf> {
    let search = |base: &Path| {
        WalkDir::new(base)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_dir() && e.file_name() == dirname)
            .map(|e| e.path().to_path_buf())
    };

    if let Some(found) = search(root) {
        return Ok(found);
    }

    // Running from a subdirectory of the project.
    if let Some(found) = root.parent().and_then(search) {
        return Ok(found);
    }

    Err(anyhow!("Could not find a '{}' directory near {:?}.", dirname, root))
}

fn load_from_env(path: &Path) -> Result<EnvPaths> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut env = EnvPaths::default();
    for line in reader.lines() {
        let line = line?;
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                JSON_DIR_KEY => env.json_dir = Some(PathBuf::from(value.trim())),
                DB_PATH_KEY => env.db_path = Some(PathBuf::from(value.trim())),
                _ => {}
            }
        }
    }
    Ok(env)
}

/// Set `key` in the env file, keeping every other line.
fn save_to_env(path: &Path, key: &str, value: &Path) -> Result<()> {
    let mut lines = Vec::new();
    if path.exists() {
        for line in fs::read_to_string(path)?.lines() {
            let same_key = line
                .split_once('=')
                .map(|(k, _)| k.trim() == key)
                .unwrap_or(false);
            if !same_key {
                lines.push(line.to_string());
            }
        }
    }
    lines.push(format!("{}={}", key, value.display()));

    let mut file = File::create(path).with_context(|| format!("Failed to write {:?}", path))?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_env() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(".env");
        fs::write(&path, "OTHER=1\nANNOTATION_JSON_DIR=/old\n")?;

        save_to_env(&path, JSON_DIR_KEY, Path::new("/tmp/json"))?;
        save_to_env(&path, DB_PATH_KEY, Path::new("/tmp/db.sqlite"))?;

        let content = fs::read_to_string(&path)?;
        assert!(content.contains("OTHER=1"));
        assert!(!content.contains("/old"));

        let loaded = load_from_env(&path)?;
        assert_eq!(loaded.json_dir, Some(PathBuf::from("/tmp/json")));
        assert_eq!(loaded.db_path, Some(PathBuf::from("/tmp/db.sqlite")));
        Ok(())
    }

    #[test]
    fn test_command_line_wins() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let json = dir.path().join("docs");
        fs::create_dir(&json)?;
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "ANNOTATION_DB_PATH=/from/env.db\n")?;

        let overrides = Overrides {
            json_dir: Some(json.clone()),
            db_path: None,
            in_memory: false,
        };
        let paths = resolve_paths_from(dir.path(), &env_path, &overrides)?;
        assert_eq!(paths.json_dir, json);
        assert_eq!(paths.storage, StorageLocation::File(PathBuf::from("/from/env.db")));

        let memory = Overrides {
            in_memory: true,
            ..overrides
        };
        let paths = resolve_paths_from(dir.path(), &env_path, &memory)?;
        assert_eq!(paths.storage, StorageLocation::Memory);
        Ok(())
    }

    #[test]
    fn test_discovered_json_dir_is_saved() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("project").join("input").join("json");
        fs::create_dir_all(&nested)?;
        let env_path = dir.path().join(".env");

        let paths = resolve_paths_from(dir.path(), &env_path, &Overrides::default())?;
        assert_eq!(paths.json_dir, nested);
        assert_eq!(
            paths.storage,
            StorageLocation::File(dir.path().join(DEFAULT_DB_PATH))
        );

        let saved = load_from_env(&env_path)?;
        assert_eq!(saved.json_dir, Some(nested));
        Ok(())
    }

    #[test]
    fn test_missing_command_line_dir_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let overrides = Overrides {
            json_dir: Some(dir.path().join("absent")),
            ..Overrides::default()
        };
        assert!(resolve_paths_from(dir.path(), &dir.path().join(".env"), &overrides).is_err());
        Ok(())
    }
}
