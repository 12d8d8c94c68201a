use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// A structure to hold environment settings. Backed by settings.json file in the working directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configs {
    pub verbose_mode: bool,
    pub working_directory: String,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: true,
            working_directory: String::new(),
        }
    }
}

impl Configs {
    pub fn new() -> Configs {
        Configs::default()
    }

    /// Joins `file_name` onto the working directory, unless the name is
    /// already absolute or no working directory is set.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        let path = Path::new(file_name);
        if self.working_directory.is_empty() || path.is_absolute() {
            return path.to_path_buf();
        }
        Path::new(&self.working_directory).join(path)
    }
}

/// Reads settings.json from the current directory, falling back to defaults when absent.
pub fn get_configs() -> Result<Configs, Error> {
    get_configs_from(&std::env::current_dir()?)
}

pub fn get_configs_from(dir: &Path) -> Result<Configs, Error> {
    match fs::read_to_string(dir.join(SETTINGS_FILE)) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Failed to parse {}: {}", SETTINGS_FILE, e),
            )
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Configs::new()),
        Err(e) => Err(e),
    }
}

pub fn save_configs(configs: &Configs) -> Result<(), Error> {
    save_configs_to(configs, &std::env::current_dir()?)
}

pub fn save_configs_to(configs: &Configs, dir: &Path) -> Result<(), Error> {
    let configs_json = serde_json::to_string_pretty(configs)
        .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
    let mut file = File::create(dir.join(SETTINGS_FILE))?;
    file.write_all(configs_json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_settings_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let configs = get_configs_from(dir.path()).unwrap();
        assert_eq!(configs, Configs::new());
        assert!(configs.verbose_mode);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let configs = Configs {
            verbose_mode: false,
            working_directory: "/data/gis".to_string(),
        };
        save_configs_to(&configs, dir.path()).unwrap();
        assert_eq!(get_configs_from(dir.path()).unwrap(), configs);
    }

    #[test]
    fn test_partial_and_malformed_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), r#"{ "verbose_mode": false }"#).unwrap();
        let configs = get_configs_from(dir.path()).unwrap();
        assert!(!configs.verbose_mode);
        assert!(configs.working_directory.is_empty());

        fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();
        let err = get_configs_from(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_resolve() {
        let mut configs = Configs::new();
        assert_eq!(configs.resolve("roads.shp"), PathBuf::from("roads.shp"));
        configs.working_directory = "data".to_string();
        assert_eq!(configs.resolve("roads.shp"), Path::new("data").join("roads.shp"));
    }
}
