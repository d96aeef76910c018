use crate::domain::{config::ReplComConfig, error::{ReplComError, ReplComResult}};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR: &str = ".replcom";
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager.
    ///
    /// Without a home directory only the defaults and the project file apply.
    pub fn new() -> Self {
        let project_config_path = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_config_path(&dir));

        Self::from_home(dirs::home_dir(), project_config_path)
    }

    fn from_home(home: Option<PathBuf>, project_config_path: Option<PathBuf>) -> Self {
        let global_config_path = home.map(|home| Self::global_config_path(&home));
        if global_config_path.is_none() {
            debug!("No home directory, skipping global configuration");
        }

        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Manager with explicit paths
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path: Some(global_config_path),
            project_config_path,
        }
    }

    /// Load configuration: defaults, then the global file, then the project file
    pub fn load_config(&self) -> ReplComResult<ReplComConfig> {
        let mut config = ReplComConfig::default();

        if let Some(global_path) = &self.global_config_path {
            if global_path.exists() {
                config = self.load_config_from_path(global_path)?;
            }
        }

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project_config = self.load_config_from_path(project_path)?;
                // Project files pin discovery to the boards used in that project
                config.discovery = project_config.discovery;
            }
        }

        Ok(config)
    }

    /// Global configuration path under `home`
    fn global_config_path(home: &Path) -> PathBuf {
        home.join(".config").join("replcom").join(CONFIG_FILE)
    }

    /// Find project configuration path by walking up directory tree
    pub fn find_project_config_path(start: &Path) -> Option<PathBuf> {
        let mut path = start;

        loop {
            let config_path = path.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> ReplComResult<ReplComConfig> {
        let content = fs::read_to_string(path).map_err(|e| ReplComError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| ReplComError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &ReplComConfig) -> ReplComResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| ReplComError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| ReplComError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration under `path`, returning the file written
    pub fn init_project_config(&self, path: &Path) -> ReplComResult<PathBuf> {
        let config_dir = path.join(CONFIG_DIR);
        let config_file = config_dir.join(CONFIG_FILE);

        if config_file.exists() {
            return Err(ReplComError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| ReplComError::Config {
            message: format!("Failed to create {} directory: {}", CONFIG_DIR, e),
        })?;

        self.save_config_to_path(&config_file, &ReplComConfig::default())?;
        Ok(config_file)
    }
}
