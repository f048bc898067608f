use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use squall_exec::LaunchConfig;
use squall_model::AppKey;

pub const CONFIG_FILE: &str = "squall.yaml";
const DEFAULT_VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no squall.yaml found in {0} or any parent directory")]
    NotFound(PathBuf),

    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("app {0} not found in squall.yaml")]
    UnknownApp(AppKey),

    #[error("app {0} listed more than once in squall.yaml")]
    DuplicateApp(AppKey),
}

/// Contents of `squall.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Relative to the directory holding the config file.
    #[serde(default)]
    pub build_dir: PathBuf,
    #[serde(default)]
    pub apps: BTreeMap<String, Vec<AppVersion>>,
    #[serde(default)]
    pub launch: Option<LaunchSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppVersion {
    pub path: PathBuf,
    pub version: String,
}

/// Command that starts the App server inside the build directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchSection {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// A loaded config and the directory it was found in.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    /// Load `explicit`, or search `start` and its parents for `squall.yaml`.
    pub fn discover(explicit: Option<&Path>, start: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => find(start)?,
        };
        let config = ProjectConfig::load(&path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { dir, config })
    }

    pub fn build_dir(&self) -> PathBuf {
        self.dir.join(&self.config.build_dir)
    }

    pub fn launch_config(&self) -> LaunchConfig {
        let cfg = LaunchConfig::new(self.build_dir());
        match &self.config.launch {
            Some(launch) => cfg.with_program(launch.program.clone(), launch.args.clone()),
            None => cfg,
        }
    }

    /// App source location, absolute when it can be resolved.
    pub fn app_path(&self, app: &AppVersion) -> PathBuf {
        let path = self.dir.join(&app.path);
        fs::canonicalize(&path).unwrap_or(path)
    }
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: ProjectConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if cfg.version.is_empty() {
            cfg.version = default_version();
        }
        cfg.check_unique()?;
        Ok(cfg)
    }

    /// Each App id and version pair may appear once.
    fn check_unique(&self) -> Result<(), ConfigError> {
        for (id, versions) in &self.apps {
            let mut seen = BTreeSet::new();
            if let Some(dup) = versions.iter().find(|v| !seen.insert(v.version.as_str())) {
                return Err(ConfigError::DuplicateApp(AppKey::new(id.clone(), dup.version.clone())));
            }
        }
        Ok(())
    }

    pub fn lookup(&self, key: &AppKey) -> Option<&AppVersion> {
        self.apps
            .get(&key.app_id)?
            .iter()
            .find(|v| v.version == key.version)
    }

    /// Every configured App version, ordered by App id.
    pub fn keys(&self) -> Vec<AppKey> {
        self.apps
            .iter()
            .flat_map(|(id, versions)| versions.iter().map(|v| AppKey::new(id.clone(), v.version.clone())))
            .collect()
    }
}

fn find(start: &Path) -> Result<PathBuf, ConfigError> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ConfigError::NotFound(start.to_path_buf()))
}
