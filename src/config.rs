//! Installer settings
//!
//! Every value has a default matching a stock Steam install of RimWorld on the current platform.
//! Each can be overridden through an environment variable:
//!
//! | Variable                | Setting                     |
//! |-------------------------|-----------------------------|
//! | `RIMWORLD_DIR`          | [`Settings::game_dir`]      |
//! | `RIMWORLD_MODS_CONFIG`  | [`Settings::mods_config`]   |
//! | `RIMWORLD_HARMONY_REPO` | [`Settings::harmony_repo`]  |
//! | `RIMWORLD_ACCESS_REPO`  | [`Settings::access_repo`]   |
//! | `RIMWORLD_GITHUB_API`   | [`Settings::github_api`]    |
//! | `GITHUB_TOKEN`          | [`Settings::github_token`]  |

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{api::GITHUB_API, error::InstallerError, model::RepoId};

pub const HARMONY_REPO: &str = "pardeike/HarmonyRimWorld";
pub const ACCESS_REPO: &str = "shane12300/rimworld_access";

/// Mods that must be enabled first, in this order
pub const REQUIRED_MODS: [&str; 3] = [
    "brrainz.harmony",
    "ludeon.rimworld",
    "shane12300.rimworldaccess",
];

/// Executables that identify a RimWorld install directory
pub const GAME_EXECUTABLES: &[&str] = &[
    "RimWorldWin64.exe",
    "RimWorldWin.exe",
    "RimWorldLinux",
    "RimWorldMac.app",
];

#[derive(Debug, Clone)]
pub struct Settings {
    ///Where RimWorld is expected to be installed
    pub game_dir: PathBuf,
    ///Path to ModsConfig.xml, `None` if the home directory can't be determined
    pub mods_config: Option<PathBuf>,
    pub harmony_repo: RepoId,
    pub access_repo: RepoId,
    pub github_api: String,
    pub github_token: Option<String>,
    pub required_mods: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_dir: default_game_dir(),
            mods_config: default_mods_config(),
            harmony_repo: RepoId::from_static(HARMONY_REPO),
            access_repo: RepoId::from_static(ACCESS_REPO),
            github_api: GITHUB_API.to_string(),
            github_token: None,
            required_mods: REQUIRED_MODS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, InstallerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    ///
    /// Empty values are treated as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, InstallerError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(dir) = get("RIMWORLD_DIR") {
            settings.game_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("RIMWORLD_MODS_CONFIG") {
            settings.mods_config = Some(PathBuf::from(path));
        }
        if let Some(repo) = get("RIMWORLD_HARMONY_REPO") {
            settings.harmony_repo = repo.parse()?;
        }
        if let Some(repo) = get("RIMWORLD_ACCESS_REPO") {
            settings.access_repo = repo.parse()?;
        }
        if let Some(api) = get("RIMWORLD_GITHUB_API") {
            settings.github_api = api;
        }
        settings.github_token = get("GITHUB_TOKEN");

        debug!("Loaded settings: {:?}", settings.redacted());
        Ok(settings)
    }

    /// The `Mods` directory inside a game install
    pub fn mods_dir(game_dir: impl AsRef<Path>) -> PathBuf {
        game_dir.as_ref().join("Mods")
    }

    fn redacted(&self) -> Self {
        let mut s = self.clone();
        if s.github_token.is_some() {
            s.github_token = Some("***".into());
        }
        s
    }
}

/// Default Steam location of RimWorld
pub fn default_game_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files (x86)\Steam\steamapps\common\RimWorld")
    } else if cfg!(target_os = "macos") {
        dirs::home_dir()
            .unwrap_or_default()
            .join("Library/Application Support/Steam/steamapps/common/RimWorld")
    } else {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".local/share/Steam/steamapps/common/RimWorld")
    }
}

/// Where RimWorld keeps ModsConfig.xml for the current user
pub fn default_mods_config() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let config_dir = if cfg!(windows) {
        home.join("AppData")
            .join("LocalLow")
            .join("Ludeon Studios")
            .join("RimWorld by Ludeon Studios")
            .join("Config")
    } else if cfg!(target_os = "macos") {
        home.join("Library")
            .join("Application Support")
            .join("RimWorld")
            .join("Config")
    } else {
        home.join(".config")
            .join("unity3d")
            .join("Ludeon Studios")
            .join("RimWorld by Ludeon Studios")
            .join("Config")
    };

    Some(config_dir.join("ModsConfig.xml"))
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.game_dir, default_game_dir());
        assert_eq!(settings.harmony_repo.as_str(), HARMONY_REPO);
        assert_eq!(settings.access_repo.as_str(), ACCESS_REPO);
        assert_eq!(settings.github_api, GITHUB_API);
        assert_eq!(settings.required_mods, REQUIRED_MODS);
        assert!(settings.github_token.is_none());
    }

    #[test]
    fn environment_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("RIMWORLD_DIR", "/games/rimworld"),
            ("RIMWORLD_MODS_CONFIG", "/tmp/ModsConfig.xml"),
            ("RIMWORLD_ACCESS_REPO", "someone/fork"),
            ("GITHUB_TOKEN", "secret"),
            ("RIMWORLD_GITHUB_API", ""),
        ]))
        .unwrap();

        assert_eq!(settings.game_dir, PathBuf::from("/games/rimworld"));
        assert_eq!(
            settings.mods_config,
            Some(PathBuf::from("/tmp/ModsConfig.xml"))
        );
        assert_eq!(settings.access_repo.as_str(), "someone/fork");
        assert_eq!(settings.github_token.as_deref(), Some("secret"));
        assert_eq!(settings.github_api, GITHUB_API);
        assert_eq!(settings.redacted().github_token.as_deref(), Some("***"));
    }

    #[test]
    fn invalid_repo_override_is_rejected() {
        let res = Settings::from_lookup(lookup(&[("RIMWORLD_HARMONY_REPO", "not a repo")]));
        assert!(matches!(res, Err(InstallerError::InvalidRepo(_))));
    }

    #[test]
    fn mods_dir_is_inside_game_dir() {
        assert_eq!(
            Settings::mods_dir("/games/rimworld"),
            PathBuf::from("/games/rimworld/Mods")
        );
    }

    #[test]
    fn mods_config_file_name() {
        if let Some(path) = default_mods_config() {
            assert!(path.ends_with("Config/ModsConfig.xml"));
        }
    }
}
