#[cfg(test)]
mod test;

pub mod api;
pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod model;

pub mod prelude {
    pub use crate::api::{resolve_download, GithubApi, ReleaseSource};
    pub use crate::config::{Settings, REQUIRED_MODS};
    pub use crate::console::{Console, Stdio};
    pub use crate::core::manage::{download_file, download_file_with_progress};
    pub use crate::core::{
        find_game_dir, install_mod, install_package, is_game_dir, patch_mods_config, run,
        Downloader, HttpDownloader, Interrupt, PatchOutcome, INTERRUPT,
    };
    pub use crate::error::InstallerError;
    pub use crate::model::{Channel, GithubRelease, ModsConfig, PackageSpec, RepoId};
}
