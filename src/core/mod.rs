pub mod manage;
pub mod mods_config;
pub mod setup;
pub mod utils;

pub use manage::{install_mod, install_package, Downloader, HttpDownloader};
pub use mods_config::{patch_mods_config, PatchOutcome};
pub use setup::run;
pub use utils::{find_game_dir, is_game_dir, Interrupt, INTERRUPT};
