use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{error::InstallerError, model::ModsConfig};

/// What [`patch_mods_config`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    ///The file doesn't exist yet, RimWorld creates it on first launch
    MissingFile(PathBuf),
    ///The required mods were already first, nothing was written
    AlreadyConfigured,
    ///The file was rewritten after copying the original to `backup`
    Updated { backup: PathBuf },
}

/// The `.backup` sibling of a config file, e.g. `ModsConfig.xml.backup`
pub fn backup_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".backup");
    path.with_file_name(name)
}

/// Make sure `required` are the first enabled mods in ModsConfig.xml, in order
///
/// Mods that were enabled before stay enabled after the required ones. The original file is
/// copied to [`backup_path`] before anything is written.
///
/// # Errors
/// * IO errors reading, backing up or writing the file
/// * Malformed XML
pub fn patch_mods_config(
    path: impl AsRef<Path>,
    required: &[impl AsRef<str>],
) -> Result<PatchOutcome, InstallerError> {
    let path = path.as_ref();
    if !path.try_exists()? {
        warn!("ModsConfig.xml not found at {}", path.display());
        return Ok(PatchOutcome::MissingFile(path.to_path_buf()));
    }

    let mut config = ModsConfig::load(path)?;
    debug!("Currently active mods: {:?}", config.active_mods());

    if config.has_prefix(required) {
        debug!("{} already configured", path.display());
        return Ok(PatchOutcome::AlreadyConfigured);
    }

    let backup = backup_path(path);
    fs::copy(path, &backup)?;
    debug!("Backup created at {}", backup.display());

    config.set_required_first(required);
    config.save(path)?;
    debug!("Wrote {}", path.display());

    Ok(PatchOutcome::Updated { backup })
}
