use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::{
    api::ReleaseSource,
    config::Settings,
    console::{ask_channel, ask_game_dir, Console},
    core::{
        manage::{install_package, Downloader},
        mods_config::{patch_mods_config, PatchOutcome},
        utils::{find_game_dir, Interrupt},
    },
    error::InstallerError,
    model::{Channel, PackageSpec},
};

/// Locate RimWorld, asking the user if it isn't at the configured location
pub fn resolve_game_dir(
    settings: &Settings,
    console: &mut impl Console,
) -> Result<PathBuf, InstallerError> {
    if let Some(dir) = find_game_dir(settings) {
        console.say(&format!("Found RimWorld at: {}", dir.display()));
        return Ok(dir);
    }

    console.say(&format!(
        "RimWorld not found at default location: {}",
        settings.game_dir.display()
    ));
    ask_game_dir(console)
}

/// Update ModsConfig.xml and tell the user how it went
///
/// Returns `false` if the file couldn't be updated
pub fn update_mods_config(settings: &Settings, console: &mut impl Console) -> bool {
    console.say("\nUpdating ModsConfig.xml");
    let Some(path) = &settings.mods_config else {
        console.say("Warning: unable to determine where ModsConfig.xml is stored.");
        return false;
    };

    match patch_mods_config(path, &settings.required_mods) {
        Ok(PatchOutcome::MissingFile(path)) => {
            console.say(&format!(
                "Warning: ModsConfig.xml not found at {}",
                path.display()
            ));
            console.say("The file will be created when you first run RimWorld.");
            console.say("Please run the game, and try again.");
            true
        }
        Ok(PatchOutcome::AlreadyConfigured) => {
            console.say(
                "ModsConfig.xml already has the correct configuration. No changes needed.",
            );
            true
        }
        Ok(PatchOutcome::Updated { backup }) => {
            console.say(&format!("Backup created at: {}", backup.display()));
            console.say("ModsConfig.xml updated successfully!");
            true
        }
        Err(e) => {
            error!("Failed to patch {}: {}", path.display(), e);
            console.say(&format!("Error updating ModsConfig.xml: {e}"));
            false
        }
    }
}

fn install_step(
    source: &impl ReleaseSource,
    downloader: &impl Downloader,
    console: &mut impl Console,
    package: &PackageSpec,
    game_dir: &Path,
    interrupt: &Interrupt,
) -> Result<(), InstallerError> {
    console.say(&format!("\nInstalling {}", package.display_name));
    let mods_dir = Settings::mods_dir(game_dir);

    match install_package(source, downloader, console, package, &mods_dir, interrupt) {
        Ok(path) => {
            console.say(&format!(
                "{} installed to: {}",
                package.display_name,
                path.display()
            ));
            Ok(())
        }
        Err(e) => {
            console.say(&format!(
                "Failed to install {}: {e}",
                package.display_name
            ));
            console.say("Installation aborted.");
            Err(e)
        }
    }
}

/// Run the whole installation
///
/// Harmony is installed before the user is asked which RimWorld Access channel they want.
/// A failed ModsConfig.xml update is reported but doesn't fail the run.
///
/// # Errors
/// * `Cancelled` if input closes while prompting, or `interrupt` is requested during an install
/// * Any error from installing either package
pub fn run(
    settings: &Settings,
    source: &impl ReleaseSource,
    downloader: &impl Downloader,
    console: &mut impl Console,
    interrupt: &Interrupt,
) -> Result<(), InstallerError> {
    console.say("RimWorld Access Mod Installer");

    let game_dir = resolve_game_dir(settings, console)?;
    debug!("Using game directory {}", game_dir.display());

    let harmony = PackageSpec::new("Harmony", settings.harmony_repo.clone(), Channel::Stable);
    install_step(source, downloader, console, &harmony, &game_dir, interrupt)?;

    let channel = ask_channel(console)?;
    let access = PackageSpec::new("RimWorld Access", settings.access_repo.clone(), channel);
    install_step(source, downloader, console, &access, &game_dir, interrupt)?;

    update_mods_config(settings, console);

    console.say("\nInstallation complete!");
    Ok(())
}
