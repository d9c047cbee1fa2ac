use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use tracing::{debug, error, warn};

use crate::config::{Settings, GAME_EXECUTABLES};
use crate::error::InstallerError;

/// A directory that is removed, with everything in it, when dropped
#[derive(Debug)]
pub struct TempDir {
    pub path: PathBuf,
}

impl TempDir {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        fs::create_dir_all(path.as_ref())?;
        Ok(TempDir {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Creates a uniquely named hidden directory inside `parent`
    ///
    /// Keeping it next to the destination lets installs use `rename` instead of a copy
    pub fn create_in(parent: impl AsRef<Path>, prefix: &str) -> Result<Self, std::io::Error> {
        let stamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::create(
            parent
                .as_ref()
                .join(format!(".{prefix}-{}-{stamp}", std::process::id())),
        )
    }
}

impl Deref for TempDir {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            error!(
                "Error removing temp directory at '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Interrupt flag for the running process, set from the Ctrl+C handler
pub static INTERRUPT: Interrupt = Interrupt::new();

/// Lets a signal handler stop an install between chunks and entries
///
/// The install notices the request, returns `Cancelled` and its `TempDir`s are dropped on the way
/// out. Outside an install there is nothing to clean up, so the handler may exit right away.
#[derive(Debug, Default)]
pub struct Interrupt {
    requested: AtomicBool,
    active: AtomicBool,
}

impl Interrupt {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            active: AtomicBool::new(false),
        }
    }

    /// Ask the running install to stop
    ///
    /// Returns `false` if no install is running
    pub fn request(&self) -> bool {
        self.requested.store(true, Ordering::SeqCst);
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// # Errors
    /// * `Cancelled` once [`Interrupt::request`] has been called
    pub fn check(&self) -> Result<(), InstallerError> {
        if self.is_requested() {
            return Err(InstallerError::Cancelled);
        }
        Ok(())
    }

    /// Mark an install as running until the guard is dropped
    pub fn enter(&self) -> InterruptGuard<'_> {
        self.active.store(true, Ordering::SeqCst);
        InterruptGuard(self)
    }
}

#[derive(Debug)]
pub struct InterruptGuard<'a>(&'a Interrupt);

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.0.active.store(false, Ordering::SeqCst);
    }
}

/// Whether `dir` contains one of the RimWorld executables
pub fn is_game_dir(dir: impl AsRef<Path>) -> bool {
    let dir = dir.as_ref();
    dir.is_dir() && GAME_EXECUTABLES.iter().any(|exe| dir.join(exe).exists())
}

/// Look for RimWorld without asking the user
///
/// The configured default is accepted if it is a directory. With the `steam` feature the Steam
/// libraries are searched next.
pub fn find_game_dir(settings: &Settings) -> Option<PathBuf> {
    let default = &settings.game_dir;
    if default.is_dir() {
        debug!("Found RimWorld at default location {}", default.display());
        return Some(default.clone());
    }

    steam_game_dir()
}

#[cfg(feature = "steam")]
fn steam_game_dir() -> Option<PathBuf> {
    let dir = steam::rimworld().filter(|d| is_game_dir(d))?;
    debug!("Found RimWorld in Steam library at {}", dir.display());
    Some(dir)
}

#[cfg(not(feature = "steam"))]
fn steam_game_dir() -> Option<PathBuf> {
    None
}

/// Pick the directory an extracted package should be installed from
///
/// Only visible top-level directories count, so an archive whose only folder is hidden or
/// `__MACOSX` is treated as empty. Archives are expected to hold exactly one; if there are more,
/// the first by name is used.
///
/// # Errors
/// * `EmptyArchive` if `extracted` has no top-level directory
/// * IO errors reading `extracted`
pub fn find_package_dir(extracted: impl AsRef<Path>) -> Result<PathBuf, InstallerError> {
    let extracted = extracted.as_ref();
    let mut dirs = vec![];
    for entry in extracted.read_dir()? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        // resource forks added by macOS archivers
        let hidden = name.starts_with('.') || name == "__MACOSX";
        if !hidden && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    if dirs.len() > 1 {
        warn!(
            "Archive has {} top-level folders, installing {}",
            dirs.len(),
            dirs[0].display()
        );
    }

    dirs.into_iter()
        .next()
        .ok_or_else(|| InstallerError::EmptyArchive(extracted.to_path_buf()))
}

#[cfg(feature = "steam")]
pub(crate) mod steam {
    use std::path::PathBuf;
    use steamlocate::SteamDir;

    pub const RIMWORLD_APP_ID: u32 = 294100;

    pub fn rimworld() -> Option<PathBuf> {
        let mut steamdir = SteamDir::locate()?;
        Some(steamdir.app(&RIMWORLD_APP_ID)?.path.clone())
    }
}
