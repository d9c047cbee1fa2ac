use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, Write},
    path::{Component, Path, PathBuf},
};

use tracing::{debug, trace};
use zip::ZipArchive;

use crate::{
    api::{github_request, resolve_download, ReleaseSource},
    console::Console,
    core::utils::{find_package_dir, Interrupt, TempDir, INTERRUPT},
    error::InstallerError,
    model::PackageSpec,
};

/// Size of the buffer used when streaming downloads to disk
pub const CHUNK_SIZE: usize = 8192;

/// Something that can fetch a URL to a file
pub trait Downloader {
    /// Download `url` into `dest`, calling `progress` with `(delta, downloaded, total)` after every chunk
    ///
    /// Stops with `Cancelled` once `interrupt` is requested. Returns the number of bytes written
    fn download(
        &self,
        url: &str,
        dest: &Path,
        interrupt: &Interrupt,
        progress: &mut dyn FnMut(u64, u64, Option<u64>),
    ) -> Result<u64, InstallerError>;
}

/// Downloads over HTTP(S) with `ureq`
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        interrupt: &Interrupt,
        progress: &mut dyn FnMut(u64, u64, Option<u64>),
    ) -> Result<u64, InstallerError> {
        download_file_with_progress(url, dest, interrupt, progress)
    }
}

/// Download a file and report progress
/// # Params
/// * url - URL to download from
/// * file_path - Full path to save file to, replaced if it exists
/// * interrupt - checked after every chunk, the download stops with `Cancelled` once requested
/// * cb - callback receiving `(delta, downloaded, total)`. `total` is `None` when the server
///   doesn't send a content length
pub fn download_file_with_progress<F>(
    url: &str,
    file_path: impl AsRef<Path>,
    interrupt: &Interrupt,
    mut cb: F,
) -> Result<u64, InstallerError>
where
    F: FnMut(u64, u64, Option<u64>),
{
    let file_path = file_path.as_ref();
    debug!("Starting download from {}", url);
    let res = github_request(url, None).call()?;

    let total = res
        .header("Content-Length")
        .and_then(|v| v.trim().parse::<u64>().ok());
    debug!("Downloading file size: {:?}", total);

    let mut file = File::create(file_path)?;
    let downloaded = copy_with_progress(
        &mut res.into_reader(),
        &mut file,
        total,
        interrupt,
        &mut cb,
    )?;
    file.flush()?;
    debug!("Finished download to {}", file_path.display());

    Ok(downloaded)
}

/// Wrapper for calling `download_file_with_progress` without a progress callback
pub fn download_file(url: &str, file_path: impl AsRef<Path>) -> Result<u64, InstallerError> {
    download_file_with_progress(url, file_path, &INTERRUPT, |_, _, _| {})
}

/// Copies `reader` into `writer` in [`CHUNK_SIZE`] pieces, reporting each one to `cb`
///
/// `interrupt` is checked before every chunk
pub fn copy_with_progress<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    total: Option<u64>,
    interrupt: &Interrupt,
    cb: &mut F,
) -> Result<u64, InstallerError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(u64, u64, Option<u64>) + ?Sized,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    loop {
        interrupt.check()?;
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
        downloaded += n as u64;
        cb(n as u64, downloaded, total);
    }

    Ok(downloaded)
}

/// Extract every entry of a zip archive into `target_dir`
///
/// Entries whose names would escape `target_dir` are skipped. `interrupt` is checked before
/// every entry.
pub fn extract_archive<R: Read + Seek>(
    archive: R,
    target_dir: impl AsRef<Path>,
    interrupt: &Interrupt,
) -> Result<(), InstallerError> {
    let target_dir = target_dir.as_ref();
    let mut archive = ZipArchive::new(archive)?;

    for i in 0..archive.len() {
        interrupt.check()?;
        let mut file = archive.by_index(i)?;
        let Some(name) = file.enclosed_name() else {
            trace!("Skip missing enclosed name '{}'", file.name());
            continue;
        };
        let out = target_dir.join(&name);

        if file.is_dir() {
            trace!("Creating dir {}", out.display());
            fs::create_dir_all(&out)?;
            continue;
        } else if let Some(p) = out.parent() {
            fs::create_dir_all(p)?;
        }

        trace!("Extracting file to {}", out.display());
        let mut outfile = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&out)?;
        io::copy(&mut file, &mut outfile)?;
    }

    Ok(())
}

/// Install a packaged mod into a mods directory
/// # Params
/// * archive - zip file holding a single top-level folder
/// * mods_dir - directory to install into, must exist
/// * interrupt - checked while extracting and once more before the existing install is touched
///
/// An existing install with the same folder name is deleted first. Returns the installed path.
pub fn install_mod<R: Read + Seek>(
    archive: R,
    mods_dir: impl AsRef<Path>,
    interrupt: &Interrupt,
) -> Result<PathBuf, InstallerError> {
    let mods_dir = mods_dir.as_ref();
    debug!("Starting mod install into {}", mods_dir.display());

    //Extract next to the destination so the final move is a rename
    let temp_dir = TempDir::create_in(mods_dir, "extract")?;
    extract_archive(archive, &*temp_dir, interrupt)?;

    let package = find_package_dir(&*temp_dir)?;
    let name = match package.components().next_back() {
        Some(Component::Normal(name)) => name.to_owned(),
        _ => {
            return Err(InstallerError::MiscError(format!(
                "Unable to name extracted folder {}",
                package.display()
            )))
        }
    };
    let dest = mods_dir.join(name);

    interrupt.check()?;
    if dest.is_dir() {
        debug!("Removing existing install at {}", dest.display());
        fs::remove_dir_all(&dest)?;
    } else if dest.exists() {
        fs::remove_file(&dest)?;
    }

    trace!(
        "Temp path: {} | Perm path: {}",
        package.display(),
        dest.display()
    );
    fs::rename(&package, &dest)?;

    Ok(dest)
}

/// Resolve, download and install one package
///
/// The download lives in a temporary directory inside `mods_dir` and is removed whether or not
/// the install succeeds, including when `interrupt` stops it.
pub fn install_package(
    source: &impl ReleaseSource,
    downloader: &impl Downloader,
    console: &mut impl Console,
    package: &PackageSpec,
    mods_dir: impl AsRef<Path>,
    interrupt: &Interrupt,
) -> Result<PathBuf, InstallerError> {
    // declared first so it is dropped after every TempDir below
    let _running = interrupt.enter();
    interrupt.check()?;

    let mods_dir = mods_dir.as_ref();
    fs::create_dir_all(mods_dir)?;

    let asset = resolve_download(source, &package.repo, package.channel)?;
    console.say(&format!(
        "Found release: {} - {}",
        asset.tag, asset.release_name
    ));

    let work_dir = TempDir::create_in(mods_dir, "download")?;
    let file_name = Path::new(&asset.file_name)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "package.zip".into());
    let archive_path = work_dir.join(file_name);

    // GitHub reports the asset size, used when the download has no Content-Length
    let known_size = (asset.size > 0).then_some(asset.size);
    console.say(&format!("Downloading from {}...", asset.url));
    let res = downloader.download(
        &asset.url,
        &archive_path,
        interrupt,
        &mut |_, downloaded, total| console.progress(downloaded, total.or(known_size)),
    );
    console.progress_done();
    let size = res?;
    debug!("Downloaded {} bytes to {}", size, archive_path.display());
    console.say("Download complete!");

    console.say(&format!("Extracting {}...", asset.file_name));
    let installed = install_mod(File::open(&archive_path)?, mods_dir, interrupt)?;
    Ok(installed)
}
