use std::{io, path::PathBuf};

use thiserror::Error;

use crate::model::Channel;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error("{0}")]
    MiscError(String),
    #[error("Error downloading file: {0}")]
    DownloadError(#[from] Box<ureq::Error>),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error("Error parsing JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error parsing XML: {0}")]
    XmlParse(#[from] xmltree::ParseError),
    #[error("Error writing XML: {0}")]
    XmlWrite(#[from] xmltree::Error),
    #[error("No releases found for {0}")]
    NoReleases(String),
    #[error("No {channel} release found for {repo}")]
    NoMatchingRelease { repo: String, channel: Channel },
    #[error("No zip file found in release {tag} of {repo}")]
    NoZipAsset { repo: String, tag: String },
    #[error("No folder found in extracted archive {0:?}")]
    EmptyArchive(PathBuf),
    #[error("'{0}' is not a valid owner/repo identifier")]
    InvalidRepo(String),
    #[error("Installation cancelled by user")]
    Cancelled,
}

impl From<ureq::Error> for InstallerError {
    fn from(value: ureq::Error) -> Self {
        Self::DownloadError(Box::new(value))
    }
}
