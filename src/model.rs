use std::{fmt, io::Read, path::Path, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::InstallerError;

lazy_static! {
    static ref REPO_ID: Regex =
        Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("repo id pattern is valid");
}

/// Release selection policy for a GitHub repository
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    ///The release GitHub reports as "latest"
    #[default]
    Stable,
    ///The newest release whose tag contains `-beta`
    Beta,
    ///The release tagged `dev`
    Dev,
}

impl Channel {
    /// Maps a menu choice (`1`, `2` or `3`) to a channel
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::Stable),
            "2" => Some(Self::Beta),
            "3" => Some(Self::Dev),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Dev => "dev",
        }
    }

    /// Whether a release tag belongs to this channel
    ///
    /// Stable releases are picked by the API rather than by tag, so this is always `false` for them
    pub fn matches_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        match self {
            Self::Stable => false,
            Self::Beta => tag.contains("-beta"),
            Self::Dev => tag == "dev",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            "dev" => Ok(Self::Dev),
            other => Err(InstallerError::MiscError(format!(
                "Invalid release channel: {other}"
            ))),
        }
    }
}

/// An `owner/repo` identifier on GitHub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId(String);

impl RepoId {
    /// Wraps a compiled-in identifier without validating it
    pub(crate) fn from_static(repo: &'static str) -> Self {
        Self(repo.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RepoId {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if REPO_ID.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InstallerError::InvalidRepo(s.to_string()))
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl GithubRelease {
    ///The first asset that is a zip archive
    pub fn zip_asset(&self) -> Option<&GithubAsset> {
        self.assets
            .iter()
            .find(|a| a.name.to_lowercase().ends_with(".zip"))
    }
}

/// A downloadable archive picked from a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub tag: String,
    pub release_name: String,
    pub file_name: String,
    pub url: String,
    pub size: u64,
}

/// A package the installer knows how to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub display_name: String,
    pub repo: RepoId,
    pub channel: Channel,
}

impl PackageSpec {
    pub fn new(display_name: impl Into<String>, repo: RepoId, channel: Channel) -> Self {
        Self {
            display_name: display_name.into(),
            repo,
            channel,
        }
    }
}

// ModsConfig.xml

const ACTIVE_MODS: &str = "activeMods";
const LIST_ITEM: &str = "li";

/// Represents a parsed ModsConfig.xml document
#[derive(Debug, Clone)]
pub struct ModsConfig {
    root: Element,
}

impl ModsConfig {
    pub fn parse(reader: impl Read) -> Result<Self, InstallerError> {
        Ok(Self {
            root: Element::parse(reader)?,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, InstallerError> {
        let raw = std::fs::read(path.as_ref())?;
        Self::parse(raw.as_slice())
    }

    /// Identifiers listed under `<activeMods>`, in file order
    ///
    /// Empty `<li/>` entries are skipped. Entries are trimmed, so surrounding whitespace in the file
    /// is normalized away on the next write
    pub fn active_mods(&self) -> Vec<String> {
        let Some(active) = self.root.get_child(ACTIVE_MODS) else {
            return vec![];
        };

        active
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(|e| e.name == LIST_ITEM)
            .filter_map(|e| e.get_text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Whether the list already starts with `required`, in order
    pub fn has_prefix(&self, required: &[impl AsRef<str>]) -> bool {
        let current = self.active_mods();
        current.len() >= required.len()
            && current
                .iter()
                .zip(required)
                .all(|(c, r)| c == r.as_ref())
    }

    /// Rebuilds `<activeMods>` with `required` first, followed by every previous entry not in `required`
    ///
    /// Creates the element if the document doesn't have one
    pub fn set_required_first(&mut self, required: &[impl AsRef<str>]) {
        let previous = self.active_mods();
        let ordered = required
            .iter()
            .map(|r| r.as_ref().to_string())
            .chain(
                previous
                    .into_iter()
                    .filter(|p| !required.iter().any(|r| r.as_ref() == p)),
            );

        if self.root.get_child(ACTIVE_MODS).is_none() {
            self.root
                .children
                .push(XMLNode::Element(Element::new(ACTIVE_MODS)));
        }

        if let Some(active) = self.root.get_mut_child(ACTIVE_MODS) {
            active.children.clear();
            for id in ordered {
                let mut li = Element::new(LIST_ITEM);
                li.children.push(XMLNode::Text(id));
                active.children.push(XMLNode::Element(li));
            }
        }
    }

    /// Serializes the document with an XML declaration
    pub fn write(&self, writer: impl std::io::Write) -> Result<(), InstallerError> {
        let config = EmitterConfig::new()
            .perform_indent(true)
            .write_document_declaration(true);
        self.root.write_with_config(writer, config)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), InstallerError> {
        let mut buf = vec![];
        self.write(&mut buf)?;
        std::fs::write(path.as_ref(), buf)?;
        Ok(())
    }
}
