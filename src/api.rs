use tracing::debug;

use crate::{
    error::InstallerError,
    model::{Channel, GithubRelease, RepoId, ResolvedAsset},
};

pub const GITHUB_API: &str = "https://api.github.com";
pub const USER_AGENT: &str = concat!("rimworld-access-installer/", env!("CARGO_PKG_VERSION"));

/// Something that can answer GitHub release queries
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource {
    /// The release GitHub marks as latest (drafts and prereleases excluded)
    fn latest_release(&self, repo: &RepoId) -> Result<GithubRelease, InstallerError>;
    /// All releases of a repository, newest first
    fn list_releases(&self, repo: &RepoId) -> Result<Vec<GithubRelease>, InstallerError>;
}

/// Blocking client for the GitHub releases API
#[derive(Debug, Clone)]
pub struct GithubApi {
    base_url: String,
    token: Option<String>,
}

impl Default for GithubApi {
    fn default() -> Self {
        Self::new(GITHUB_API, None)
    }
}

impl GithubApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn get(&self, url: &str) -> Result<String, InstallerError> {
        debug!("GET {}", url);
        let res = github_request(url, self.token.as_deref())
            .set("Accept", "application/vnd.github+json")
            .call()?;
        Ok(res.into_string()?)
    }
}

/// Builds a GET request carrying the headers GitHub expects
pub(crate) fn github_request(url: &str, token: Option<&str>) -> ureq::Request {
    let req = ureq::get(url).set("User-Agent", USER_AGENT);
    match token {
        Some(token) => req.set("Authorization", &format!("Bearer {token}")),
        None => req,
    }
}

impl ReleaseSource for GithubApi {
    fn latest_release(&self, repo: &RepoId) -> Result<GithubRelease, InstallerError> {
        let raw = self.get(&format!("{}/repos/{}/releases/latest", self.base_url, repo))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn list_releases(&self, repo: &RepoId) -> Result<Vec<GithubRelease>, InstallerError> {
        let raw = self.get(&format!("{}/repos/{}/releases", self.base_url, repo))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Picks the first release in `releases` whose tag belongs to `channel`
///
/// `releases` is expected in API order, so the first match is the newest
pub fn select_release(releases: &[GithubRelease], channel: Channel) -> Option<&GithubRelease> {
    releases.iter().find(|r| channel.matches_tag(&r.tag_name))
}

/// Finds the release for `channel` and returns its zip asset
///
/// # Errors
/// * HTTP or transport errors from the source
/// * `NoReleases` if a listing is empty
/// * `NoMatchingRelease` if no tag fits the channel
/// * `NoZipAsset` if the chosen release has no `.zip` asset
pub fn resolve_download(
    source: &impl ReleaseSource,
    repo: &RepoId,
    channel: Channel,
) -> Result<ResolvedAsset, InstallerError> {
    let release = match channel {
        Channel::Stable => source.latest_release(repo)?,
        Channel::Beta | Channel::Dev => {
            let releases = source.list_releases(repo)?;
            if releases.is_empty() {
                return Err(InstallerError::NoReleases(repo.to_string()));
            }
            select_release(&releases, channel)
                .cloned()
                .ok_or_else(|| InstallerError::NoMatchingRelease {
                    repo: repo.to_string(),
                    channel,
                })?
        }
    };

    let asset = release
        .zip_asset()
        .ok_or_else(|| InstallerError::NoZipAsset {
            repo: repo.to_string(),
            tag: release.tag_name.clone(),
        })?;

    debug!(
        "Found release {} of {} with asset {}",
        release.tag_name, repo, asset.name
    );

    Ok(ResolvedAsset {
        tag: release.tag_name.clone(),
        release_name: release.name.clone().unwrap_or_default(),
        file_name: asset.name.clone(),
        url: asset.browser_download_url.clone(),
        size: asset.size,
    })
}

#[cfg(test)]
mod test {
    use mockall::predicate::eq;

    use super::*;
    use crate::model::GithubAsset;

    fn release(tag: &str) -> GithubRelease {
        GithubRelease {
            tag_name: tag.into(),
            name: Some(format!("Release {tag}")),
            assets: vec![GithubAsset {
                name: format!("Mod-{tag}.zip"),
                browser_download_url: format!("https://example.invalid/{tag}.zip"),
                size: 420,
            }],
        }
    }

    fn repo() -> RepoId {
        "owner/repo".parse().unwrap()
    }

    #[test]
    fn stable_uses_latest_endpoint() {
        let mut source = MockReleaseSource::new();
        source
            .expect_latest_release()
            .with(eq(repo()))
            .times(1)
            .returning(|_| Ok(release("v1.0")));
        source.expect_list_releases().never();

        let asset = resolve_download(&source, &repo(), Channel::Stable).unwrap();
        assert_eq!(asset.tag, "v1.0");
        assert_eq!(asset.url, "https://example.invalid/v1.0.zip");
        assert_eq!(asset.release_name, "Release v1.0");
    }

    #[test]
    fn beta_picks_first_beta_tag() {
        let mut source = MockReleaseSource::new();
        source.expect_latest_release().never();
        source
            .expect_list_releases()
            .returning(|_| Ok(vec![release("v2.0-beta"), release("v1.0")]));

        let asset = resolve_download(&source, &repo(), Channel::Beta).unwrap();
        assert_eq!(asset.tag, "v2.0-beta");
    }

    #[test]
    fn dev_without_dev_tag_fails() {
        let mut source = MockReleaseSource::new();
        source
            .expect_list_releases()
            .returning(|_| Ok(vec![release("v2.0-beta"), release("v1.0")]));

        let res = resolve_download(&source, &repo(), Channel::Dev);
        assert!(matches!(
            res,
            Err(InstallerError::NoMatchingRelease {
                channel: Channel::Dev,
                ..
            })
        ));
    }

    #[test]
    fn dev_tag_is_case_insensitive() {
        let mut source = MockReleaseSource::new();
        source
            .expect_list_releases()
            .returning(|_| Ok(vec![release("v1.1"), release("DEV")]));

        let asset = resolve_download(&source, &repo(), Channel::Dev).unwrap();
        assert_eq!(asset.tag, "DEV");
    }

    #[test]
    fn empty_listing_is_reported() {
        let mut source = MockReleaseSource::new();
        source.expect_list_releases().returning(|_| Ok(vec![]));

        let res = resolve_download(&source, &repo(), Channel::Beta);
        assert!(matches!(res, Err(InstallerError::NoReleases(r)) if r == "owner/repo"));
    }

    #[test]
    fn release_without_zip_fails() {
        let mut source = MockReleaseSource::new();
        source.expect_latest_release().returning(|_| {
            let mut r = release("v1.0");
            r.assets[0].name = "Mod.tar.gz".into();
            Ok(r)
        });

        let res = resolve_download(&source, &repo(), Channel::Stable);
        assert!(matches!(res, Err(InstallerError::NoZipAsset { tag, .. }) if tag == "v1.0"));
    }

    #[test]
    fn source_errors_propagate() {
        let mut source = MockReleaseSource::new();
        source
            .expect_latest_release()
            .returning(|_| Err(InstallerError::MiscError("offline".into())));

        let res = resolve_download(&source, &repo(), Channel::Stable);
        assert!(matches!(res, Err(InstallerError::MiscError(m)) if m == "offline"));
    }

    #[test]
    fn parse_github_listing() {
        let raw = r#"[
            {"tag_name": "dev", "name": "Dev build", "prerelease": true, "draft": false,
             "assets": [{"name": "rimworld_access.zip", "browser_download_url": "https://example.invalid/dev.zip", "size": 10, "id": 1}]},
            {"tag_name": "v1.0", "name": null, "assets": []}
        ]"#;
        let parsed: Vec<GithubRelease> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(select_release(&parsed, Channel::Dev).unwrap().tag_name, "dev");
        assert!(parsed[1].zip_asset().is_none());
    }

    #[test]
    fn api_base_url_is_normalized() {
        let api = GithubApi::new("http://localhost:8080/", Some("  ".into()));
        assert_eq!(api.base_url, "http://localhost:8080");
        assert!(api.token.is_none());
    }
}
