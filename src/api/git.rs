use anyhow::{Context, Result};
use git2::Repository;

use crate::errors::TissueError;

pub struct GitClient {
    repo: Repository,
}

impl GitClient {
    pub fn new() -> Result<Self> {
        let repo = Repository::open_from_env()
            .context("Not in a git repository. Pass --repo owner/repo instead.")?;

        Ok(Self { repo })
    }

    pub fn remote_url(&self, name: &str) -> Result<String> {
        let remote = self
            .repo
            .find_remote(name)
            .context(format!("No '{}' remote configured", name))?;

        let url = remote
            .url()
            .context("Remote URL contains invalid UTF-8")?
            .to_string();

        Ok(url)
    }

    /// `owner/repo` of the `origin` remote, if it points at `host`.
    pub fn github_repository(&self, host: &str) -> Result<(String, String)> {
        let url = self.remote_url("origin")?;
        parse_github_remote(&url, host).ok_or_else(|| TissueError::RepositoryNotDetected.into())
    }
}

/// Split `owner/repo`.
pub fn parse_repo_slug(slug: &str) -> Option<(String, String)> {
    let slug = slug.trim().trim_end_matches('/');
    let (owner, repo) = slug.split_once('/')?;
    let repo = repo.trim_end_matches(".git");

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

/// Accepts the usual remote forms:
/// `git@github.com:owner/repo.git`, `https://github.com/owner/repo`,
/// `ssh://git@github.com/owner/repo.git`.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let url = url.trim();

    let path = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else {
        let without_scheme = url.split_once("://")?.1;
        without_scheme.split_once('/')?.1
    };

    parse_repo_slug(path)
}

/// Host part of a remote URL, without user or port.
pub fn remote_host(url: &str) -> Option<&str> {
    let url = url.trim();

    let authority = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':')?.0
    } else {
        url.split_once("://")?.1.split('/').next()?
    };

    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

/// `owner/repo` from a remote on `host` (case-insensitive); other hosts are ignored.
pub fn parse_github_remote(url: &str, host: &str) -> Option<(String, String)> {
    if !remote_host(url)?.eq_ignore_ascii_case(host) {
        return None;
    }
    parse_remote_url(url)
}
