use colored::*;
use std::fmt;

use crate::api::ApiError;

#[derive(Debug)]
pub enum TissueError {
    // Configuration errors
    ConfigInvalid(String),
    MissingToken,

    // Repository errors
    InvalidRepository(String),
    RepositoryNotDetected,
    RepositoryNotFound(String),
    GitHubAuthFailed,

    // Batch errors
    NotConnected,
    RecordsInvalid(String),

    // Network / API errors
    NetworkError(String),
    Api(ApiError),

    // Generic error
    Other(String),
}

impl fmt::Display for TissueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Configuration errors
            TissueError::ConfigInvalid(msg) => {
                write!(f, "{}\n", "Invalid configuration".red().bold())?;
                write!(f, "   {}\n\n", msg.dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Check your config file: ~/.tissue/config.toml\n")?;
                write!(f, "   2. Or reinitialize: {}", "tissue init".green())
            }
            TissueError::MissingToken => {
                write!(f, "{}\n", "No GitHub token configured".red().bold())?;
                write!(f, "   {}\n\n", "A personal access token with 'repo' and 'project' scopes is required".dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Run: {}\n", "tissue init".green())?;
                write!(f, "   2. Or export {}", "GITHUB_TOKEN".green())
            }

            // Repository errors
            TissueError::InvalidRepository(repo) => {
                write!(f, "{}\n", format!("Invalid repository '{}'", repo).red().bold())?;
                write!(f, "   {}", "Repositories must be given as owner/repo".dimmed())
            }
            TissueError::RepositoryNotDetected => {
                write!(f, "{}\n", "Could not determine the target repository".red().bold())?;
                write!(f, "   {}\n\n", "No --repo given, no default configured, and no GitHub 'origin' remote found".dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Pass it explicitly: {}\n", "tissue create issues.json --repo owner/repo".green())?;
                write!(f, "   2. Or set a default: {}", "tissue config set defaults.repo owner/repo".green())
            }
            TissueError::RepositoryNotFound(repo) => {
                write!(f, "{}\n", format!("Repository '{}' not found", repo).red().bold())?;
                write!(f, "   {}\n\n", "The repository doesn't exist or your token has no access to it".dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Check the owner/repo spelling\n")?;
                write!(f, "   2. Verify the token's repository access")
            }
            TissueError::GitHubAuthFailed => {
                write!(f, "{}\n", "GitHub authentication failed".red().bold())?;
                write!(f, "   {}\n\n", "Your GitHub token is invalid or expired".dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Generate new token: Settings > Developer settings > Personal access tokens\n")?;
                write!(f, "   2. Required scopes: repo, project\n")?;
                write!(f, "   3. Update config: {}", "tissue config set github.token <token>".green())
            }

            // Batch errors
            TissueError::NotConnected => {
                write!(f, "{}\n", "Not connected to GitHub".red().bold())?;
                write!(f, "   {}", "Connect to the repository before creating issues".dimmed())
            }
            TissueError::RecordsInvalid(msg) => {
                write!(f, "{}\n", "Invalid issue records".red().bold())?;
                write!(f, "   {}", msg.dimmed())
            }

            // Network errors
            TissueError::NetworkError(msg) => {
                write!(f, "{}\n", "Network error".red().bold())?;
                write!(f, "   {}\n\n", msg.dimmed())?;
                write!(f, "   To fix:\n")?;
                write!(f, "   1. Check your internet connection\n")?;
                write!(f, "   2. Verify you can reach the GitHub API\n")?;
                write!(f, "   3. Try again in a moment")
            }
            TissueError::Api(err) => {
                write!(f, "{}\n", "GitHub API error".red().bold())?;
                write!(f, "   {}", err.to_string().dimmed())
            }

            // Generic
            TissueError::Other(msg) => {
                write!(f, "{}\n", "Error".red().bold())?;
                write!(f, "   {}", msg.dimmed())
            }
        }
    }
}

impl std::error::Error for TissueError {}

impl From<ApiError> for TissueError {
    fn from(err: ApiError) -> Self {
        match err.status {
            Some(401) => TissueError::GitHubAuthFailed,
            _ => TissueError::Api(err),
        }
    }
}

impl From<reqwest::Error> for TissueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            TissueError::NetworkError(err.to_string())
        } else if let Some(status) = err.status() {
            if status == 401 || status == 403 {
                TissueError::GitHubAuthFailed
            } else {
                TissueError::Other(err.to_string())
            }
        } else {
            TissueError::Other(err.to_string())
        }
    }
}

impl From<config::ConfigError> for TissueError {
    fn from(err: config::ConfigError) -> Self {
        TissueError::ConfigInvalid(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TissueError>;
