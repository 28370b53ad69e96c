use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

mod api;
mod batch;
mod config;
mod errors;
mod models;
mod report;

use crate::api::github::GitHubClient;
use crate::api::Tracker;
use crate::config::settings::Settings;
use crate::errors::TissueError;
use crate::models::project::ProjectBinding;

#[derive(Parser)]
#[command(name = "tissue")]
#[command(version)]
#[command(about = "Batch-create GitHub issues from structured records", long_about = None)]
struct Cli {
    /// Show project schema and extra detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create issues from a CSV, JSON or TOML records file
    Create {
        /// Records file (.csv, .json or .toml)
        file: PathBuf,

        /// Target repository (owner/repo); defaults to config, then the git origin
        #[arg(long)]
        repo: Option<String>,

        /// Projects board to add the issues to (exact title)
        #[arg(long)]
        project: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Open the repository's issues page when done
        #[arg(long)]
        open: bool,
    },

    /// List the project boards available to a repository
    Projects {
        #[arg(long)]
        repo: Option<String>,
    },

    /// Interactive first-time setup
    Init,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display current configuration (with masked secrets)
    Show,

    /// Set a specific configuration value
    Set {
        /// Configuration key (e.g., github.token, defaults.repo, batch.pacing_ms)
        key: String,
        /// New value
        value: String,
    },

    /// Validate configuration by connecting to GitHub
    Validate,

    /// Get the path to the config file
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    println!("{}", format!("tissue v{}", env!("CARGO_PKG_VERSION")).bright_cyan().bold());
    println!();

    let result = match cli.command {
        Commands::Create {
            file,
            repo,
            project,
            yes,
            open,
        } => handle_create(&file, repo.as_deref(), project.as_deref(), yes, open, cli.verbose).await,

        Commands::Projects { repo } => handle_projects(repo.as_deref(), cli.verbose).await,

        Commands::Init => handle_init(),

        Commands::Config { action } => handle_config(action).await,
    };

    if let Err(e) = result {
        eprintln!("\n{}", e);
        std::process::exit(1);
    }

    println!();
}

/// `--repo`, then `defaults.repo`, then the `origin` remote.
fn resolve_repository(explicit: Option<&str>, settings: &Settings) -> anyhow::Result<(String, String)> {
    if let Some(slug) = explicit.or(settings.defaults.repo.as_deref()) {
        return api::git::parse_repo_slug(slug)
            .ok_or_else(|| TissueError::InvalidRepository(slug.to_string()).into());
    }

    let git = api::git::GitClient::new().map_err(|_| TissueError::RepositoryNotDetected)?;
    git.github_repository(&api::github::web_host(&settings.github.api_url))
}

async fn connect(settings: &Settings, repo: Option<&str>) -> anyhow::Result<GitHubClient> {
    if settings.github.token.is_empty() {
        return Err(TissueError::MissingToken.into());
    }

    let (owner, name) = resolve_repository(repo, settings)?;

    println!("{}", "Connecting to GitHub...".dimmed());
    let mut client = GitHubClient::new(
        settings.github.api_url.clone(),
        owner,
        name,
        settings.github.token.clone(),
    );
    let login = client.connect().await?;

    println!("  {} {}", "Connected as:".bold(), login.bright_white());
    if let Some(full_name) = client.repository() {
        println!("  {} {}", "Repository:".bold(), full_name.bright_white());
    }
    println!();

    Ok(client)
}

async fn handle_create(
    file: &Path,
    repo: Option<&str>,
    project: Option<&str>,
    yes: bool,
    open_browser: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let settings = Settings::load()?;

    let records = models::record::load_records(file)?;
    println!(
        "{}",
        format!("Loaded {} issue records from {}", records.len(), file.display())
            .cyan()
            .bold()
    );

    if records.is_empty() {
        println!("{}", "  Nothing to create.".yellow());
        return Ok(());
    }

    if verbose {
        for record in &records {
            println!("  {} {}", "•".dimmed(), record.title);
        }
    }
    println!();

    let client = connect(&settings, repo).await?;

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Create {} issues?", records.len()))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
        println!();
    }

    let project = project.or(settings.defaults.project.as_deref());
    let orchestrator = batch::BatchOrchestrator::new(&client, settings.batch_options(verbose));
    let summary = orchestrator.run(&records, project).await?;

    report::print_summary(&summary);

    if open_browser {
        open::that(client.issues_web_url())?;
    }

    if summary.failed > 0 {
        anyhow::bail!("{} of {} issues failed", summary.failed, summary.total);
    }

    Ok(())
}

async fn handle_projects(repo: Option<&str>, verbose: bool) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let client = connect(&settings, repo).await?;

    let projects = client.list_projects().await.map_err(TissueError::from)?;
    if projects.is_empty() {
        println!("{}", "No project boards found for this repository.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} project boards:", projects.len()).cyan().bold());
    println!();

    for project in &projects {
        println!(
            "  {} {} {}",
            format!("#{}", project.number).dimmed(),
            project.title.bright_white(),
            project.url.dimmed()
        );

        if verbose {
            match client.project_fields(&project.id).await {
                Ok(fields) => report::print_project(&ProjectBinding::new(project.clone(), fields)),
                Err(e) => println!("{}", format!("    Could not load fields: {}", e).yellow()),
            }
            println!();
        }
    }

    Ok(())
}

fn handle_init() -> anyhow::Result<()> {
    use dialoguer::{Input, Password};

    println!("{}", "Setting up tissue...".cyan().bold());
    println!();
    println!("{}", "  Create a token at Settings > Developer settings > Personal access tokens".dimmed());
    println!("{}", "  Required scopes: repo, project".dimmed());
    println!();

    let mut settings = Settings::load_file().unwrap_or_default();

    let token = Password::new()
        .with_prompt("GitHub token")
        .allow_empty_password(!settings.github.token.is_empty())
        .interact()?;
    if !token.is_empty() {
        settings.github.token = token;
    }

    let api_url: String = Input::new()
        .with_prompt("GitHub API URL")
        .default(settings.github.api_url.clone())
        .interact_text()?;
    settings.github.api_url = api_url;

    let repo: String = Input::new()
        .with_prompt("Default repository (owner/repo, blank for none)")
        .default(settings.defaults.repo.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    if repo.is_empty() {
        settings.defaults.repo = None;
    } else if api::git::parse_repo_slug(&repo).is_none() {
        return Err(TissueError::InvalidRepository(repo).into());
    } else {
        settings.defaults.repo = Some(repo);
    }

    let project: String = Input::new()
        .with_prompt("Default project board (blank for none)")
        .default(settings.defaults.project.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    settings.defaults.project = if project.is_empty() { None } else { Some(project) };

    settings.save()?;

    println!();
    println!("{}", "✓ Configuration saved!".green().bold());
    println!("  {} {}", "Path:".bold(), Settings::config_path()?.display());

    Ok(())
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

async fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load()?;

            println!("{}", "[github]".bold());
            println!("  {} {}", "token:".dimmed(), mask(&settings.github.token).yellow());
            println!("  {} {}", "api_url:".dimmed(), settings.github.api_url.bright_white());

            println!();
            println!("{}", "[defaults]".bold());
            if let Some(repo) = &settings.defaults.repo {
                println!("  {} {}", "repo:".dimmed(), repo.bright_white());
            }
            if let Some(project) = &settings.defaults.project {
                println!("  {} {}", "project:".dimmed(), project.bright_white());
            }

            println!();
            println!("{}", "[batch]".bold());
            println!("  {} {}", "pacing_ms:".dimmed(), settings.batch.pacing_ms.to_string().bright_white());
            println!("  {} {}", "label_color:".dimmed(), settings.batch.label_color.bright_white());
            println!("  {} {}", "label_description:".dimmed(), settings.batch.label_description.bright_white());
            println!("  {} {}", "dedup_state:".dimmed(), settings.batch.dedup_state.as_str().bright_white());

            Ok(())
        }

        ConfigAction::Set { key, value } => {
            Settings::update_file(&Settings::config_path()?, &key, &value)?;

            let shown = if key == "github.token" { mask(&value) } else { value };
            println!("{}", format!("✓ Updated {} to: {}", key, shown).green().bold());
            println!();
            println!("{}", "Configuration saved successfully!".green());

            Ok(())
        }

        ConfigAction::Validate => {
            println!("{}", "Validating configuration...".cyan().bold());
            println!();

            let settings = Settings::load()?;

            print!("{}", "  Checking GitHub token... ".dimmed());
            std::io::Write::flush(&mut std::io::stdout())?;
            if settings.github.token.is_empty() {
                println!("{}", "✗".red().bold());
                return Err(TissueError::MissingToken.into());
            }
            println!("{}", "✓".green().bold());

            match connect(&settings, None).await {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", format!("  GitHub connection failed: {}", e).red());
                    return Err(anyhow::anyhow!("GitHub validation failed"));
                }
            }

            println!("{}", "✓ All validations passed!".green().bold());

            Ok(())
        }

        ConfigAction::Path => {
            println!("{}", Settings::config_path()?.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_secret() {
        assert_eq!(mask("ghp_abcdefghijklmnop"), "ghp_***mnop");
    }

    #[test]
    fn test_mask_short_secret() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn test_resolve_repository_prefers_explicit() {
        let mut settings = Settings::default();
        settings.defaults.repo = Some("acme/default".to_string());

        let (owner, repo) = resolve_repository(Some("acme/explicit"), &settings).unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "explicit");

        let (_, repo) = resolve_repository(None, &settings).unwrap();
        assert_eq!(repo, "default");
    }

    #[test]
    fn test_resolve_repository_rejects_bad_slug() {
        let settings = Settings::default();
        let err = resolve_repository(Some("just-a-name"), &settings).unwrap_err();
        assert!(err.to_string().contains("Invalid repository 'just-a-name'"));
    }

    #[test]
    fn test_cli_parses_create() {
        let cli = Cli::try_parse_from([
            "tissue", "-v", "create", "issues.json", "--repo", "acme/widgets", "--project", "Roadmap", "--yes",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Create { file, repo, project, yes, open } => {
                assert_eq!(file, PathBuf::from("issues.json"));
                assert_eq!(repo.as_deref(), Some("acme/widgets"));
                assert_eq!(project.as_deref(), Some("Roadmap"));
                assert!(yes);
                assert!(!open);
            }
            _ => panic!("expected create command"),
        }
    }
}
