use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use dskit::scaffold::DEFAULT_PROJECT_NAME;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "dskit", version, about = "Data-science project scaffolding and file helpers")]
pub struct Cli {
    /// Run as if started in this directory.
    #[arg(short = 'C', long = "chdir", global = true)]
    pub chdir: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the project skeleton in the current directory.
    Init(InitArgs),
    /// Print the manifest entries that `init` would create.
    Manifest(ManifestArgs),
    /// Load a YAML or JSON config file and print it as JSON.
    Show(ShowArgs),
    /// Create directories, succeeding if they already exist.
    Mkdir(MkdirArgs),
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Project name substituted into the manifest.
    #[arg(short = 'p', long = "project")]
    pub project: Option<String>,
    /// TOML manifest to use instead of the built-in data-science layout.
    #[arg(short = 'm', long = "manifest")]
    pub manifest: Option<PathBuf>,
}

impl ManifestArgs {
    pub fn project_name(&self) -> &str {
        self.project.as_deref().unwrap_or(DEFAULT_PROJECT_NAME)
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub file: PathBuf,
    /// Print only the value at this dotted key path, e.g. `model.params`.
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct MkdirArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Do not log each created directory.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}
