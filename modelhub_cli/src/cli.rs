use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "modelhub", version, about = "Read a model catalog from a GitHub repository")]
pub struct Cli {
    /// GitHub bearer token. Empty means anonymous (public repositories only).
    #[arg(long, env = "MODELHUB_GITHUB_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct RepoArgs {
    /// Repository owner (user or organization).
    #[arg(long)]
    pub owner: String,

    /// Repository name.
    #[arg(long)]
    pub repo: String,

    /// Branch, tag or commit to read from.
    #[arg(long, default_value = "main")]
    pub branch: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the normalized catalog as JSON.
    Models {
        #[command(flatten)]
        repo: RepoArgs,

        /// Catalog file path (`.yaml`/`.yml` parse as YAML, anything else as JSON).
        #[arg(long, default_value = "models.yaml")]
        config_path: String,

        /// Print a single model by id instead of the whole catalog.
        #[arg(long)]
        id: Option<String>,
    },

    /// Print a raw file from the repository (model card, script, ...).
    File {
        #[command(flatten)]
        repo: RepoArgs,

        /// Path inside the repository.
        path: String,
    },

    /// Probe the catalog and print the model count.
    Check {
        #[command(flatten)]
        repo: RepoArgs,

        #[arg(long, default_value = "models.yaml")]
        config_path: String,
    },
}
