mod cli;

use clap::Parser;
use cli::{Cli, Commands, RepoArgs};
use modelhub_core::models::DEFAULT_CONFIG_PATH;
use modelhub_core::{Binding, CatalogConfig, CatalogService, ConnectRequest};
use std::io::Write;

fn connect_request(repo: RepoArgs, config_path: String) -> ConnectRequest {
    ConnectRequest {
        owner: repo.owner,
        repo: repo.repo,
        branch: Some(repo.branch),
        config_path: Some(config_path),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = CatalogConfig::from_env()?;
    modelhub_core::o11y::init_global(cfg.log_format)?;
    let cli = Cli::parse();
    let svc = CatalogService::new(&cfg)?;
    let token = cli.token;

    match cli.command {
        Commands::Models {
            repo,
            config_path,
            id,
        } => {
            // The connect probe primes the cache, so this is one remote read.
            svc.connect(&token, connect_request(repo, config_path))
                .await?;
            let out = match id {
                Some(id) => match svc.get_model(&token, &id).await? {
                    Some(model) => serde_json::to_string_pretty(&model)?,
                    None => anyhow::bail!("model not found: {id}"),
                },
                None => serde_json::to_string_pretty(&svc.fetch_models(&token, false).await?)?,
            };
            println!("{out}");
        }
        Commands::File { repo, path } => {
            svc.bindings()
                .set(Binding::new(
                    repo.owner,
                    repo.repo,
                    repo.branch,
                    DEFAULT_CONFIG_PATH,
                ))
                .await;
            let content = svc.fetch_raw(&token, &path).await?;
            std::io::stdout().write_all(&content)?;
        }
        Commands::Check { repo, config_path } => {
            let count = svc
                .connect(&token, connect_request(repo, config_path))
                .await?;
            tracing::info!(count, "connection ok");
            println!("{}", serde_json::json!({"status": "connected", "modelCount": count}));
        }
    }

    Ok(())
}
