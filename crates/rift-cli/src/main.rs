use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rift_config::{AppConfig, ConfigLoader};
use rift_db::TimelineStore;
use rift_gateway::{GatewayServer, build_provider, build_state, open_repository};
use rift_security::RedactingWriter;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rift-copilot", version, about = "Match analysis copilot backend")]
struct Cli {
    /// Path to a config file (defaults to ~/.rift-copilot/config.yml)
    #[arg(long, short, global = true, env = "RIFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway (default)
    Serve {
        /// Override gateway.port
        #[arg(long)]
        port: Option<u16>,
        /// Start without the timeline database and the heatmap tool
        #[arg(long)]
        no_db: bool,
    },
    /// Print the tool catalog offered to the model
    Tools {
        /// Include tools that need the timeline database
        #[arg(long)]
        with_db: bool,
    },
    /// Import a match and its timeline into the local database
    Import {
        /// Player the match is imported for
        #[arg(long)]
        puuid: String,
        /// Match-v5 JSON document
        #[arg(long)]
        match_file: PathBuf,
        /// Timeline-v5 JSON document
        #[arg(long)]
        timeline_file: PathBuf,
    },
    /// Validate and print the effective configuration
    CheckConfig {
        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        eprintln!("rift-copilot: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load config")?;
    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        no_db: false,
    }) {
        Commands::Serve { port, no_db } => serve(config, port, no_db).await,
        Commands::Tools { with_db } => print_tools(&config, with_db),
        Commands::Import {
            puuid,
            match_file,
            timeline_file,
        } => import(&config, &puuid, &match_file, &timeline_file),
        Commands::CheckConfig { json } => check_config(config, json),
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RedactingWriter::stderr());
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(mut config: AppConfig, port: Option<u16>, no_db: bool) -> Result<()> {
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let provider = build_provider(&config).context("failed to build model provider")?;
    let repository = if no_db {
        warn!("timeline database disabled, filter_heatmap will not be offered");
        None
    } else {
        Some(open_repository(&config).context("failed to open timeline database")?)
    };

    let state = build_state(config, provider, repository);
    info!(agent = %state.config.agent.name, "starting gateway");
    GatewayServer::new(Arc::new(state))
        .run()
        .await
        .context("gateway exited with an error")
}

fn print_tools(config: &AppConfig, with_db: bool) -> Result<()> {
    let repository = if with_db {
        Some(open_repository(config).context("failed to open timeline database")?)
    } else {
        None
    };
    let registry = rift_agents::match_tools(repository);
    let definitions = serde_json::to_string_pretty(&registry.definitions())?;
    println!("{definitions}");
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn import(config: &AppConfig, puuid: &str, match_file: &Path, timeline_file: &Path) -> Result<()> {
    let match_doc = read_json(match_file)?;
    let timeline_doc = read_json(timeline_file)?;

    let path = config.database.resolved_path();
    let store = TimelineStore::open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let summary = store
        .import_match(puuid, &match_doc, &timeline_doc)
        .context("import failed")?;

    let verb = if summary.replaced { "Replaced" } else { "Imported" };
    println!(
        "{verb} {} with {} positioned events ({} matches stored for this player)",
        summary.match_id,
        summary.events_imported,
        store.match_count(puuid)?
    );
    Ok(())
}

/// Hide credentials before the config is echoed back.
fn masked(mut config: AppConfig) -> AppConfig {
    if let Some(key) = config.llm.api_key.as_mut() {
        *key = "********".to_string();
    }
    config
}

fn check_config(config: AppConfig, json: bool) -> Result<()> {
    let config = masked(config);
    let rendered = if json {
        serde_json::to_string_pretty(&config)?
    } else {
        serde_yaml::to_string(&config)?
    };
    println!("{rendered}");
    eprintln!("config OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "rift-copilot",
            "--config",
            "/tmp/rift.yml",
            "import",
            "--puuid",
            "abc",
            "--match-file",
            "m.json",
            "--timeline-file",
            "t.json",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/rift.yml")));
        match cli.command {
            Some(Commands::Import { puuid, .. }) => assert_eq!(puuid, "abc"),
            _ => panic!("expected import"),
        }

        let cli = Cli::try_parse_from(["rift-copilot", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Serve {
                port: Some(9000),
                no_db: false
            })
        ));
    }

    #[test]
    fn masked_hides_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-ant-secret-value".into());
        let rendered = serde_yaml::to_string(&masked(config)).unwrap();
        assert!(!rendered.contains("sk-ant-secret-value"));
        assert!(rendered.contains("********"));
    }

    #[test]
    fn read_json_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_json(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
        assert!(read_json(&dir.path().join("missing.json")).is_err());
    }
}
