use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use nestmatch_core::{load_config, TraitInferenceEngine};
use nestmatch_schema::Identity;
use nestmatch_server::state::AppState;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod repl;

#[derive(Parser)]
#[command(name = "nestmatch", version, about = "nestmatch roommate matching service")]
struct Cli {
    #[arg(
        long,
        default_value = ".",
        help = "Project root directory (contains config/ and logs/)"
    )]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP API server")]
    Serve {
        #[arg(long, help = "Listen address, overrides server.addr")]
        addr: Option<String>,
    },
    #[command(about = "Run the lifestyle survey in the terminal")]
    Survey {
        #[arg(long, help = "User id sent with the submission")]
        uid: String,
        #[arg(long, help = "Email sent with the submission")]
        email: String,
        #[arg(long, help = "Print inferred traits after completion")]
        traits: bool,
    },
    #[command(about = "Infer lifestyle traits from a sleep schedule")]
    Enrich {
        #[arg(long, help = "Sleep answer, e.g. Early, On-time, Night owl")]
        sleep: String,
        #[arg(long, help = "Fixed RNG seed for reproducible output")]
        seed: Option<u64>,
        #[arg(long, help = "Optional profile name to pass through")]
        name: Option<String>,
    },
    #[command(about = "Validate config files")]
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "nestmatch.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Serve { addr } => {
            let config = load_config(&cli.root.join("config"))?;
            let addr = addr.unwrap_or_else(|| config.main.server.addr.clone());
            tracing::info!(
                app = %config.main.app.name,
                env = %config.main.app.env,
                questions = config.script.len(),
                "starting server"
            );
            nestmatch_server::serve(AppState::from_config(&config), &addr).await?;
        }
        Commands::Survey { uid, email, traits } => {
            repl::run_survey(&cli.root, Identity { uid, email }, traits).await?;
        }
        Commands::Enrich { sleep, seed, name } => {
            let mut profile = serde_json::json!({ "sleep": sleep });
            if let Some(name) = name {
                profile["name"] = name.into();
            }
            let enriched = TraitInferenceEngine::from_seed_option(seed).enrich_profile(profile)?;
            println!("{}", serde_json::to_string_pretty(&enriched)?);
        }
        Commands::Validate => {
            let config = load_config(&cli.root.join("config"))?;
            let submission = if config.main.submission.enabled {
                config.main.submission.base_url.as_str()
            } else {
                "disabled"
            };
            println!(
                "Config valid. {} questions, server {}, submission {}.",
                config.script.len(),
                config.main.server.addr,
                submission
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_subcommand() {
        let cli = Cli::parse_from(["nestmatch", "validate"]);
        assert!(matches!(cli.command.unwrap(), Commands::Validate));
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn parses_serve_addr_override() {
        let cli =
            Cli::try_parse_from(["nestmatch", "--root", "/srv/nm", "serve", "--addr", "0.0.0.0:9000"])
                .unwrap();
        assert_eq!(cli.root, PathBuf::from("/srv/nm"));
        assert!(matches!(
            cli.command.unwrap(),
            Commands::Serve { addr: Some(addr) } if addr == "0.0.0.0:9000"
        ));
    }

    #[test]
    fn parses_enrich_with_seed() {
        let cli = Cli::try_parse_from(["nestmatch", "enrich", "--sleep", "Night owl", "--seed", "7"])
            .unwrap();
        assert!(matches!(
            cli.command.unwrap(),
            Commands::Enrich { sleep, seed: Some(7), name: None } if sleep == "Night owl"
        ));
    }

    #[test]
    fn survey_requires_identity() {
        assert!(Cli::try_parse_from(["nestmatch", "survey", "--uid", "u1"]).is_err());
        let cli = Cli::try_parse_from([
            "nestmatch", "survey", "--uid", "u1", "--email", "a@b.c", "--traits",
        ])
        .unwrap();
        assert!(matches!(
            cli.command.unwrap(),
            Commands::Survey { traits: true, .. }
        ));
    }
}
