//! `codepad` binary: serves the playground backend or checks its configuration

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use codepad_server::{logging, routes, AppState, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Path to codepad.toml")
}

fn load_config(args: &ArgMatches) -> anyhow::Result<ServerConfig> {
    let path = args.get_one::<PathBuf>("config");
    ServerConfig::load(path.map(PathBuf::as_path)).context("failed to load configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Command::new("codepad")
        .version(codepad_server::VERSION)
        .about("Code playground backend")
        .arg_required_else_help(false)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP server")
                .arg(config_arg())
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_parser(value_parser!(u16))
                        .help("Override the configured listen port"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load and print the effective configuration")
                .arg(config_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("check-config", args)) => {
            let config = load_config(args)?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            } else {
                println!("{}", config.to_redacted_toml()?);
            }
            println!("Configuration OK");
            Ok(())
        }
        Some(("serve", args)) => {
            let mut config = load_config(args)?;
            if let Some(port) = args.get_one::<u16>("port") {
                config = config.with_port(*port);
            }
            serve(config).await
        }
        _ => serve(ServerConfig::load(None)?).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    logging::init(&config.logging)?;

    let users = config.seed_users()?;
    let addr = config.listen_addr()?;
    tracing::info!(
        %addr,
        seeded_users = users.len(),
        free_languages = ?config.entitlement.free_languages,
        assistant_enabled = config.assistant.api_key().is_some(),
        "starting codepad server"
    );
    if config.assistant.api_key().is_none() {
        tracing::warn!("no LLM API key configured; /api/chat will return errors");
    }

    let state = Arc::new(AppState::from_config(&config, users)?);
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %bound, "listening");
    server.await;
    tracing::info!("shut down");
    Ok(())
}
