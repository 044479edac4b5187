use std::{path::Path, process::exit, time::Duration};

use anyhow::Result;
use client::{config::ClientConfig, game, view, StatsClient};
use pizzeria::{stats::StatsReport, GameMode};
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "./config/game.toml";
const POLL_EVERY: Duration = Duration::from_secs(5);

fn usage() -> ! {
    println!(
        "Please provide a command.
  play <multitask|singletask|wip>   play one session in the terminal
  stats [--watch]                   show the gameplay overview
  analysis                          show the WIP analysis
Settings are read from {}.",
        CONFIG_FILE
    );
    exit(1);
}

fn stats_client(config: &ClientConfig) -> StatsClient {
    match &config.api_url {
        Some(url) => StatsClient::new(url),
        None => {
            println!("api_url is missing in {}.", CONFIG_FILE);
            exit(1);
        }
    }
}

async fn show_once(client: &StatsClient, render: fn(&StatsReport) -> String) -> Result<()> {
    let report = client.fetch_stats().await?;
    println!("{}", render(&report));
    Ok(())
}

// Errors only show up until the first good answer; after that the last
// good data stays on screen until a fresh one arrives.
async fn watch(client: &StatsClient) {
    let mut ticker = tokio::time::interval(POLL_EVERY);
    let mut last_good: Option<StatsReport> = None;
    loop {
        ticker.tick().await;
        match client.fetch_stats().await {
            Ok(report) => {
                if last_good.as_ref() != Some(&report) {
                    println!("{}\n", view::render_stats(&report));
                }
                last_good = Some(report);
            }
            Err(e) if last_good.is_some() => debug!("Polling failed, keeping old stats: {}", e),
            Err(e) => println!("Error loading statistics: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("client=info,pizzeria=info")
        .init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }
    info!("Loading config file...");
    // A missing file means offline play; a broken one is an error
    let config = if Path::new(CONFIG_FILE).exists() {
        ClientConfig::from_file(CONFIG_FILE)?
    } else {
        warn!("No {} found. Playing offline with default settings.", CONFIG_FILE);
        ClientConfig::default()
    };

    match (args[1].as_str(), args.get(2).map(String::as_str)) {
        ("play", Some(mode)) => {
            let mode: GameMode = match mode.parse() {
                Ok(mode) => mode,
                Err(e) => {
                    println!("{}", e);
                    usage();
                }
            };
            let client = config.api_url.as_deref().map(StatsClient::new);
            game::play(mode, config.game, client).await?;
        }
        ("stats", Some("--watch")) => watch(&stats_client(&config)).await,
        ("stats", None) => {
            if let Err(e) = show_once(&stats_client(&config), view::render_stats).await {
                println!("Error loading statistics: {}. Run it again to retry.", e);
            }
        }
        ("analysis", None) => {
            if let Err(e) = show_once(&stats_client(&config), view::render_analysis).await {
                println!("Error loading WIP analysis: {}. Run it again to retry.", e);
            }
        }
        _ => usage(),
    }
    Ok(())
}
