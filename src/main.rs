use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod clipboard;
mod config;
mod detector;
mod error;
mod extractor;
mod fetcher;
mod playlist;
mod scorer;
mod tables;
mod ui;
mod utils;

use config::Settings;
use detector::StreamDetector;
use utils::{is_valid_stream_url, normalize_target_url};

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "dowser", version, about = "Find and report audio streams from a given URL")]
struct Cli {
    /// URL to analyze for audio streams (prompted for when omitted)
    url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List all found streams instead of just the best one
    #[arg(long)]
    list_all: bool,

    /// Do not copy the best stream URL to clipboard
    #[arg(long)]
    no_clipboard: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let url = match target_url(&cli) {
        Ok(url) => url,
        Err(e) => return report_failure(&cli, e),
    };

    tokio::select! {
        result = run(&cli, &url) => match result {
            Ok(code) => code,
            Err(e) => report_failure(&cli, e),
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\nOperation cancelled by user");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "dowser=debug" } else { "dowser=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report_failure(cli: &Cli, e: anyhow::Error) -> ExitCode {
    error!("Error: {:#}", e);
    if cli.verbose {
        eprintln!("{:?}", e);
    }
    ExitCode::FAILURE
}

fn target_url(cli: &Cli) -> Result<String> {
    let raw = match &cli.url {
        Some(url) => url.clone(),
        None => {
            // Offer whatever URL is already on the clipboard
            let suggestion = clipboard::get_from_clipboard()
                .ok()
                .map(|text| text.trim().to_string())
                .filter(|text| is_valid_stream_url(text));
            ui::prompt_input("URL to analyze", suggestion)?
        }
    };

    Ok(normalize_target_url(&raw)?)
}

async fn run(cli: &Cli, url: &str) -> Result<ExitCode> {
    let settings = Settings::load();
    let detector = StreamDetector::new(&settings).context("Failed to initialize stream detector")?;

    let streams = if cli.list_all {
        detector.find_audio_streams(url).await
    } else {
        detector.get_best_stream(url).await.into_iter().collect()
    };

    let Some(best) = streams.first() else {
        println!("{}", ui::render_no_streams(cli.json, cli.list_all));
        return Ok(ExitCode::FAILURE);
    };

    if cli.json {
        if cli.list_all {
            println!("{}", ui::render_json(&streams)?);
        } else {
            println!("{}", ui::render_json(best)?);
        }
    } else if cli.list_all {
        print!("{}", ui::render_list(&streams));
    } else {
        println!("{}", ui::render_best(best));
    }

    if !cli.no_clipboard {
        let copied = clipboard::copy_to_clipboard(&best.url).is_ok();
        // Keep stdout parseable in JSON mode
        if !cli.json {
            match (copied, cli.list_all) {
                (true, true) => println!("Best stream URL copied to clipboard: {}", best.url),
                (true, false) => println!("\nURL copied to clipboard!"),
                (false, true) => println!("Failed to copy to clipboard"),
                (false, false) => println!("\nFailed to copy URL to clipboard"),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
