use anyhow::{anyhow, Context, Result};
use chrono::Local;
use log::{error, info};
use std::io::{self, BufRead, Write};
use yt_collector::config::{init_logger, load_environment, log_file_from_env, Config};
use yt_collector::export::final_output_path;
use yt_collector::transcript::YtTranscriptSource;
use yt_collector::youtube::YouTubeClient;
use yt_collector::{Collector, CollectorSettings};

fn read_search_term() -> Result<String> {
    print!("Enter the search term: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read search term")?;

    let term = line.trim();
    if term.is_empty() {
        return Err(anyhow!("search term must not be empty"));
    }
    Ok(term.to_string())
}

async fn run(config: Config) -> Result<()> {
    let api = YouTubeClient::new(&config)?;
    let transcripts = YtTranscriptSource::new()?;
    let mut collector = Collector::new(api, transcripts, CollectorSettings::from(&config));

    let term = read_search_term()?;
    info!("Starting search for {term} videos...");
    collector.search(&term, config.max_results).await?;

    let output_file = final_output_path(&config.output_dir, &term, Local::now());
    collector.finalize(&output_file)?;
    info!(
        "Process completed successfully. Final data saved to {}",
        output_file.display()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    load_environment();
    init_logger(&log_file_from_env())?;

    let config = Config::from_env().inspect_err(|e| error!("An error occurred in main: {e:#}"))?;

    if let Err(e) = run(config).await {
        error!("An error occurred in main: {e:#}");
        return Err(e);
    }
    Ok(())
}
