use std::process::ExitCode;
use yt_collector::config::{load_environment, Config};
use yt_collector::youtube::YouTubeClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_environment();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match YouTubeClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            println!("Error testing API key: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match client.most_popular().await {
        Ok(Some(video)) => {
            println!("API test successful!");
            println!("Successfully retrieved video: {}", video.snippet.title);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("API test successful, but the most popular chart was empty.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error testing API key: {e}");
            ExitCode::FAILURE
        }
    }
}
