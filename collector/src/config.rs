use anyhow::{anyhow, Context, Result};
use env_logger::{Builder, Target};
use log::{info, LevelFilter};
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: Url,
    pub max_results: usize,
    pub checkpoint_every: usize,
    pub pacing: Duration,
    pub backoff: Duration,
    pub max_rate_limit_retries: u32,
    pub relevance_language: String,
    pub video_duration: String,
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("YOUTUBE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("YOUTUBE_API_KEY environment variable must be set"))?;

        let base = lookup("YOUTUBE_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let api_base_url = Url::parse(&base)
            .with_context(|| format!("YOUTUBE_API_BASE_URL is not a valid URL: {base}"))?;

        let checkpoint_every: usize = parse_or(&lookup, "YOUTUBE_CHECKPOINT_EVERY", 50)?;
        if checkpoint_every == 0 {
            return Err(anyhow!("YOUTUBE_CHECKPOINT_EVERY must be at least 1"));
        }

        Ok(Config {
            api_key,
            api_base_url,
            max_results: parse_or(&lookup, "YOUTUBE_MAX_RESULTS", 500)?,
            checkpoint_every,
            pacing: Duration::from_millis(parse_or(&lookup, "YOUTUBE_PACING_MS", 100)?),
            backoff: Duration::from_secs(parse_or(&lookup, "YOUTUBE_BACKOFF_SECS", 60)?),
            max_rate_limit_retries: parse_or(&lookup, "YOUTUBE_MAX_RATE_LIMIT_RETRIES", 10)?,
            relevance_language: lookup("YOUTUBE_RELEVANCE_LANGUAGE").unwrap_or_else(|| "en".into()),
            video_duration: lookup("YOUTUBE_VIDEO_DURATION").unwrap_or_else(|| "medium".into()),
            output_dir: lookup("YOUTUBE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_file: log_file_from_lookup(&lookup),
            http_timeout: Duration::from_secs(parse_or(&lookup, "YOUTUBE_HTTP_TIMEOUT_SECS", 30)?),
        })
    }
}

/// Log file location, resolvable before the rest of the configuration.
pub fn log_file_from_env() -> PathBuf {
    log_file_from_lookup(&|key: &str| env::var(key).ok())
}

fn log_file_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("YOUTUBE_LOG_FILE")
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("scraper.log"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

/// Sends every log line to stderr and to the log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

pub fn init_logger(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logger: {e}"))?;

    info!("Logging to console and {}", log_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("YOUTUBE_API_KEY"));

        let blank = Config::from_lookup(lookup_from(&[("YOUTUBE_API_KEY", "  ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn defaults_follow_the_collection_policy() {
        let config = Config::from_lookup(lookup_from(&[("YOUTUBE_API_KEY", "k")])).unwrap();

        assert_eq!(config.api_key, "k");
        assert_eq!(config.api_base_url.as_str(), "https://www.googleapis.com/youtube/v3");
        assert_eq!(config.max_results, 500);
        assert_eq!(config.checkpoint_every, 50);
        assert_eq!(config.pacing, Duration::from_millis(100));
        assert_eq!(config.backoff, Duration::from_secs(60));
        assert_eq!(config.max_rate_limit_retries, 10);
        assert_eq!(config.relevance_language, "en");
        assert_eq!(config.video_duration, "medium");
        assert_eq!(config.log_file, PathBuf::from("scraper.log"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("YOUTUBE_API_KEY", "k"),
            ("YOUTUBE_MAX_RESULTS", "25"),
            ("YOUTUBE_PACING_MS", "0"),
            ("YOUTUBE_BACKOFF_SECS", "5"),
            ("YOUTUBE_OUTPUT_DIR", "/tmp/out"),
        ]))
        .unwrap();

        assert_eq!(config.max_results, 25);
        assert_eq!(config.pacing, Duration::ZERO);
        assert_eq!(config.backoff, Duration::from_secs(5));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("YOUTUBE_API_KEY", "k"),
            ("YOUTUBE_MAX_RESULTS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("YOUTUBE_MAX_RESULTS"));

        let zero = Config::from_lookup(lookup_from(&[
            ("YOUTUBE_API_KEY", "k"),
            ("YOUTUBE_CHECKPOINT_EVERY", "0"),
        ]));
        assert!(zero.is_err());
    }

    #[test]
    fn log_file_resolves_without_an_api_key() {
        assert_eq!(
            log_file_from_lookup(&lookup_from(&[])),
            PathBuf::from("scraper.log")
        );
        assert_eq!(
            log_file_from_lookup(&lookup_from(&[("YOUTUBE_LOG_FILE", "/var/log/yt.log")])),
            PathBuf::from("/var/log/yt.log")
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("YOUTUBE_API_KEY", "k"),
            ("YOUTUBE_API_BASE_URL", "not a url"),
        ]));
        assert!(result.is_err());
    }
}
