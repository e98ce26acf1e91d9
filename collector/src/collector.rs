use crate::config::Config;
use crate::error::{FetchError, Policy, Stage};
use crate::export;
use crate::models::{video_url, SearchPage, SearchQuery, VideoItem, VideoRecord};
use crate::transcript::TranscriptSource;
use crate::utils::{display_duration, parse_count};
use crate::youtube::VideoApi;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

/// Pacing and checkpoint settings for one collector.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub checkpoint_every: usize,
    pub pacing: Duration,
    pub backoff: Duration,
    pub max_rate_limit_retries: u32,
    pub checkpoint_dir: PathBuf,
}

impl From<&Config> for CollectorSettings {
    fn from(config: &Config) -> Self {
        CollectorSettings {
            checkpoint_every: config.checkpoint_every,
            pacing: config.pacing,
            backoff: config.backoff,
            max_rate_limit_retries: config.max_rate_limit_retries,
            checkpoint_dir: config.output_dir.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CollectorState {
    pub seen_ids: HashSet<String>,
    pub accumulated: Vec<VideoRecord>,
    pub processed_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
}

/// How a page ended when it did not fail outright.
enum PageOutcome {
    Done,
    LimitReached,
    RateLimited(FetchError),
}

pub struct Collector<A, T> {
    api: A,
    transcripts: T,
    settings: CollectorSettings,
    state: CollectorState,
    phase: Phase,
}

impl<A: VideoApi, T: TranscriptSource> Collector<A, T> {
    pub fn new(api: A, transcripts: T, mut settings: CollectorSettings) -> Self {
        settings.checkpoint_every = settings.checkpoint_every.max(1);
        Collector {
            api,
            transcripts,
            settings,
            state: CollectorState::default(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.state.accumulated
    }

    pub fn state(&self) -> &CollectorState {
        &self.state
    }

    /// Collect up to `max_results` new videos for `term`.
    ///
    /// Returns how many records this call appended. Unrecoverable errors are
    /// returned after a checkpoint of everything collected so far.
    pub async fn search(&mut self, term: &str, max_results: usize) -> Result<usize> {
        info!("Starting search for: {term}");
        self.phase = Phase::Searching;
        let started_with = self.state.processed_count;

        let result = self.run_search(term, max_results, started_with).await;
        if let Err(e) = &result {
            error!("An error occurred during video search: {e:#}");
            if let Err(checkpoint_err) = self.checkpoint() {
                error!("Failed to save progress: {checkpoint_err:#}");
            }
        }

        self.phase = Phase::Idle;
        result?;

        let appended = self.state.processed_count - started_with;
        info!("Search for {term} finished with {appended} new videos");
        Ok(appended)
    }

    async fn run_search(
        &mut self,
        term: &str,
        max_results: usize,
        started_with: usize,
    ) -> Result<()> {
        let mut query = SearchQuery::new(term);
        let mut retries = 0;
        // processed_count when the current retry streak started
        let mut streak_mark = self.state.processed_count;

        while self.state.processed_count - started_with < max_results {
            let page = match self.api.search_page(&query).await {
                Ok(page) => page,
                Err(e) => {
                    self.reset_streak_on_progress(&mut retries, &mut streak_mark);
                    self.handle_rate_limit(e, Stage::Search, &mut retries).await?;
                    continue;
                }
            };

            match self.process_page(&page, max_results, started_with).await? {
                PageOutcome::RateLimited(e) => {
                    self.reset_streak_on_progress(&mut retries, &mut streak_mark);
                    self.handle_rate_limit(e, Stage::Details, &mut retries).await?;
                    continue;
                }
                PageOutcome::LimitReached => break,
                PageOutcome::Done => {}
            }

            retries = 0;
            streak_mark = self.state.processed_count;
            match page.next_page_token {
                Some(token) => query = query.at_page(Some(token)),
                None => {
                    info!("No more result pages for: {term}");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn process_page(
        &mut self,
        page: &SearchPage,
        max_results: usize,
        started_with: usize,
    ) -> Result<PageOutcome> {
        for video_id in &page.video_ids {
            if self.state.processed_count - started_with >= max_results {
                return Ok(PageOutcome::LimitReached);
            }

            if !self.state.seen_ids.contains(video_id) {
                match self.fetch_details(video_id).await {
                    Ok(Some(record)) => self.append(video_id, record, max_results, started_with)?,
                    Ok(None) => {}
                    Err(e) => return Ok(PageOutcome::RateLimited(e)),
                }
            }

            // Respect API quotas
            sleep(self.settings.pacing).await;
        }

        if self.state.processed_count - started_with >= max_results {
            return Ok(PageOutcome::LimitReached);
        }
        Ok(PageOutcome::Done)
    }

    fn append(
        &mut self,
        video_id: &str,
        record: VideoRecord,
        max_results: usize,
        started_with: usize,
    ) -> Result<()> {
        self.state.accumulated.push(record);
        self.state.seen_ids.insert(video_id.to_string());
        self.state.processed_count += 1;

        let processed = self.state.processed_count - started_with;
        info!("Processed video {processed}/{max_results}");

        if processed % self.settings.checkpoint_every == 0 {
            self.checkpoint()?;
        }
        Ok(())
    }

    /// A retry that appended records ends the streak of consecutive failures.
    fn reset_streak_on_progress(&self, retries: &mut u32, streak_mark: &mut usize) {
        if self.state.processed_count > *streak_mark {
            *retries = 0;
            *streak_mark = self.state.processed_count;
        }
    }

    /// Sleep through a rate limit, or turn any other failure into an abort.
    async fn handle_rate_limit(
        &self,
        err: FetchError,
        stage: Stage,
        retries: &mut u32,
    ) -> Result<()> {
        match err.policy(stage) {
            Policy::RetryWithBackoff => {
                *retries += 1;
                if *retries > self.settings.max_rate_limit_retries {
                    return Err(anyhow!(
                        "rate-limited page still failing after {} retries: {err}",
                        self.settings.max_rate_limit_retries
                    ));
                }
                error!("API quota exceeded or rate limit reached: {err}");
                warn!(
                    "Waiting {:?} before retrying the current page (attempt {}/{})",
                    self.settings.backoff, retries, self.settings.max_rate_limit_retries
                );
                sleep(self.settings.backoff).await;
                Ok(())
            }
            _ => Err(err.into()),
        }
    }

    /// Build the record for one video.
    ///
    /// `Ok(None)` means the video is skipped. Only rate-limit errors are
    /// returned, so the caller can back off and retry the page.
    pub async fn fetch_details(&self, video_id: &str) -> Result<Option<VideoRecord>, FetchError> {
        let item = match self.api.video_details(video_id).await {
            Ok(item) => item,
            Err(e) => {
                return match e.policy(Stage::Details) {
                    Policy::RetryWithBackoff => Err(e),
                    _ => {
                        match &e {
                            FetchError::NotFound(_) => debug!("Skipping video {video_id}: {e}"),
                            _ => error!(
                                "Error occurred while getting video details for {video_id}: {e:#}"
                            ),
                        }
                        Ok(None)
                    }
                };
            }
        };

        let (has_captions, caption_text) = match self.transcripts.fetch_transcript(video_id).await {
            Ok(text) => (true, text),
            Err(e) => {
                debug!("No captions available for video {video_id}: {e}");
                (false, String::new())
            }
        };

        Ok(Some(build_record(video_id, item, has_captions, caption_text)))
    }

    /// Write everything collected so far to a fresh checkpoint file.
    pub fn checkpoint(&self) -> Result<PathBuf> {
        let path = export::checkpoint_path(
            &self.settings.checkpoint_dir,
            Local::now(),
            self.state.accumulated.len(),
        );
        export::write_csv(&path, &self.state.accumulated)?;
        info!("Progress saved to {}", path.display());
        Ok(path)
    }

    pub fn finalize(&self, path: &Path) -> Result<()> {
        export::write_csv(path, &self.state.accumulated)
    }
}

fn build_record(
    video_id: &str,
    item: VideoItem,
    has_captions: bool,
    caption_text: String,
) -> VideoRecord {
    let snippet = item.snippet;

    VideoRecord {
        url: video_url(video_id),
        title: snippet.title,
        description: snippet.description,
        channel: snippet.channel_title,
        tags: snippet.tags.join(","),
        category: snippet.category_id,
        topics: item
            .topic_details
            .map(|t| t.topic_categories.join(","))
            .unwrap_or_default(),
        published_at: snippet.published_at.parse::<DateTime<Utc>>().ok(),
        duration: display_duration(&item.content_details.duration),
        view_count: parse_count(item.statistics.view_count.as_deref()),
        comment_count: parse_count(item.statistics.comment_count.as_deref()),
        has_captions,
        caption_text,
        recording_location: item
            .recording_details
            .map(|details| details.to_string())
            .unwrap_or_else(|| "{}".to_string()),
    }
}
