use crate::error::FetchError;
use async_trait::async_trait;
use log::debug;
use yt_transcript_rs::api::YouTubeTranscriptApi;

#[async_trait(?Send)]
pub trait TranscriptSource {
    /// Full transcript text, snippets joined with single spaces.
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, FetchError>;
}

pub struct YtTranscriptSource {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl YtTranscriptSource {
    pub fn new() -> anyhow::Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| anyhow::anyhow!("Failed to create YouTubeTranscriptApi: {e:?}"))?;
        Ok(YtTranscriptSource {
            api,
            languages: vec!["en".to_string()],
        })
    }
}

#[async_trait(?Send)]
impl TranscriptSource for YtTranscriptSource {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, FetchError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| FetchError::TranscriptUnavailable(format!("{e:?}")))?;

        let texts: Vec<String> = transcript.into_iter().map(|entry| entry.text).collect();
        debug!("Fetched {} caption snippets for video ID: {video_id}", texts.len());
        Ok(texts.join(" "))
    }
}
