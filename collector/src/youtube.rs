use crate::config::Config;
use crate::error::FetchError;
use crate::models::{SearchListResponse, SearchPage, SearchQuery, VideoItem, VideoListResponse};
use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

const VIDEO_PARTS: &str = "snippet,contentDetails,statistics,recordingDetails,topicDetails";

/// The two YouTube Data API calls the collector needs.
#[async_trait(?Send)]
pub trait VideoApi {
    async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, FetchError>;

    /// Fails with [`FetchError::NotFound`] when the API returns no item.
    async fn video_details(&self, video_id: &str) -> Result<VideoItem, FetchError>;
}

pub struct YouTubeClient {
    client: Client,
    base_url: Url,
    api_key: String,
    relevance_language: String,
    video_duration: String,
}

impl YouTubeClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(YouTubeClient {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            relevance_language: config.relevance_language.clone(),
            video_duration: config.video_duration.clone(),
        })
    }

    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse_with_params(
            &format!("{base}/{resource}"),
            params.iter().chain(std::iter::once(&("key", self.api_key.as_str()))),
        )
        .with_context(|| format!("failed to build {resource} URL"))?;
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", redact_key(&url));
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("request to YouTube API failed")?;

        let response = check_status(response).await?;
        let body = response
            .json::<T>()
            .await
            .context("failed to decode YouTube API response")?;
        Ok(body)
    }

    /// One video from the most-popular chart. Used to verify the API key.
    pub async fn most_popular(&self) -> Result<Option<VideoItem>, FetchError> {
        let url = self.endpoint(
            "videos",
            &[("part", "snippet"), ("chart", "mostPopular"), ("maxResults", "1")],
        )?;
        let response: VideoListResponse = self.get_json(url).await?;
        Ok(response.items.into_iter().next())
    }
}

#[async_trait(?Send)]
impl VideoApi for YouTubeClient {
    async fn search_page(&self, query: &SearchQuery) -> Result<SearchPage, FetchError> {
        let result_limit = query.result_limit.to_string();
        let mut params = vec![
            ("part", "id,snippet"),
            ("q", query.term.as_str()),
            ("type", "video"),
            ("maxResults", result_limit.as_str()),
            ("relevanceLanguage", self.relevance_language.as_str()),
            ("videoDuration", self.video_duration.as_str()),
        ];
        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.as_str()));
        }

        let url = self.endpoint("search", &params)?;
        let response: SearchListResponse = self.get_json(url).await?;
        Ok(response.into())
    }

    async fn video_details(&self, video_id: &str) -> Result<VideoItem, FetchError> {
        let url = self.endpoint("videos", &[("part", VIDEO_PARTS), ("id", video_id)])?;
        let response: VideoListResponse = self.get_json(url).await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(video_id.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or(body);

    if FetchError::is_rate_limit_status(status.as_u16()) {
        Err(FetchError::RateLimited {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(FetchError::Other(anyhow::anyhow!(
            "YouTube API returned HTTP {status}: {message}"
        )))
    }
}

/// Pull `error.message` out of a Google API error body.
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json["error"]["message"].as_str().map(String::from)
}

fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
