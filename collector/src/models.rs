use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest page size the search endpoint accepts.
pub const SEARCH_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub result_limit: u32,
    pub page_token: Option<String>,
}

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        SearchQuery {
            term: term.to_string(),
            result_limit: SEARCH_PAGE_SIZE,
            page_token: None,
        }
    }

    /// Same query, positioned on the page behind `token`.
    pub fn at_page(&self, token: Option<String>) -> Self {
        SearchQuery {
            page_token: token,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

// Documentation: https://developers.google.com/youtube/v3/docs/search/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

impl From<SearchListResponse> for SearchPage {
    fn from(response: SearchListResponse) -> Self {
        SearchPage {
            video_ids: response
                .items
                .into_iter()
                .filter_map(|item| item.id.video_id)
                .collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

// Documentation: https://developers.google.com/youtube/v3/docs/videos
#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub content_details: ContentDetails,
    #[serde(default)]
    pub statistics: Statistics,
    pub recording_details: Option<Value>,
    pub topic_details: Option<TopicDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub published_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentDetails {
    pub duration: String,
}

/// Counters arrive as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub view_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicDetails {
    pub topic_categories: Vec<String>,
}

/// One CSV row. Field order is column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(rename = "Video URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Channel Title")]
    pub channel: String,
    #[serde(rename = "Keyword Tags")]
    pub tags: String,
    #[serde(rename = "YouTube Video Category")]
    pub category: String,
    #[serde(rename = "Topic Details")]
    pub topics: String,
    #[serde(rename = "Video Published at")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "Video Duration")]
    pub duration: String,
    #[serde(rename = "View Count")]
    pub view_count: u64,
    #[serde(rename = "Comment Count")]
    pub comment_count: u64,
    #[serde(rename = "Captions Available")]
    pub has_captions: bool,
    #[serde(rename = "Caption Text")]
    pub caption_text: String,
    #[serde(rename = "Location of Recording")]
    pub recording_location: String,
}

pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
