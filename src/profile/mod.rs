/// Profile Resolution System
///
/// Retrieves public profile metadata from the upstream service by trying
/// several independent access surfaces in order, and normalizes whichever
/// payload wins into a single canonical record.

pub mod embedded;
pub mod normalize;
pub mod resolver;
pub mod strategy;

#[cfg(test)]
pub(crate) mod fixtures;

pub use normalize::normalize_user;
pub use resolver::ProfileResolver;
pub use strategy::ProfileStrategy;

use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Maximum number of timeline entries carried on a record
pub const MAX_POSTS: usize = 9;

/// The single failure message exposed to callers
pub const UNAVAILABLE_MESSAGE: &str = "Unable to access profile. Try again later.";

/// Canonical profile record, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    #[serde(rename = "username")]
    pub handle: String,
    #[serde(rename = "full_name")]
    pub display_name: String,
    #[serde(rename = "bio")]
    pub biography: String,
    #[serde(rename = "followers")]
    pub follower_count: u64,
    #[serde(rename = "following")]
    pub following_count: u64,
    #[serde(rename = "posts_count")]
    pub post_count: u64,
    #[serde(rename = "profile_pic")]
    pub avatar_url: String,
    pub is_private: bool,
    pub is_verified: bool,
    #[serde(rename = "external_url")]
    pub external_link: Option<String>,
    pub category: Option<String>,
    pub posts: Vec<PostSummary>,
}

/// Kind of timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostKind {
    #[serde(rename = "POST")]
    Static,
    #[serde(rename = "REELS")]
    Video,
}

impl PostKind {
    pub fn from_is_video(is_video: bool) -> Self {
        if is_video {
            PostKind::Video
        } else {
            PostKind::Static
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, PostKind::Video)
    }
}

/// One timeline entry of a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: String,
    pub kind: PostKind,
    pub thumbnail_url: String,
    /// Only set for video posts
    pub video_url: Option<String>,
    pub short_code: String,
    pub caption: String,
    pub like_count: u64,
    pub comment_count: u64,
}

impl PostSummary {
    /// Permalink of the post on the upstream web host
    pub fn permalink(&self, web_base_url: &str) -> String {
        format!("{}/p/{}/", web_base_url.trim_end_matches('/'), self.short_code)
    }
}

#[derive(Serialize)]
struct PostWire<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: PostKind,
    thumbnail: &'a str,
    video_url: Option<&'a str>,
    shortcode: &'a str,
    caption: &'a str,
    likes: u64,
    comments: u64,
    is_video: bool,
}

impl Serialize for PostSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PostWire {
            id: &self.id,
            kind: self.kind,
            thumbnail: &self.thumbnail_url,
            video_url: self.video_url.as_deref(),
            shortcode: &self.short_code,
            caption: &self.caption,
            likes: self.like_count,
            comments: self.comment_count,
            is_video: self.kind.is_video(),
        }
        .serialize(serializer)
    }
}

/// Resolution failure as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Unable to access profile. Try again later.")]
    Unavailable,
}

/// Why a single strategy did not produce a record
///
/// Logged and counted, never returned past the resolver.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected payload: {0}")]
    Shape(String),

    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),
}

impl StrategyError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyError::Transport(_) => "transport",
            StrategyError::Status(_) => "status",
            StrategyError::Timeout(_) => "timeout",
            StrategyError::Shape(_) => "shape",
            StrategyError::Normalization(_) => "normalization",
        }
    }
}

/// Required field absent or of the wrong type in a user object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("missing field `{0}`")]
    Missing(String),

    #[error("field `{0}` has the wrong type")]
    WrongType(String),
}

/// Trim and lowercase a user-supplied handle
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}
