//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One card of a reading as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDto {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub reversed: bool,
}

/// Request for an AI interpretation of a reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub question: String,
    pub spread: String,
    pub cards: Vec<CardDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretResponse {
    pub interpretation: String,
    pub tier: String,
    /// Requests left in the current window after this one.
    pub remaining: u32,
}

/// Body of an AI quota denial (HTTP 429).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub error: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub reset_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertGuidelineRequest {
    pub title: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineResponse {
    pub spread: String,
    pub title: String,
    pub instructions: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvalidateCacheRequest {
    /// Substring to match; empty or missing clears the whole cache.
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateCacheResponse {
    pub pattern: Option<String>,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub cache_entries: usize,
}
