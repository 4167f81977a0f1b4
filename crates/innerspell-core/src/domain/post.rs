use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Blog post entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
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

impl BlogPost {
    /// Create a new post with generated ID and timestamps.
    pub fn new(author_id: Uuid, title: String, content: String, category: String) -> Self {
        let now = Utc::now();
        let excerpt = Self::excerpt_of(&content);
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            excerpt,
            content,
            category,
            tags: Vec::new(),
            published: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn draft(mut self) -> Self {
        self.published = false;
        self
    }

    /// First 160 characters of the content, cut on a char boundary.
    fn excerpt_of(content: &str) -> String {
        const EXCERPT_CHARS: usize = 160;
        let trimmed = content.trim();
        match trimmed.char_indices().nth(EXCERPT_CHARS) {
            Some((idx, _)) => format!("{}...", &trimmed[..idx]),
            None => trimmed.to_string(),
        }
    }
}
