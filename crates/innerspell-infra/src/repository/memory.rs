//! In-memory repositories, used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use innerspell_core::domain::{BlogPost, TarotGuideline};
use innerspell_core::error::RepoError;
use innerspell_core::ports::{BaseRepository, GuidelineRepository, PostRepository};

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, BlogPost>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<BlogPost, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, mut post: BlogPost) -> Result<BlogPost, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            post.updated_at = Utc::now();
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_published(&self, category: Option<&str>) -> Result<Vec<BlogPost>, RepoError> {
        let posts = self.posts.read().await;
        let mut listed: Vec<BlogPost> = posts
            .values()
            .filter(|p| p.published)
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }
}

/// Guidelines keyed by spread, seeded with the built-in spreads.
pub struct InMemoryGuidelineRepository {
    guidelines: RwLock<HashMap<String, TarotGuideline>>,
}

impl InMemoryGuidelineRepository {
    pub fn new() -> Self {
        Self {
            guidelines: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_defaults() -> Self {
        let defaults = [
            TarotGuideline::new(
                "one-card",
                "Single Card",
                "Focus on the card's core meaning and relate it directly to the question. Keep it brief.",
            ),
            TarotGuideline::new(
                "three-card",
                "Past / Present / Future",
                "Read the cards left to right as past influences, present situation and likely direction. \
                 Connect the three into one narrative.",
            ),
            TarotGuideline::new(
                "celtic-cross",
                "Celtic Cross",
                "Cover the ten positions in order, then summarise the tension between the crossing card \
                 and the outcome.",
            ),
        ];

        Self {
            guidelines: RwLock::new(
                defaults
                    .into_iter()
                    .map(|g| (g.spread.clone(), g))
                    .collect(),
            ),
        }
    }
}

impl Default for InMemoryGuidelineRepository {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl BaseRepository<TarotGuideline, String> for InMemoryGuidelineRepository {
    async fn find_by_id(&self, spread: String) -> Result<Option<TarotGuideline>, RepoError> {
        Ok(self.guidelines.read().await.get(&spread).cloned())
    }

    async fn save(&self, mut guideline: TarotGuideline) -> Result<TarotGuideline, RepoError> {
        guideline.updated_at = Utc::now();
        self.guidelines
            .write()
            .await
            .insert(guideline.spread.clone(), guideline.clone());
        Ok(guideline)
    }

    async fn delete(&self, spread: String) -> Result<(), RepoError> {
        self.guidelines
            .write()
            .await
            .remove(&spread)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl GuidelineRepository for InMemoryGuidelineRepository {
    async fn list(&self) -> Result<Vec<TarotGuideline>, RepoError> {
        let mut all: Vec<TarotGuideline> = self.guidelines.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.spread.cmp(&b.spread));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn post(category: &str) -> BlogPost {
        BlogPost::new(
            Uuid::new_v4(),
            format!("{} post", category),
            "Body".to_string(),
            category.to_string(),
        )
    }

    #[tokio::test]
    async fn test_list_published_filters_and_orders() {
        let repo = InMemoryPostRepository::new();
        let mut older = post("major-arcana");
        older.created_at -= TimeDelta::hours(1);
        let newer = post("major-arcana");
        let other = post("spreads");
        let draft = post("major-arcana").draft();

        for p in [older.clone(), newer.clone(), other, draft] {
            repo.save(p).await.unwrap();
        }

        let listed = repo.list_published(Some("major-arcana")).await.unwrap();
        assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        assert_eq!(repo.list_published(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_post() {
        let repo = InMemoryPostRepository::new();
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_guideline_upsert() {
        let repo = InMemoryGuidelineRepository::with_defaults();
        assert_eq!(repo.list().await.unwrap().len(), 3);

        repo.save(TarotGuideline::new("three-card", "PPF", "Be concise."))
            .await
            .unwrap();

        let updated = repo.find_by_id("three-card".to_string()).await.unwrap().unwrap();
        assert_eq!(updated.instructions, "Be concise.");
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }
}
