use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{BlogPost, TarotGuideline};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Blog post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<BlogPost, Uuid> {
    /// Published posts, newest first, optionally restricted to one category.
    async fn list_published(&self, category: Option<&str>) -> Result<Vec<BlogPost>, RepoError>;
}

/// Tarot guideline repository, keyed by spread type.
#[async_trait]
pub trait GuidelineRepository: BaseRepository<TarotGuideline, String> {
    async fn list(&self) -> Result<Vec<TarotGuideline>, RepoError>;
}
