//! Blog handlers. Reads go through the `blog:` cache namespaces; writes clear them.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use innerspell_core::domain::BlogPost;
use innerspell_core::ports::{BaseRepository, Cache, PostRepository};
use innerspell_infra::cache::namespace::BLOG_PATTERN;
use innerspell_shared::ApiResponse;
use innerspell_shared::dto::{CreatePostRequest, PostListQuery, PostResponse};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn post_response(post: BlogPost) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        excerpt: post.excerpt,
        content: post.content,
        category: post.category,
        tags: post.tags,
        published: post.published,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

async fn invalidate_blog(state: &AppState) {
    match state.cache.delete_pattern(BLOG_PATTERN).await {
        Ok(removed) => tracing::debug!(pattern = BLOG_PATTERN, removed, "Blog cache invalidated"),
        Err(e) => tracing::warn!(error = %e, "Failed to invalidate blog cache"),
    }
}

/// GET /api/blog/posts?category=
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let category = query.into_inner().category.filter(|c| !c.is_empty());
    let suffix = category.as_deref().unwrap_or("all");

    let posts = match state.caches.post_lists.get(suffix).await {
        Some(posts) => posts,
        None => {
            let posts = state.posts.list_published(category.as_deref()).await?;
            if let Err(e) = state.caches.post_lists.set(suffix, &posts, None).await {
                tracing::warn!(error = %e, "Failed to cache post list");
            }
            posts
        }
    };

    let body: Vec<PostResponse> = posts.into_iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /api/blog/posts/{id}
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let suffix = id.to_string();

    let post = match state.caches.posts.get(&suffix).await {
        Some(post) => post,
        None => {
            let post = state
                .posts
                .find_by_id(id)
                .await?
                .filter(|p| p.published)
                .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;
            if let Err(e) = state.caches.posts.set(&suffix, &post, None).await {
                tracing::warn!(error = %e, "Failed to cache post");
            }
            post
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_response(post))))
}

/// POST /api/blog/posts - admin only
pub async fn create_post(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content must not be empty".to_string()));
    }

    let mut post = BlogPost::new(admin.0.user_id, req.title, req.content, req.category).with_tags(req.tags);
    if !req.published {
        post = post.draft();
    }

    let saved = state.posts.save(post).await?;
    invalidate_blog(&state).await;

    tracing::info!(post_id = %saved.id, author = %admin.0.user_id, "Post created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(post_response(saved))))
}

/// DELETE /api/blog/posts/{id} - admin only
pub async fn delete_post(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.delete(id).await?;
    invalidate_blog(&state).await;

    tracing::info!(post_id = %id, by = %admin.0.user_id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}
