//! Post service
//!
//! Coordinates validation, image storage and tag association for posts.
//!
//! Writes happen in a fixed order: validate everything (image included), copy
//! the image to the upload store, then write rows. A failed disk write never
//! leaves a row behind; a failed row write removes the file again unless it
//! was already on disk before this request.
//!
//! Files are never removed while the writing transaction is open. `update`
//! and `delete` report the image the post stopped using, and the caller hands
//! it to [`PostService::release_files`] once the transaction has committed.

use std::sync::Arc;

use sqlx::SqliteConnection;

use super::naming::stored_name;
use super::tag::{self as tag_service, normalize_tag_name, TagServiceError};
use super::upload::{accepted_extension, UploadError, UploadStore};
use super::validation::{string_is_present, validate, FieldErrors};
use crate::db::repositories::{
    comment as comment_repo, post as post_repo, tag_post as tag_post_repo, user as user_repo,
};
use crate::models::{ImageUpload, ListParams, PagedResult, Post, PostDetail, PostInput, User};

const INVALID_FILE: &str = "Invalid selected file";

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Upload error: {0}")]
    UploadError(#[from] UploadError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for PostServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::ValidationError(errors) => {
                let mut tagged = FieldErrors::new();
                for message in errors.get("name") {
                    tagged.add("tag", message.clone());
                }
                PostServiceError::ValidationError(tagged)
            }
            TagServiceError::NotFound(name) => {
                PostServiceError::InternalError(anyhow::anyhow!("Tag vanished: {}", name))
            }
            TagServiceError::InternalError(e) => PostServiceError::InternalError(e),
        }
    }
}

/// A post write that may have left an image without references
#[derive(Debug)]
pub struct PostChange {
    pub post: Post,
    /// Image the post no longer points at
    pub released: Option<String>,
}

/// An image written to the store during the current request
struct StagedImage {
    name: String,
    /// The file existed before this request wrote it
    preexisting: bool,
}

/// Post service
pub struct PostService {
    store: Arc<dyn UploadStore>,
    max_file_size: u64,
}

impl PostService {
    pub fn new(store: Arc<dyn UploadStore>, max_file_size: u64) -> Self {
        Self {
            store,
            max_file_size,
        }
    }

    /// Check every field, returning the canonical tag name on success. A new
    /// post must carry an image; an edit without one keeps the current image.
    fn validate_input(
        &self,
        input: &PostInput,
        require_image: bool,
    ) -> Result<String, PostServiceError> {
        let mut errors = validate([
            string_is_present("title", "Title", &input.title),
            string_is_present("content", "Content", &input.content),
        ]);

        match &input.image {
            None if require_image => errors.add("file_image", INVALID_FILE),
            None => {}
            Some(image) if accepted_extension(&image.original_name).is_none() => {
                errors.add("file_image", INVALID_FILE)
            }
            Some(image) if image.bytes.len() as u64 > self.max_file_size => errors.add(
                "file_image",
                format!(
                    "Image is too large. Maximum size: {} MB",
                    self.max_file_size / 1024 / 1024
                ),
            ),
            Some(_) => {}
        }

        let canonical = normalize_tag_name(&input.tag);
        if !input.tag.trim().is_empty() && canonical.is_empty() {
            errors.add("tag", "Tag must contain at least one letter or digit.");
        }

        errors
            .into_result()
            .map_err(PostServiceError::ValidationError)?;
        Ok(canonical)
    }

    async fn stage_image(&self, image: &ImageUpload) -> Result<StagedImage, PostServiceError> {
        let name = stored_name(&image.original_name);
        let preexisting = self.store.exists(&name).await?;
        self.store.store(&name, &image.bytes).await?;
        Ok(StagedImage { name, preexisting })
    }

    /// Best-effort removal of a file written by a request that then failed
    async fn discard_staged(&self, staged: Option<StagedImage>) {
        let Some(staged) = staged else { return };
        if staged.preexisting {
            return;
        }
        if let Err(e) = self.store.remove(&staged.name).await {
            tracing::warn!(name = %staged.name, error = %e, "Failed to clean up orphaned upload");
        }
    }

    /// Create a post authored by `author`
    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        author: &User,
        input: &PostInput,
    ) -> Result<Post, PostServiceError> {
        let canonical = self.validate_input(input, true)?;

        let staged = match &input.image {
            Some(image) => Some(self.stage_image(image).await?),
            None => None,
        };
        let file_name = staged.as_ref().map(|s| s.name.clone());

        match self
            .persist_new(conn, author, input, file_name.as_deref(), &canonical)
            .await
        {
            Ok(post) => {
                tracing::info!(post_id = post.id, author_id = author.id, "Created post");
                Ok(post)
            }
            Err(e) => {
                self.discard_staged(staged).await;
                Err(e)
            }
        }
    }

    async fn persist_new(
        &self,
        conn: &mut SqliteConnection,
        author: &User,
        input: &PostInput,
        file_name: Option<&str>,
        canonical_tag: &str,
    ) -> Result<Post, PostServiceError> {
        let post = post_repo::create(conn, &input.title, &input.content, author.id, file_name)
            .await?;

        if !canonical_tag.is_empty() {
            let (tag, _) = tag_service::find_or_create(conn, canonical_tag).await?;
            tag_post_repo::create(conn, post.id, tag.id).await?;
        }

        Ok(post)
    }

    /// Edit a post. A new image replaces the old one; a blank tag keeps the
    /// current association.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        input: &PostInput,
    ) -> Result<PostChange, PostServiceError> {
        let post = self.get(conn, id).await?;
        let canonical = self.validate_input(input, false)?;

        let staged = match &input.image {
            Some(image) => Some(self.stage_image(image).await?),
            None => None,
        };
        let new_file = staged.as_ref().map(|s| s.name.clone());

        match self
            .persist_update(conn, post, input, new_file, &canonical)
            .await
        {
            Ok(change) => {
                tracing::info!(post_id = change.post.id, "Updated post");
                Ok(change)
            }
            Err(e) => {
                self.discard_staged(staged).await;
                Err(e)
            }
        }
    }

    async fn persist_update(
        &self,
        conn: &mut SqliteConnection,
        mut post: Post,
        input: &PostInput,
        new_file: Option<String>,
        canonical_tag: &str,
    ) -> Result<PostChange, PostServiceError> {
        let old_file = post.file_name.clone();

        post.title = input.title.clone();
        post.content = input.content.clone();
        if new_file.is_some() {
            post.file_name = new_file;
        }
        let post = post_repo::update(conn, &post).await?;

        if !canonical_tag.is_empty() {
            let (tag, _) = tag_service::find_or_create(conn, canonical_tag).await?;
            match tag_post_repo::get_by_post(conn, post.id).await? {
                Some(assoc) if assoc.tag_id == tag.id => {}
                Some(assoc) => tag_post_repo::set_tag(conn, assoc.id, tag.id).await?,
                None => {
                    tag_post_repo::create(conn, post.id, tag.id).await?;
                }
            }
        }

        let released = old_file.filter(|old| post.file_name.as_ref() != Some(old));
        Ok(PostChange { post, released })
    }

    /// Delete a post. Its image is left on disk until [`Self::release_files`]
    /// runs after the commit.
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<PostChange, PostServiceError> {
        let post = self.get(conn, id).await?;
        post_repo::delete(conn, id).await?;

        tracing::info!(post_id = id, "Deleted post");
        let released = post.file_name.clone();
        Ok(PostChange { post, released })
    }

    /// Remove each of `names` that no post references any more.
    ///
    /// Run this on a connection holding the write lock (see
    /// [`crate::db::begin_write`]) so no post can start using a file between
    /// the count and the removal. Returns how many files were removed.
    pub async fn release_files(
        &self,
        conn: &mut SqliteConnection,
        names: &[String],
    ) -> Result<usize, PostServiceError> {
        let mut removed = 0;
        for name in names {
            let references = post_repo::count_by_file_name(conn, name).await?;
            if self.store.delete_if_unreferenced(name, references).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn get(&self, conn: &mut SqliteConnection, id: i64) -> Result<Post, PostServiceError> {
        post_repo::get_by_id(conn, id)
            .await?
            .ok_or(PostServiceError::NotFound(id))
    }

    /// Post with its author, tag and comments
    pub async fn detail(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<PostDetail, PostServiceError> {
        let post = self.get(conn, id).await?;
        let author_name = user_repo::get_by_id(conn, post.author_id)
            .await?
            .map(|u| u.name);
        let tag = tag_post_repo::tag_for_post(conn, id).await?;
        let comments = comment_repo::list_for_post(conn, id).await?;

        Ok(PostDetail {
            post,
            author_name,
            tag,
            comments,
        })
    }

    pub async fn list(
        &self,
        conn: &mut SqliteConnection,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        Ok(post_repo::list(conn, params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::user::NewUser;
    use crate::services::upload::LocalUploadStore;
    use async_trait::async_trait;
    use std::path::Path;

    const MAX: u64 = 1024 * 1024;

    async fn author(conn: &mut SqliteConnection) -> User {
        user_repo::create(
            conn,
            &NewUser {
                name: "Ada",
                username: "ada",
                email: "ada@example.com",
                password_hash: "hash",
                admin: true,
                provider: "",
                provider_id: "",
            },
        )
        .await
        .unwrap()
    }

    fn input(title: &str, content: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn with_image(mut input: PostInput, name: &str) -> PostInput {
        input.image = Some(ImageUpload {
            original_name: name.to_string(),
            bytes: b"\x89PNG fake".to_vec(),
        });
        input
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    async fn post_count(conn: &mut SqliteConnection) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    async fn associations(conn: &mut SqliteConnection, post_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tags_posts WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    struct FailingStore;

    #[async_trait]
    impl UploadStore for FailingStore {
        async fn ensure_directory(&self) -> Result<(), UploadError> {
            Ok(())
        }

        async fn store(&self, name: &str, _bytes: &[u8]) -> Result<(), UploadError> {
            Err(UploadError::Write {
                name: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        async fn exists(&self, _name: &str) -> Result<bool, UploadError> {
            Ok(false)
        }

        async fn remove(&self, _name: &str) -> Result<(), UploadError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_roundtrip_with_image_and_tag() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let mut form = with_image(input("Hello", "World"), "cat.png");
        form.tag = "Rust Lang!".to_string();
        let post = service.create(&mut conn, &ada, &form).await.unwrap();

        let stored = stored_name("cat.png");
        assert_eq!(post.file_name.as_deref(), Some(stored.as_str()));
        assert!(tmp.path().join(&stored).exists());

        let detail = service.detail(&mut conn, post.id).await.unwrap();
        assert_eq!(detail.post.title, "Hello");
        assert_eq!(detail.post.content, "World");
        assert_eq!(detail.author_name.as_deref(), Some("Ada"));
        assert_eq!(detail.tag.map(|t| t.name).as_deref(), Some("rustlang"));
        assert!(detail.comments.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_image() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let Err(PostServiceError::ValidationError(errors)) =
            service.create(&mut conn, &ada, &input("Plain", "text")).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("file_image"), [INVALID_FILE]);
        assert_eq!(post_count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn test_fields_stored_as_submitted() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let form = with_image(input("  Spaced title  ", "Body\n"), "cat.png");
        let post = service.create(&mut conn, &ada, &form).await.unwrap();
        let stored = service.get(&mut conn, post.id).await.unwrap();
        assert_eq!(stored.title, "  Spaced title  ");
        assert_eq!(stored.content, "Body\n");

        let edit = input("\tTabbed", "  indented\n  lines\n");
        let change = service.update(&mut conn, post.id, &edit).await.unwrap();
        assert_eq!(change.post.title, "\tTabbed");
        let stored = service.get(&mut conn, post.id).await.unwrap();
        assert_eq!(stored.content, "  indented\n  lines\n");
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let Err(PostServiceError::ValidationError(errors)) =
            service.create(&mut conn, &ada, &input(" ", "")).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("title"), ["Title can not be blank."]);
        assert_eq!(errors.get("content"), ["Content can not be blank."]);
    }

    #[tokio::test]
    async fn test_gif_rejected_without_side_effects() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let form = with_image(input("Hello", "World"), "funny.gif");
        let Err(PostServiceError::ValidationError(errors)) =
            service.create(&mut conn, &ada, &form).await
        else {
            panic!("expected validation error");
        };

        assert_eq!(errors.get("file_image"), [INVALID_FILE]);
        assert_eq!(post_count(&mut conn).await, 0);
        assert_eq!(files_in(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_uppercase_extension_rejected() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let form = with_image(input("Hello", "World"), "photo.JPG");
        assert!(matches!(
            service.create(&mut conn, &ada, &form).await,
            Err(PostServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_image_rejected() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), 4);
        let ada = author(&mut conn).await;

        let form = with_image(input("Hello", "World"), "big.png");
        assert!(matches!(
            service.create(&mut conn, &ada, &form).await,
            Err(PostServiceError::ValidationError(_))
        ));
        assert_eq!(files_in(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_symbol_only_tag_rejected() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let mut form = input("Hello", "World");
        form.tag = "+++".to_string();
        let Err(PostServiceError::ValidationError(errors)) =
            service.create(&mut conn, &ada, &form).await
        else {
            panic!("expected validation error");
        };
        assert!(!errors.get("tag").is_empty());
        assert_eq!(post_count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn test_disk_failure_leaves_no_row() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let service = PostService::new(Arc::new(FailingStore), MAX);
        let ada = author(&mut conn).await;

        let form = with_image(input("Hello", "World"), "cat.png");
        assert!(matches!(
            service.create(&mut conn, &ada, &form).await,
            Err(PostServiceError::UploadError(_))
        ));
        assert_eq!(post_count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn test_database_failure_removes_new_file() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        sqlx::query("DROP TABLE posts")
            .execute(&mut *conn)
            .await
            .unwrap();

        let form = with_image(input("Hello", "World"), "cat.png");
        assert!(matches!(
            service.create(&mut conn, &ada, &form).await,
            Err(PostServiceError::InternalError(_))
        ));
        assert!(!tmp.path().join(stored_name("cat.png")).exists());
    }

    #[tokio::test]
    async fn test_shared_file_removed_with_last_reference() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let first = service
            .create(&mut conn, &ada, &with_image(input("one", "1"), "shared.jpg"))
            .await
            .unwrap();
        let second = service
            .create(&mut conn, &ada, &with_image(input("two", "2"), "shared.jpg"))
            .await
            .unwrap();
        assert_eq!(first.file_name, second.file_name);
        let path = tmp.path().join(stored_name("shared.jpg"));

        let change = service.delete(&mut conn, first.id).await.unwrap();
        let released: Vec<String> = change.released.into_iter().collect();
        assert_eq!(service.release_files(&mut conn, &released).await.unwrap(), 0);
        assert!(path.exists());

        let change = service.delete(&mut conn, second.id).await.unwrap();
        let released: Vec<String> = change.released.into_iter().collect();
        assert_eq!(service.release_files(&mut conn, &released).await.unwrap(), 1);
        assert!(!path.exists());
        assert_eq!(post_count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn test_rolled_back_delete_keeps_file() {
        let pool = migrated_pool().await;
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let path = tmp.path().join(stored_name("cat.png"));

        let mut tx = pool.begin().await.unwrap();
        let ada = author(&mut tx).await;
        let post = service
            .create(&mut tx, &ada, &with_image(input("Hello", "World"), "cat.png"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let change = service.delete(&mut tx, post.id).await.unwrap();
        assert_eq!(change.released, Some(stored_name("cat.png")));
        tx.rollback().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(service.get(&mut conn, post.id).await.is_ok());
        assert!(path.exists());
        drop(conn);

        let mut tx = pool.begin().await.unwrap();
        let change = service.delete(&mut tx, post.id).await.unwrap();
        tx.commit().await.unwrap();

        let released: Vec<String> = change.released.into_iter().collect();
        let mut tx = crate::db::begin_write(&pool).await.unwrap();
        assert_eq!(service.release_files(&mut tx, &released).await.unwrap(), 1);
        tx.commit().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_create_keeps_preexisting_shared_file() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        service
            .create(&mut conn, &ada, &with_image(input("one", "1"), "shared.png"))
            .await
            .unwrap();

        // the second create fails on the tag association insert
        sqlx::query("DROP TABLE tags_posts")
            .execute(&mut *conn)
            .await
            .unwrap();
        let mut form = with_image(input("two", "2"), "shared.png");
        form.tag = "rust".to_string();
        assert!(service.create(&mut conn, &ada, &form).await.is_err());

        assert!(tmp.path().join(stored_name("shared.png")).exists());
    }

    #[tokio::test]
    async fn test_edit_repoints_tag_and_replaces_image() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let mut form = with_image(input("Hello", "World"), "old.png");
        form.tag = "rust".to_string();
        let post = service.create(&mut conn, &ada, &form).await.unwrap();

        let mut edit = with_image(input("Hello again", "World"), "new.png");
        edit.tag = "Go".to_string();
        let change = service.update(&mut conn, post.id, &edit).await.unwrap();

        assert_eq!(change.post.title, "Hello again");
        assert_eq!(change.post.file_name, Some(stored_name("new.png")));
        assert_eq!(change.released, Some(stored_name("old.png")));
        assert!(tmp.path().join(stored_name("old.png")).exists());

        let released: Vec<String> = change.released.into_iter().collect();
        service.release_files(&mut conn, &released).await.unwrap();
        assert!(!tmp.path().join(stored_name("old.png")).exists());
        assert!(tmp.path().join(stored_name("new.png")).exists());

        let tag = tag_post_repo::tag_for_post(&mut conn, post.id).await.unwrap();
        assert_eq!(tag.map(|t| t.name).as_deref(), Some("go"));
        assert_eq!(associations(&mut conn, post.id).await, 1);

        // blank tag and no image keep the current values
        let keep = service
            .update(&mut conn, post.id, &input("Third", "edit"))
            .await
            .unwrap();
        assert_eq!(keep.post.file_name, Some(stored_name("new.png")));
        assert!(keep.released.is_none());
        let tag = tag_post_repo::tag_for_post(&mut conn, post.id).await.unwrap();
        assert_eq!(tag.map(|t| t.name).as_deref(), Some("go"));
    }

    #[tokio::test]
    async fn test_edit_adds_missing_association() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);
        let ada = author(&mut conn).await;

        let post = service
            .create(&mut conn, &ada, &with_image(input("Hello", "World"), "cat.png"))
            .await
            .unwrap();
        assert_eq!(associations(&mut conn, post.id).await, 0);

        let mut edit = input("Hello", "World");
        edit.tag = "news".to_string();
        service.update(&mut conn, post.id, &edit).await.unwrap();
        assert_eq!(associations(&mut conn, post.id).await, 1);
    }

    #[tokio::test]
    async fn test_missing_post() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let service = PostService::new(Arc::new(LocalUploadStore::new(tmp.path())), MAX);

        assert!(matches!(
            service.delete(&mut conn, 7).await,
            Err(PostServiceError::NotFound(7))
        ));
        assert!(matches!(
            service.update(&mut conn, 7, &input("a", "b")).await,
            Err(PostServiceError::NotFound(7))
        ));
    }
}
