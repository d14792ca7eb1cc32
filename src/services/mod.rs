//! Services layer - Business logic
//!
//! Services validate input, enforce ownership rules and coordinate the
//! repositories with the upload store. They run on the connection handed in by
//! the caller, normally the request's transaction.

pub mod comment;
pub mod naming;
pub mod oauth;
pub mod password;
pub mod post;
pub mod tag;
pub mod upload;
pub mod user;
pub mod validation;

pub use comment::CommentServiceError;
pub use oauth::{GithubOAuth, OAuthError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use tag::{normalize_tag_name, TagServiceError};
pub use upload::{LocalUploadStore, UploadError, UploadStore};
pub use user::{ProviderProfile, UserServiceError};
pub use validation::{FieldError, FieldErrors};
