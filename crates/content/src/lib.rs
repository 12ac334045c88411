// Content service contract and its microCMS implementation

pub mod microcms;

use async_trait::async_trait;
use blogkit_core::{BlogId, BlogItem, BlogList, Category, Profile};
use chrono::{DateTime, FixedOffset};

pub use microcms::MicroCmsClient;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Content service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Blog not found: {id}")]
    NotFound { id: String },

    #[error("Content service responded with {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed blog id: {0}")]
    MalformedId(String),

    #[error("Unexpected content service response: {0}")]
    Decode(String),

    #[error("Content client configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Read-only view of the headless CMS the site is built from.
///
/// Every call is a separate request; callers await them one at a time.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// One page of posts starting at `offset`, newest first
    async fn get_blogs(&self, offset: usize) -> Result<BlogList>;

    async fn get_blog_by(&self, id: &BlogId) -> Result<BlogItem>;

    /// Whether at least one post was published in `[start, end]`
    async fn is_blogs_archives(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<bool>;

    /// Every post published in `[start, end]`, newest first
    async fn get_blogs_between(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<BlogItem>>;

    async fn get_categories(&self) -> Result<Vec<Category>>;

    async fn get_profile_by(&self) -> Result<Profile>;
}
