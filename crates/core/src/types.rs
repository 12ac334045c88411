use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image shown when a post has no eyecatch of its own
pub const NO_IMAGE_URL: &str = "/no_image.png";

/// Rendered size of the eyecatch on the post page (498x332 scaled by 1.5)
pub const DETAIL_IMAGE_WIDTH: u32 = 747;
pub const DETAIL_IMAGE_HEIGHT: u32 = 498;

/// A single blog post as returned by the content service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogItem {
    pub id: String,
    pub title: String,
    /// Post body, already rendered to HTML by the content service
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<FixedOffset>>,
}

impl BlogItem {
    /// Eyecatch URL, falling back to the placeholder image
    pub fn image_url(&self) -> &str {
        self.image
            .as_ref()
            .map(|image| image.url.as_str())
            .unwrap_or(NO_IMAGE_URL)
    }

    /// Site path of the post detail page
    pub fn path(&self) -> String {
        format!("/{}", self.id)
    }
}

/// Image reference attached to a post or profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Site owner metadata, one per build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

/// One page of posts plus the total number of posts available
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogList {
    pub blog_list: Vec<BlogItem>,
    pub total_count: usize,
}

/// A calendar month that is known to contain at least one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    /// Canonical date key, e.g. `2020-03-01`
    pub origin_date: String,
    /// URL fragment, e.g. `2020-03`
    pub link_date: String,
    /// Display label, e.g. `2020年03月`
    pub show_date: String,
}

impl ArchiveEntry {
    /// Site path of the archive listing for this month
    pub fn path(&self) -> String {
        format!("/archive/{}", self.link_date)
    }
}

/// Validated post identifier usable as a single URL path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlogId(String);

impl BlogId {
    /// Parse a raw route parameter into an identifier.
    ///
    /// Only ASCII alphanumerics, `-` and `_` are accepted so that the id can
    /// be used verbatim as a directory name and URL segment.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidData("Empty blog id".to_string()));
        }

        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(Error::InvalidData(format!(
                "Invalid character '{}' in blog id '{}'",
                c, raw
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
