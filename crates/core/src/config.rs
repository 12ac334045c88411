use crate::dates::{self, DEFAULT_SHOW_FORMAT};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the configuration file inside a blog directory
pub const CONFIG_FILE: &str = "blog.toml";

const DEFAULT_SHOW_COUNT: usize = 5;
const DEFAULT_UTC_OFFSET: &str = "+09:00";
const DEFAULT_API_KEY_ENV: &str = "MICROCMS_API_KEY";

/// Raw TOML configuration structure
/// This matches the blog.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    blog: RawBlog,
    content: RawContent,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    title: String,
    description: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlog {
    show_count: Option<usize>,
    start_date: String, // Parse as NaiveDate
    utc_offset: Option<String>,
    archive_display_format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    service_domain: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    blogs_endpoint: Option<String>,
    categories_endpoint: Option<String>,
    profile_endpoint: Option<String>,
    #[serde(default)]
    sanitize_body: bool,
}

/// Validated blog configuration
#[derive(Debug, Clone)]
pub struct BlogConfig {
    pub site: SiteConfig,
    pub blog: BlogSettings,
    pub content: ContentConfig,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub title: String,
    pub description: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlogSettings {
    /// Posts per listing page
    pub show_count: usize,
    pub start_date: NaiveDate,
    pub utc_offset: FixedOffset,
    pub archive_display_format: String,
}

#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Base URL of the content API, without trailing slash
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub blogs_endpoint: String,
    pub categories_endpoint: String,
    pub profile_endpoint: String,
    /// Run post bodies through the HTML sanitizer before rendering
    pub sanitize_body: bool,
}

impl BlogConfig {
    /// The configured epoch of the blog, at local midnight
    pub fn blog_start_date(&self) -> DateTime<FixedOffset> {
        dates::get_blog_start_date(self.blog.start_date, self.blog.utc_offset)
    }

    pub fn current_date(&self) -> DateTime<FixedOffset> {
        dates::get_current_date(self.blog.utc_offset)
    }
}

/// Parse blog.toml from a file path
pub fn parse_blog_toml<P: AsRef<Path>>(path: P) -> Result<BlogConfig> {
    let content = fs::read_to_string(path)?;
    parse_blog_toml_str(&content)
}

/// Parse blog.toml from a string (useful for testing)
pub fn parse_blog_toml_str(content: &str) -> Result<BlogConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.site.title.trim().is_empty() {
        return Err(Error::ConfigParse("site.title cannot be empty".to_string()));
    }

    let show_count = raw.blog.show_count.unwrap_or(DEFAULT_SHOW_COUNT);
    if show_count == 0 {
        return Err(Error::ConfigParse(
            "blog.show_count must be at least 1".to_string(),
        ));
    }

    let start_date = NaiveDate::parse_from_str(&raw.blog.start_date, "%Y-%m-%d")
        .map_err(|e| Error::ConfigParse(format!("Invalid blog.start_date: {}", e)))?;

    let utc_offset =
        parse_utc_offset(raw.blog.utc_offset.as_deref().unwrap_or(DEFAULT_UTC_OFFSET))?;

    let archive_display_format = raw
        .blog
        .archive_display_format
        .unwrap_or_else(|| DEFAULT_SHOW_FORMAT.to_string());
    if !dates::is_valid_format(&archive_display_format) {
        return Err(Error::ConfigParse(format!(
            "Invalid blog.archive_display_format '{}'",
            archive_display_format
        )));
    }

    let base_url = resolve_base_url(
        raw.content.endpoint.as_deref(),
        raw.content.service_domain.as_deref(),
    )?;

    let blog = BlogSettings {
        show_count,
        start_date,
        utc_offset,
        archive_display_format,
    };

    let content = ContentConfig {
        base_url,
        api_key_env: raw
            .content
            .api_key_env
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
        blogs_endpoint: raw.content.blogs_endpoint.unwrap_or_else(|| "blogs".to_string()),
        categories_endpoint: raw
            .content
            .categories_endpoint
            .unwrap_or_else(|| "categories".to_string()),
        profile_endpoint: raw
            .content
            .profile_endpoint
            .unwrap_or_else(|| "profile".to_string()),
        sanitize_body: raw.content.sanitize_body,
    };

    tracing::debug!(
        show_count = blog.show_count,
        start_date = %blog.start_date,
        base_url = %content.base_url,
        "Parsed blog configuration"
    );

    Ok(BlogConfig {
        site: SiteConfig {
            title: raw.site.title,
            description: raw.site.description,
            base_url: raw.site.base_url,
        },
        blog,
        content,
    })
}

/// Parse a `+HH:MM` / `-HH:MM` offset.
fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let invalid = || {
        Error::ConfigParse(format!(
            "Invalid blog.utc_offset '{}', expected +HH:MM",
            s
        ))
    };

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// An explicit endpoint wins over the service domain shorthand.
fn resolve_base_url(endpoint: Option<&str>, service_domain: Option<&str>) -> Result<String> {
    if let Some(endpoint) = endpoint {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::ConfigParse(format!(
                "content.endpoint must be an http(s) URL: '{}'",
                endpoint
            )));
        }
        return Ok(endpoint.to_string());
    }

    match service_domain.map(str::trim) {
        Some(domain)
            if !domain.is_empty()
                && domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            Ok(format!("https://{}.microcms.io", domain))
        }
        Some(domain) => Err(Error::ConfigParse(format!(
            "Invalid content.service_domain '{}'",
            domain
        ))),
        None => Err(Error::ConfigParse(
            "content.service_domain or content.endpoint is required".to_string(),
        )),
    }
}
