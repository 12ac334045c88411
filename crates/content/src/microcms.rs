// microCMS REST API client

use crate::{ContentError, ContentService, Result};
use async_trait::async_trait;
use blogkit_core::config::BlogConfig;
use blogkit_core::{BlogId, BlogItem, BlogList, Category, Profile};
use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const API_KEY_HEADER: &str = "x-microcms-api-key";

/// Largest `limit` the list API accepts
const MAX_LIMIT: usize = 100;

/// List API response wrapper
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    contents: Vec<T>,
    total_count: usize,
}

/// Names of the API endpoints the site reads from
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub blogs: String,
    pub categories: String,
    pub profile: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            blogs: "blogs".to_string(),
            categories: "categories".to_string(),
            profile: "profile".to_string(),
        }
    }
}

/// microCMS API client
pub struct MicroCmsClient {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
    page_size: usize,
}

impl MicroCmsClient {
    /// Create new client against `base_url` (e.g. `https://my-blog.microcms.io`)
    pub fn new(
        base_url: &str,
        api_key: &str,
        page_size: usize,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|e| ContentError::Config(format!("Invalid API key: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints,
            page_size: page_size.max(1),
        })
    }

    /// Build a client from blog.toml, reading the API key from the environment
    pub fn from_config(config: &BlogConfig) -> Result<Self> {
        let api_key = std::env::var(&config.content.api_key_env).map_err(|_| {
            ContentError::Config(format!(
                "Environment variable {} is not set",
                config.content.api_key_env
            ))
        })?;

        Self::new(
            &config.content.base_url,
            &api_key,
            config.blog.show_count,
            Endpoints {
                blogs: config.content.blogs_endpoint.clone(),
                categories: config.content.categories_endpoint.clone(),
                profile: config.content.profile_endpoint.clone(),
            },
        )
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, endpoint)
    }

    /// GET and decode, mapping non-success statuses to `ContentError::Api`
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(url, ?query, "Fetching from content service");

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ContentError::Decode(e.to_string()))
    }

    async fn list_blogs(
        &self,
        offset: usize,
        limit: usize,
        filters: Option<String>,
    ) -> Result<ListResponse<BlogItem>> {
        let mut query = vec![
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("orders", "-publishedAt".to_string()),
        ];
        if let Some(filters) = filters {
            query.push(("filters", filters));
        }

        self.get_json(&self.url(&self.endpoints.blogs), &query).await
    }
}

/// `publishedAt` filter matching `[start, end]` inclusively.
///
/// The API only has strict comparisons, so each bound is pushed out by the
/// smallest step a timestamp can carry.
fn published_between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> String {
    let step = TimeDelta::milliseconds(1);
    format!(
        "publishedAt[greater_than]{}[and]publishedAt[less_than]{}",
        api_timestamp(start - step),
        api_timestamp(end + step)
    )
}

fn api_timestamp(date: DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl ContentService for MicroCmsClient {
    async fn get_blogs(&self, offset: usize) -> Result<BlogList> {
        let response = self.list_blogs(offset, self.page_size, None).await?;

        Ok(BlogList {
            blog_list: response.contents,
            total_count: response.total_count,
        })
    }

    async fn get_blog_by(&self, id: &BlogId) -> Result<BlogItem> {
        let url = format!("{}/{}", self.url(&self.endpoints.blogs), id);

        match self.get_json(&url, &[]).await {
            Err(ContentError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ContentError::NotFound { id: id.to_string() })
            }
            other => other,
        }
    }

    async fn is_blogs_archives(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<bool> {
        let query = [
            ("limit", "1".to_string()),
            ("fields", "id".to_string()),
            ("filters", published_between(start, end)),
        ];
        let response: ListResponse<serde_json::Value> = self
            .get_json(&self.url(&self.endpoints.blogs), &query)
            .await?;

        Ok(response.total_count > 0)
    }

    async fn get_blogs_between(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<BlogItem>> {
        let mut blogs = Vec::new();

        loop {
            let response = self
                .list_blogs(blogs.len(), MAX_LIMIT, Some(published_between(start, end)))
                .await?;
            let fetched = response.contents.len();
            blogs.extend(response.contents);

            if fetched == 0 || blogs.len() >= response.total_count {
                break;
            }
        }

        Ok(blogs)
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        let query = [("limit", MAX_LIMIT.to_string())];
        let response: ListResponse<Category> = self
            .get_json(&self.url(&self.endpoints.categories), &query)
            .await?;

        Ok(response.contents)
    }

    async fn get_profile_by(&self) -> Result<Profile> {
        self.get_json(&self.url(&self.endpoints.profile), &[]).await
    }
}
