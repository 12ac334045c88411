// In-memory content service for pipeline tests

use async_trait::async_trait;
use blogkit_content::{ContentError, ContentService, Result};
use blogkit_core::dates::change_year_month;
use blogkit_core::{BlogId, BlogItem, BlogList, Category, Profile};
use chrono::{DateTime, FixedOffset, TimeZone};
use std::collections::HashSet;
use std::sync::Mutex;

pub fn jst(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, 12, 0, 0)
        .unwrap()
}

pub fn blog(id: &str, title: &str) -> BlogItem {
    BlogItem {
        id: id.to_string(),
        title: title.to_string(),
        body: format!("<p>{} body</p>", title),
        image: None,
        categories: vec![Category {
            id: "rust".to_string(),
            name: "Rust".to_string(),
        }],
        published_at: Some(jst(2020, 3, 10)),
    }
}

pub struct FakeContent {
    blogs: Vec<BlogItem>,
    page_size: usize,
    archive_months: HashSet<String>,
    failing_archive_month: Option<String>,
    fail_profile: bool,
    offsets: Mutex<Vec<usize>>,
    archive_queries: Mutex<Vec<String>>,
}

impl FakeContent {
    /// `total` posts with ids `post00`, `post01`, ... and a page size of 5
    pub fn new(total: usize) -> Self {
        Self {
            blogs: (0..total)
                .map(|i| blog(&format!("post{:02}", i), &format!("Post {}", i)))
                .collect(),
            page_size: 5,
            archive_months: HashSet::new(),
            failing_archive_month: None,
            fail_profile: false,
            offsets: Mutex::new(Vec::new()),
            archive_queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_blogs(mut self, blogs: Vec<BlogItem>) -> Self {
        self.blogs = blogs;
        self
    }

    pub fn with_archive_months(mut self, months: &[&str]) -> Self {
        self.archive_months = months.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn failing_archive_month(mut self, month: &str) -> Self {
        self.failing_archive_month = Some(month.to_string());
        self
    }

    pub fn failing_profile(mut self) -> Self {
        self.fail_profile = true;
        self
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn archive_queries(&self) -> Vec<String> {
        self.archive_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentService for FakeContent {
    async fn get_blogs(&self, offset: usize) -> Result<BlogList> {
        self.offsets.lock().unwrap().push(offset);

        let end = (offset + self.page_size).min(self.blogs.len());
        let blog_list = self.blogs.get(offset..end).unwrap_or_default().to_vec();

        Ok(BlogList {
            blog_list,
            total_count: self.blogs.len(),
        })
    }

    async fn get_blog_by(&self, id: &BlogId) -> Result<BlogItem> {
        self.blogs
            .iter()
            .find(|b| b.id == id.as_str())
            .cloned()
            .ok_or_else(|| ContentError::NotFound { id: id.to_string() })
    }

    async fn is_blogs_archives(
        &self,
        start: DateTime<FixedOffset>,
        _end: DateTime<FixedOffset>,
    ) -> Result<bool> {
        let month = change_year_month(start);
        self.archive_queries.lock().unwrap().push(month.clone());

        if self.failing_archive_month.as_deref() == Some(month.as_str()) {
            return Err(ContentError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        Ok(self.archive_months.contains(&month))
    }

    async fn get_blogs_between(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<BlogItem>> {
        Ok(self
            .blogs
            .iter()
            .filter(|b| b.published_at.is_some_and(|p| p >= start && p <= end))
            .cloned()
            .collect())
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        Ok(vec![Category {
            id: "rust".to_string(),
            name: "Rust".to_string(),
        }])
    }

    async fn get_profile_by(&self) -> Result<Profile> {
        if self.fail_profile {
            return Err(ContentError::Api {
                status: 500,
                message: "profile down".to_string(),
            });
        }

        Ok(Profile {
            name: "Owner".to_string(),
            description: Some("Writes about Rust".to_string()),
            image: None,
        })
    }
}
