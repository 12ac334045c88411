//! Build-time data assembly.
//!
//! Each method produces the props one kind of page is rendered from. All
//! content service calls are awaited one after another, and any failure
//! aborts the page being assembled.

use crate::archive::assemble_archive;
use anyhow::{Context, Result};
use blogkit_content::{ContentError, ContentService};
use blogkit_core::config::BlogConfig;
use blogkit_core::dates::{get_blog_start_date, MonthRange};
use blogkit_core::pagination::{create_page_array, page_offset};
use blogkit_core::{ArchiveEntry, BlogId, BlogItem, Category, Profile};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Props of the top page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProps {
    pub blog_list: Vec<BlogItem>,
    pub total_count: usize,
    pub categories: Vec<Category>,
    pub profile: Profile,
}

/// Props of one numbered listing page (`/page/<n>/`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProps {
    pub page_num: usize,
    pub blog_list: Vec<BlogItem>,
    pub total_count: usize,
}

/// Props of a post detail page (`/<id>/`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetailProps {
    pub blog: BlogItem,
    pub categories: Vec<Category>,
    pub profile: Profile,
    pub archive_list: Vec<ArchiveEntry>,
}

/// Props of one archive month listing (`/archive/<YYYY-MM>/`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMonthProps {
    pub archive: ArchiveEntry,
    pub blog_list: Vec<BlogItem>,
}

pub struct StaticPipeline<'a> {
    service: &'a dyn ContentService,
    config: &'a BlogConfig,
    current_date: DateTime<FixedOffset>,
    archive: OnceCell<Vec<ArchiveEntry>>,
}

impl<'a> StaticPipeline<'a> {
    pub fn new(service: &'a dyn ContentService, config: &'a BlogConfig) -> Self {
        Self {
            service,
            config,
            current_date: config.current_date(),
            archive: OnceCell::new(),
        }
    }

    /// Pin "now", mostly so archive ranges are reproducible
    pub fn with_current_date(mut self, current_date: DateTime<FixedOffset>) -> Self {
        self.current_date = current_date;
        self
    }

    fn page_size(&self) -> usize {
        self.config.blog.show_count
    }

    pub async fn get_top_props(&self) -> Result<TopProps> {
        let blog_data = self
            .service
            .get_blogs(0)
            .await
            .context("Failed to fetch first page of blogs")?;
        let categories = self.fetch_categories().await?;
        let profile = self.fetch_profile().await?;

        Ok(TopProps {
            blog_list: blog_data.blog_list,
            total_count: blog_data.total_count,
            categories,
            profile,
        })
    }

    /// Every listing page with its posts.
    ///
    /// The first request (offset 0) supplies the total count and doubles as
    /// page one, so `n` pages cost exactly `n` requests.
    pub async fn get_blog_pages(&self) -> Result<Vec<PageProps>> {
        let first = self
            .service
            .get_blogs(0)
            .await
            .context("Failed to fetch blog count")?;
        let total_count = first.total_count;
        let page_count_array = create_page_array(total_count, self.page_size());

        let mut first = Some(first);
        let mut pages = Vec::with_capacity(page_count_array.len());

        for page_num in page_count_array {
            let blog_data = match first.take() {
                Some(first) if page_num == 1 => first,
                _ => {
                    let offset = page_offset(page_num, self.page_size());
                    self.service
                        .get_blogs(offset)
                        .await
                        .with_context(|| format!("Failed to fetch blogs at offset {}", offset))?
                }
            };

            debug!(page_num, count = blog_data.blog_list.len(), "Fetched blog page");
            pages.push(PageProps {
                page_num,
                blog_list: blog_data.blog_list,
                total_count,
            });
        }

        info!(total_count, pages = pages.len(), "Enumerated blog pages");
        Ok(pages)
    }

    /// `/<id>` for every buildable post
    pub async fn get_static_paths(&self) -> Result<Vec<String>> {
        let pages = self.get_blog_pages().await?;
        let blogs: Vec<BlogItem> = pages.into_iter().flat_map(|p| p.blog_list).collect();

        Ok(buildable_ids(&blogs)
            .iter()
            .map(|id| format!("/{}", id))
            .collect())
    }

    /// Props for one post. A malformed or unknown id fails the page.
    pub async fn get_detail_props(&self, blog_id: &str) -> Result<BlogDetailProps> {
        let id = BlogId::parse(blog_id)
            .map_err(|_| ContentError::MalformedId(blog_id.to_string()))?;

        let mut blog = self
            .service
            .get_blog_by(&id)
            .await
            .with_context(|| format!("Failed to fetch blog {}", id))?;
        let categories = self.fetch_categories().await?;
        let profile = self.fetch_profile().await?;
        let archive_list = self.get_archive_list().await?.to_vec();

        if self.config.content.sanitize_body {
            blog.body = ammonia::clean(&blog.body);
        }

        Ok(BlogDetailProps {
            blog,
            categories,
            profile,
            archive_list,
        })
    }

    /// Archive months, computed on first use and reused for the rest of the build
    pub async fn get_archive_list(&self) -> Result<&[ArchiveEntry]> {
        let archive = self
            .archive
            .get_or_try_init(|| async {
                let archive = assemble_archive(
                    self.service,
                    self.current_date,
                    self.config.blog_start_date(),
                    &self.config.blog.archive_display_format,
                )
                .await
                .context("Failed to assemble archive")?;

                info!(months = archive.len(), "Assembled archive");
                Ok::<_, anyhow::Error>(archive)
            })
            .await?;

        Ok(archive.as_slice())
    }

    /// Posts published during one archive month
    pub async fn get_archive_month_props(&self, archive: &ArchiveEntry) -> Result<ArchiveMonthProps> {
        let month = month_of(archive, self.config.blog.utc_offset)?;

        let blog_list = self
            .service
            .get_blogs_between(month.start, month.end)
            .await
            .with_context(|| format!("Failed to fetch blogs for {}", archive.link_date))?;

        Ok(ArchiveMonthProps {
            archive: archive.clone(),
            blog_list,
        })
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.service
            .get_categories()
            .await
            .context("Failed to fetch categories")
    }

    async fn fetch_profile(&self) -> Result<Profile> {
        self.service
            .get_profile_by()
            .await
            .context("Failed to fetch profile")
    }
}

/// Top-level path segments owned by generated routes
pub const RESERVED_IDS: &[&str] = &["page", "archive", "search", "_data"];

/// Ids usable as paths, in listing order. Malformed ids and ids that would
/// shadow a generated route are left out so they fall through to the
/// not-found page; repeats are collapsed.
pub fn buildable_ids(blogs: &[BlogItem]) -> Vec<BlogId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(blogs.len());

    for blog in blogs {
        match BlogId::parse(&blog.id) {
            Ok(id) if RESERVED_IDS.contains(&id.as_str()) => {
                warn!(id = %id, "Blog id collides with a generated route, skipping");
            }
            Ok(id) => {
                if seen.insert(id.clone()) {
                    ids.push(id);
                } else {
                    warn!(id = %id, "Duplicate blog id, skipping");
                }
            }
            Err(e) => warn!(id = %blog.id, "Skipping blog: {}", e),
        }
    }

    ids
}

/// Recover the month range an archive entry was built from
fn month_of(archive: &ArchiveEntry, offset: FixedOffset) -> Result<MonthRange> {
    let day = NaiveDate::parse_from_str(&archive.origin_date, "%Y-%m-%d")
        .with_context(|| format!("Invalid archive date {}", archive.origin_date))?;
    Ok(MonthRange::containing(get_blog_start_date(day, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blog, jst, FakeContent};
    use blogkit_core::config::parse_blog_toml_str;

    fn config(show_count: usize, sanitize: bool) -> BlogConfig {
        parse_blog_toml_str(&format!(
            r#"
[site]
title = "Test"

[blog]
show_count = {}
start_date = "2020-01-01"

[content]
service_domain = "test"
sanitize_body = {}
"#,
            show_count, sanitize
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_paths_fetch_each_page_once() {
        let service = FakeContent::new(12);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        let paths = pipeline.get_static_paths().await.unwrap();

        assert_eq!(paths.len(), 12);
        assert_eq!(paths[0], "/post00");
        assert_eq!(paths[11], "/post11");
        assert_eq!(service.offsets(), vec![0, 5, 10]);
    }

    #[tokio::test]
    async fn test_no_posts_no_pages() {
        let service = FakeContent::new(0);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        assert!(pipeline.get_blog_pages().await.unwrap().is_empty());
        assert!(pipeline.get_static_paths().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blog_pages_are_numbered_and_sized() {
        let service = FakeContent::new(7);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        let pages = pipeline.get_blog_pages().await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_num, 1);
        assert_eq!(pages[0].blog_list.len(), 5);
        assert_eq!(pages[1].blog_list.len(), 2);
        assert!(pages.iter().all(|p| p.total_count == 7));
    }

    #[test]
    fn test_buildable_ids_skip_malformed_and_duplicates() {
        let blogs = vec![
            blog("a1", "A"),
            blog("../x", "Bad"),
            blog("b2", "B"),
            blog("a1", "A again"),
        ];
        let ids: Vec<String> = buildable_ids(&blogs).iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
    }

    #[test]
    fn test_buildable_ids_skip_generated_route_names() {
        let blogs = vec![
            blog("search", "Search"),
            blog("page", "Page"),
            blog("archive", "Archive"),
            blog("_data", "Data"),
            blog("searching", "Fine"),
        ];
        let ids: Vec<String> = buildable_ids(&blogs).iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["searching"]);
    }

    #[tokio::test]
    async fn test_top_props() {
        let service = FakeContent::new(7);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        let props = pipeline.get_top_props().await.unwrap();
        assert_eq!(props.blog_list.len(), 5);
        assert_eq!(props.total_count, 7);
        assert_eq!(props.categories[0].name, "Rust");
        assert_eq!(props.profile.name, "Owner");
        // top page never asks about archive months
        assert!(service.archive_queries().is_empty());
    }

    #[tokio::test]
    async fn test_detail_props_bundle_archive() {
        let service = FakeContent::new(3).with_archive_months(&["2020-01", "2020-03"]);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config).with_current_date(jst(2020, 3, 15));

        let props = pipeline.get_detail_props("post01").await.unwrap();
        assert_eq!(props.blog.title, "Post 1");
        assert_eq!(props.profile.name, "Owner");
        let links: Vec<&str> = props.archive_list.iter().map(|a| a.link_date.as_str()).collect();
        assert_eq!(links, vec!["2020-03", "2020-01"]);
    }

    #[tokio::test]
    async fn test_archive_is_assembled_once_per_build() {
        let service = FakeContent::new(3).with_archive_months(&["2020-02"]);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config).with_current_date(jst(2020, 3, 15));

        pipeline.get_detail_props("post00").await.unwrap();
        pipeline.get_detail_props("post01").await.unwrap();

        assert_eq!(service.archive_queries().len(), 3);
    }

    #[tokio::test]
    async fn test_detail_props_malformed_id() {
        let service = FakeContent::new(1);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        let err = pipeline.get_detail_props("../etc/passwd").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::MalformedId(_))
        ));
    }

    #[tokio::test]
    async fn test_detail_props_not_found() {
        let service = FakeContent::new(1);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        let err = pipeline.get_detail_props("nope").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_detail_props_fail_fast_on_profile_error() {
        let service = FakeContent::new(1).failing_profile();
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config).with_current_date(jst(2020, 3, 15));

        let err = pipeline.get_detail_props("post00").await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch profile"));
        // archive is never reached
        assert!(service.archive_queries().is_empty());
    }

    #[tokio::test]
    async fn test_detail_props_archive_failure_aborts() {
        let service = FakeContent::new(1).failing_archive_month("2020-02");
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config).with_current_date(jst(2020, 3, 15));

        assert!(pipeline.get_detail_props("post00").await.is_err());
    }

    #[tokio::test]
    async fn test_sanitize_body_strips_scripts() {
        let mut item = blog("x1", "Unsafe");
        item.body = "<p>ok</p><script>alert(1)</script>".to_string();

        let service = FakeContent::new(0).with_blogs(vec![item.clone()]);
        let sanitizing = config(5, true);
        let trusted = config(5, false);

        let pipeline =
            StaticPipeline::new(&service, &sanitizing).with_current_date(jst(2020, 1, 15));
        let props = pipeline.get_detail_props("x1").await.unwrap();
        assert_eq!(props.blog.body, "<p>ok</p>");

        let pipeline = StaticPipeline::new(&service, &trusted).with_current_date(jst(2020, 1, 15));
        let props = pipeline.get_detail_props("x1").await.unwrap();
        assert_eq!(props.blog.body, item.body);
    }

    #[tokio::test]
    async fn test_archive_month_props() {
        let mut march = blog("m1", "March post");
        march.published_at = Some(jst(2020, 3, 31));
        let mut april = blog("a1", "April post");
        april.published_at = Some(jst(2020, 4, 1));

        let service = FakeContent::new(0).with_blogs(vec![march, april]);
        let config = config(5, false);
        let pipeline = StaticPipeline::new(&service, &config);

        let entry = ArchiveEntry {
            origin_date: "2020-03-01".to_string(),
            link_date: "2020-03".to_string(),
            show_date: "2020年03月".to_string(),
        };
        let props = pipeline.get_archive_month_props(&entry).await.unwrap();
        assert_eq!(props.blog_list.len(), 1);
        assert_eq!(props.blog_list[0].id, "m1");
    }
}
