// Static site generation: fetch props through the pipeline, render pages

pub mod archive;
pub mod pipeline;
pub mod render;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use blogkit_core::config::BlogConfig;
use blogkit_core::search::SearchBox;
use blogkit_core::{BlogId, BlogState};
use pipeline::{
    buildable_ids, ArchiveMonthProps, BlogDetailProps, PageProps, StaticPipeline, TopProps,
};
use render::SiteContext;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

impl GeneratedSite {
    /// Write every page and asset below `output`
    pub fn write_to(&self, output: &Path) -> Result<()> {
        let files = self
            .pages
            .iter()
            .map(|(path, html)| (path, html.as_bytes()))
            .chain(self.assets.iter().map(|(path, data)| (path, data.as_slice())));

        for (path, data) in files {
            let target = output.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&target, data)
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }

        Ok(())
    }

    /// Add `snippet` to the end of every page body
    pub fn inject_into_pages(&mut self, snippet: &str) {
        for (_, html) in &mut self.pages {
            *html = render::inject_before_body_end(html, snippet);
        }
    }
}

/// Everything fetched for one build
pub struct SiteData {
    pub top: TopProps,
    pub pages: Vec<PageProps>,
    /// Keyed by the enumerated id, which also names the output path
    pub details: Vec<(BlogId, BlogDetailProps)>,
    pub archives: Vec<ArchiveMonthProps>,
}

/// Run every pipeline step in order. The first failure aborts the build.
pub async fn fetch_site_data(pipeline: &StaticPipeline<'_>) -> Result<SiteData> {
    let top = pipeline.get_top_props().await?;
    let pages = pipeline.get_blog_pages().await?;

    let blogs: Vec<_> = pages.iter().flat_map(|p| p.blog_list.iter().cloned()).collect();
    let ids = buildable_ids(&blogs);

    let mut details = Vec::with_capacity(ids.len());
    for id in ids {
        let detail = pipeline.get_detail_props(id.as_str()).await?;
        details.push((id, detail));
    }

    let mut archives = Vec::new();
    for entry in pipeline.get_archive_list().await? {
        archives.push(pipeline.get_archive_month_props(entry).await?);
    }

    info!(
        posts = details.len(),
        pages = pages.len(),
        archives = archives.len(),
        "Fetched site data"
    );

    Ok(SiteData {
        top,
        pages,
        details,
        archives,
    })
}

/// Populate the shared state the way the pages do on load: the top page
/// supplies categories, profile and the post list, detail pages the archive.
pub fn hydrate_state(data: &SiteData) -> BlogState {
    let mut state = BlogState::new();

    state.set_category_data(data.top.categories.clone());
    state.set_profile_data(data.top.profile.clone());

    let blog_list = data
        .pages
        .iter()
        .flat_map(|p| p.blog_list.iter().cloned())
        .collect();
    state.set_blog_data(blog_list, data.top.total_count);

    if let Some((_, detail)) = data.details.first() {
        state.set_archive(detail.archive_list.clone());
    }

    state
}

pub fn generate_site(config: &BlogConfig, data: &SiteData, state: &BlogState) -> Result<GeneratedSite> {
    let ctx = SiteContext {
        site: &config.site,
        state,
        page_size: config.blog.show_count,
    };

    let mut pages = vec![("index.html".to_string(), render::render_top(&ctx, &data.top))];

    for page in &data.pages {
        pages.push((
            format!("page/{}/index.html", page.page_num),
            render::render_page(&ctx, page),
        ));
    }

    for (id, detail) in &data.details {
        pages.push((
            format!("{}/index.html", id),
            render::render_detail(&ctx, detail),
        ));
    }

    for archive in &data.archives {
        pages.push((
            format!("archive/{}/index.html", archive.archive.link_date),
            render::render_archive_month(&ctx, archive),
        ));
    }

    let search_box = SearchBox::mount(state.blog_list().to_vec(), None);
    pages.push((
        "search/index.html".to_string(),
        render::render_search(&ctx, &search_box),
    ));
    pages.push(("404.html".to_string(), render::render_not_found(&ctx)));

    let state_json = state
        .to_json()
        .context("Failed to serialize hydrated state")?;

    let assets = vec![
        (
            "search.js".to_string(),
            render::generate_search_js().as_bytes().to_vec(),
        ),
        ("_data/state.json".to_string(), state_json.into_bytes()),
    ];

    Ok(GeneratedSite { pages, assets })
}

/// Fetch, hydrate and render in one go
pub async fn build_site(pipeline: &StaticPipeline<'_>, config: &BlogConfig) -> Result<(GeneratedSite, BlogState)> {
    let data = fetch_site_data(pipeline).await?;
    let state = hydrate_state(&data);
    let site = generate_site(config, &data, &state)?;

    Ok((site, state))
}
