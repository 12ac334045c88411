use super::load_config;
use anyhow::{Context, Result};
use blogkit_content::{ContentService, MicroCmsClient};
use blogkit_core::config::BlogConfig;
use blogkit_core::BlogState;
use blogkit_generator::build_site;
use blogkit_generator::pipeline::StaticPipeline;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Directory inside a blog copied verbatim into the site root
pub const STATIC_DIR: &str = "static";

/// Build static site for deployment
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building blog...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let config = load_config(&path)?;
    println!("✓ Loaded: {}", config.site.title);
    println!("  Content API: {}", config.content.base_url);
    println!();

    let client = MicroCmsClient::from_config(&config).context("Failed to create content client")?;

    println!("📡 Fetching content and rendering pages...");
    let summary = build_into(&path, &config, &client, &output, None).await?;
    println!("   ✓ Generated {} pages", summary.pages);
    println!("   ✓ Generated {} data files", summary.assets);
    println!("   ✓ Copied {} static files", summary.static_files);

    println!();
    println!("✅ Build complete!");
    println!("   Posts: {}", summary.state.total_count());
    println!("   Archive months: {}", summary.state.archive_list().len());
    println!("   Output: {}", output.display());
    println!();
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output.display());
    println!();

    Ok(())
}

pub struct BuildSummary {
    pub pages: usize,
    pub assets: usize,
    pub static_files: usize,
    pub state: BlogState,
}

/// Run the pipeline against `service` and write the result below `output`.
///
/// `page_snippet` is appended to every page body; the preview server uses it
/// for its reload hook.
pub async fn build_into(
    path: &Path,
    config: &BlogConfig,
    service: &dyn ContentService,
    output: &Path,
    page_snippet: Option<&str>,
) -> Result<BuildSummary> {
    let pipeline = StaticPipeline::new(service, config);
    let (mut site, state) = build_site(&pipeline, config).await?;

    if let Some(snippet) = page_snippet {
        site.inject_into_pages(snippet);
    }

    fs::create_dir_all(output).context("Failed to create output directory")?;
    site.write_to(output)?;

    let static_files = copy_static(&path.join(STATIC_DIR), output)?;

    info!(
        pages = site.pages.len(),
        assets = site.assets.len(),
        static_files,
        output = %output.display(),
        "Site written"
    );

    Ok(BuildSummary {
        pages: site.pages.len(),
        assets: site.assets.len(),
        static_files,
        state,
    })
}

/// Copy everything under `src` into `output`, keeping relative paths.
/// A missing `src` copies nothing.
fn copy_static(src: &Path, output: &Path) -> Result<usize> {
    if !src.exists() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.context("Failed to read static directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(src)
            .context("Static file outside static directory")?;
        let dst = output.join(relative);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::copy(entry.path(), &dst)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        copied += 1;
    }

    Ok(copied)
}
