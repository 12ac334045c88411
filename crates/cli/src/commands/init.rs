use anyhow::{Context, Result};
use blogkit_core::config::{parse_blog_toml_str, CONFIG_FILE};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SERVICE_DOMAIN: &str = "your-service";

/// 1x1 transparent PNG served as `/no_image.png` until a real placeholder is added
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Escape a string for a TOML basic string.
///
/// The template is written by hand so its comments survive, which rules out
/// serializing through the toml crate.
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Initialize a new blog directory.
///
/// Writes a commented blog.toml and a `static/` directory holding the
/// placeholder image used for posts without an eyecatch. Refuses to touch a
/// directory that already has a blog.toml.
pub async fn run(
    path: PathBuf,
    title: Option<String>,
    service_domain: Option<String>,
) -> Result<()> {
    println!("🆕 Initializing blog at: {}", path.display());

    if !path.exists() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists in {}",
            CONFIG_FILE,
            path.display()
        );
    }

    let title = title.unwrap_or_else(|| default_title(&path));
    let service_domain = service_domain.unwrap_or_else(|| DEFAULT_SERVICE_DOMAIN.to_string());
    let start_date = Local::now().format("%Y-%m-%d").to_string();

    let toml = generate_blog_toml(&title, &service_domain, &start_date);
    parse_blog_toml_str(&toml).context("Generated blog.toml is invalid")?;

    fs::write(&config_path, toml)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("   ✓ Created {}", CONFIG_FILE);

    create_static_dir(&path)?;
    println!("   ✓ Created static/");

    println!();
    println!("✅ Blog initialized!");
    println!();
    println!("Next steps:");
    println!("   1. Edit {} with your microCMS settings", config_path.display());
    println!("   2. export MICROCMS_API_KEY=...");
    println!("   3. blogkit preview {}", path.display());

    Ok(())
}

fn default_title(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "My Blog".to_string())
}

fn create_static_dir(base: &Path) -> Result<()> {
    let static_dir = base.join("static");
    fs::create_dir_all(&static_dir).context("Failed to create static directory")?;

    let placeholder = static_dir.join("no_image.png");
    if !placeholder.exists() {
        fs::write(&placeholder, PLACEHOLDER_PNG).context("Failed to write no_image.png")?;
    }

    Ok(())
}

fn generate_blog_toml(title: &str, service_domain: &str, start_date: &str) -> String {
    format!(
        r#"# Blog configuration

[site]
title = "{title}"
# description = "What this blog is about"
# base_url = "https://blog.example.com"

[blog]
# Posts per listing page
show_count = 5
# First month that appears in the archive
start_date = "{start_date}"
# Offset used for "now" and month boundaries
utc_offset = "+09:00"
# strftime pattern for archive labels
archive_display_format = "%Y年%m月"

[content]
# https://<service_domain>.microcms.io, or set `endpoint` to a full URL instead
service_domain = "{service_domain}"
# Environment variable holding the API key
api_key_env = "MICROCMS_API_KEY"
# blogs_endpoint = "blogs"
# categories_endpoint = "categories"
# profile_endpoint = "profile"
# Run post bodies through an HTML sanitizer
sanitize_body = false
"#,
        title = toml_escape_string(title),
        start_date = start_date,
        service_domain = toml_escape_string(service_domain),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toml_escape_string() {
        assert_eq!(toml_escape_string("plain"), "plain");
        assert_eq!(toml_escape_string(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(toml_escape_string("a\\b"), "a\\\\b");
        assert_eq!(toml_escape_string("line\nbreak\ttab"), "line\\nbreak\\ttab");
    }

    #[test]
    fn test_generate_blog_toml_parses() {
        let toml = generate_blog_toml("Tech Notes", "my-blog", "2021-04-01");
        let config = parse_blog_toml_str(&toml).unwrap();

        assert_eq!(config.site.title, "Tech Notes");
        assert_eq!(config.content.base_url, "https://my-blog.microcms.io");
        assert_eq!(config.blog.show_count, 5);
        assert_eq!(config.blog.start_date.to_string(), "2021-04-01");
        assert!(!config.content.sanitize_body);
    }

    #[test]
    fn test_generate_blog_toml_with_special_characters() {
        let toml = generate_blog_toml("Ed's \"Notes\"\\Log", "my-blog", "2021-04-01");
        let config = parse_blog_toml_str(&toml).unwrap();

        assert_eq!(config.site.title, "Ed's \"Notes\"\\Log");
    }

    #[test]
    fn test_create_static_dir_writes_placeholder() {
        let dir = TempDir::new().unwrap();
        create_static_dir(dir.path()).unwrap();

        let placeholder = dir.path().join("static/no_image.png");
        assert!(placeholder.exists());
        assert_eq!(&fs::read(placeholder).unwrap()[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_create_static_dir_keeps_existing_placeholder() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/no_image.png"), b"custom").unwrap();

        create_static_dir(dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join("static/no_image.png")).unwrap(), b"custom");
    }

    #[tokio::test]
    async fn test_run_creates_config() {
        let dir = TempDir::new().unwrap();

        run(dir.path().to_path_buf(), Some("Blog".to_string()), Some("svc".to_string()))
            .await
            .unwrap();

        let config = blogkit_core::parse_blog_toml(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.site.title, "Blog");
        assert_eq!(config.content.base_url, "https://svc.microcms.io");
    }

    #[tokio::test]
    async fn test_run_refuses_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "# mine").unwrap();

        let result = run(dir.path().to_path_buf(), None, None).await;

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(), "# mine");
    }

    #[tokio::test]
    async fn test_run_requires_existing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        assert!(run(missing, None, None).await.is_err());
    }
}
