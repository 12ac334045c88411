use super::load_config;
use std::path::PathBuf;

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Checking blog at: {}", path.display());

    let config = load_config(&path)?;

    println!("✓ blog.toml valid");
    println!("  Site: {}", config.site.title);
    println!("  Content API: {}", config.content.base_url);
    println!("  Posts per page: {}", config.blog.show_count);
    println!(
        "  Blog started: {} (UTC{})",
        config.blog.start_date, config.blog.utc_offset
    );

    if std::env::var_os(&config.content.api_key_env).is_some() {
        println!("✓ API key found in ${}", config.content.api_key_env);
    } else {
        println!(
            "⚠ ${} is not set; build and preview will fail",
            config.content.api_key_env
        );
    }

    if config.content.sanitize_body {
        println!("  Post bodies will be sanitized before rendering");
    }

    Ok(())
}
