pub mod build;
pub mod check;
pub mod init;
pub mod preview;

use anyhow::{Context, Result};
use blogkit_core::config::{parse_blog_toml, BlogConfig, CONFIG_FILE};
use std::path::Path;

/// Load blog.toml from a blog directory, with hints when it is missing
pub fn load_config(path: &Path) -> Result<BlogConfig> {
    if !path.exists() {
        anyhow::bail!("Blog directory does not exist: {}", path.display());
    }

    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'blogkit init {}' first",
            CONFIG_FILE,
            path.display(),
            path.display()
        );
    }

    parse_blog_toml(&config_path).with_context(|| format!("Failed to parse {}", CONFIG_FILE))
}
