pub mod config;
pub mod dates;
pub mod error;
pub mod pagination;
pub mod search;
pub mod state;
pub mod types;

pub use config::{parse_blog_toml, BlogConfig};
pub use error::{Error, Result};
pub use state::BlogState;
pub use types::*;
