use super::build::{build_into, BuildSummary, STATIC_DIR};
use super::load_config;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use blogkit_content::MicroCmsClient;
use blogkit_core::config::{BlogConfig, CONFIG_FILE};
use blogkit_core::search::SearchBox;
use blogkit_core::BlogState;
use blogkit_generator::render::{self, SiteContext};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::{RwLock, broadcast};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build output of the preview server, kept inside the blog directory
const PREVIEW_DIR: &str = ".blogkit-preview";

const RELOAD_SCRIPT: &str = r#"<script>
new EventSource("/_reload").onmessage = () => location.reload();
</script>"#;

/// Config and state of the most recent successful build
struct Snapshot {
    config: BlogConfig,
    state: BlogState,
}

#[derive(Clone)]
struct AppState {
    snapshot: Arc<RwLock<Snapshot>>,
    reload_tx: broadcast::Sender<()>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    keyword: Option<String>,
}

/// Build the site and serve it locally with live reload.
///
/// Search is rendered per request so `/search/?keyword=...` shows results
/// without JavaScript. Changes to blog.toml or `static/` trigger a rebuild
/// followed by a reload of every open page.
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("📰 Starting preview server...");
    println!("   Blog: {}", path.display());

    let config = load_config(&path)?;
    let output = path.join(PREVIEW_DIR);

    println!("   ✓ Loaded: {}", config.site.title);

    let state = rebuild(&path, &config, &output).await?;
    println!("   ✓ Built {} posts", state.total_count());

    let (reload_tx, _) = broadcast::channel::<()>(100);
    let app_state = AppState {
        snapshot: Arc::new(RwLock::new(Snapshot { config, state })),
        reload_tx: reload_tx.clone(),
    };

    let not_found = ServeFile::new(output.join("404.html"));
    let app = Router::new()
        .route("/search", get(search_handler))
        .route("/search/", get(search_handler))
        .route("/_reload", get(sse_handler))
        .fallback_service(ServeDir::new(&output).not_found_service(not_found))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());

    tokio::spawn(async move {
        if let Err(e) = watch_files(path, output, app_state).await {
            error!("File watcher error: {:#}", e);
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build into a staging directory beside `output` and swap it in once the
/// build succeeds. A failed build leaves `output` untouched.
async fn rebuild(path: &Path, config: &BlogConfig, output: &Path) -> Result<BlogState> {
    let staging = staging_dir(output);
    if staging.exists() {
        fs::remove_dir_all(&staging).context("Failed to clear staging directory")?;
    }

    let summary = match build_staged(path, config, &staging).await {
        Ok(summary) => summary,
        Err(e) => {
            if staging.exists()
                && let Err(cleanup) = fs::remove_dir_all(&staging)
            {
                warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e);
        }
    };

    if output.exists() {
        fs::remove_dir_all(output).context("Failed to clear preview directory")?;
    }
    fs::rename(&staging, output).context("Failed to move preview build into place")?;

    Ok(summary.state)
}

async fn build_staged(path: &Path, config: &BlogConfig, staging: &Path) -> Result<BuildSummary> {
    let client = MicroCmsClient::from_config(config).context("Failed to create content client")?;
    build_into(path, config, &client, staging, Some(RELOAD_SCRIPT)).await
}

fn staging_dir(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".staging");
    output.with_file_name(name)
}

/// Watch blog.toml and `static/`, rebuilding on change
async fn watch_files(path: PathBuf, output: PathBuf, app_state: AppState) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    // The blog directory itself so editors that replace blog.toml on save
    // are still seen
    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    let static_dir = path.join(STATIC_DIR);
    if static_dir.exists() {
        watcher.watch(&static_dir, RecursiveMode::Recursive)?;
    }

    while let Some(event) = rx.recv().await {
        if !is_relevant(&event, &path) {
            continue;
        }

        // Editors emit bursts of events for one save
        while rx.try_recv().is_ok() {}

        info!("Change detected, rebuilding");
        let config = match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Keeping previous build: {:#}", e);
                continue;
            }
        };

        match rebuild(&path, &config, &output).await {
            Ok(state) => {
                *app_state.snapshot.write().await = Snapshot { config, state };
                println!("   📝 Rebuilt, reloading...");
                let _ = app_state.reload_tx.send(());
            }
            Err(e) => warn!("Rebuild failed: {:#}", e),
        }
    }

    Ok(())
}

/// Only blog.toml and files under `static/` feed the build
fn is_relevant(event: &NotifyEvent, blog_dir: &Path) -> bool {
    let config_path = blog_dir.join(CONFIG_FILE);
    let static_dir = blog_dir.join(STATIC_DIR);

    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| {
        let filename = p.file_name().unwrap_or_default().to_string_lossy();
        (*p == config_path || p.starts_with(&static_dir))
            && !filename.starts_with('.')
            && !filename.ends_with('~')
    })
}

/// Render the search page against the current state
async fn search_handler(
    State(app_state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let snapshot = app_state.snapshot.read().await;

    let search_box = SearchBox::mount(
        snapshot.state.blog_list().to_vec(),
        params.keyword.as_deref(),
    );
    let ctx = SiteContext {
        site: &snapshot.config.site,
        state: &snapshot.state,
        page_size: snapshot.config.blog.show_count,
    };

    let html = render::render_search(&ctx, &search_box);
    Html(render::inject_before_body_end(&html, RELOAD_SCRIPT))
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = app_state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
