use crate::pipeline::{ArchiveMonthProps, BlogDetailProps, PageProps, TopProps};
use blogkit_core::config::SiteConfig;
use blogkit_core::pagination::{create_page_array, shows_pager};
use blogkit_core::search::SearchBox;
use blogkit_core::types::{BlogItem, DETAIL_IMAGE_HEIGHT, DETAIL_IMAGE_WIDTH};
use blogkit_core::BlogState;

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Everything a page needs besides its own props
pub struct SiteContext<'a> {
    pub site: &'a SiteConfig,
    pub state: &'a BlogState,
    pub page_size: usize,
}

/// Top page: first page of posts plus pager
pub fn render_top(ctx: &SiteContext, props: &TopProps) -> String {
    let mut main = render_blog_list(&props.blog_list);

    if shows_pager(props.total_count, ctx.page_size) {
        main.push_str(&render_pagination(props.total_count, ctx.page_size, 1));
    }

    render_layout(ctx, None, &main)
}

/// Numbered listing page
pub fn render_page(ctx: &SiteContext, props: &PageProps) -> String {
    let mut main = render_blog_list(&props.blog_list);

    if shows_pager(props.total_count, ctx.page_size) {
        main.push_str(&render_pagination(
            props.total_count,
            ctx.page_size,
            props.page_num,
        ));
    }

    render_layout(ctx, Some(&format!("Page {}", props.page_num)), &main)
}

/// Post detail page. The body is inserted as-is; it was sanitized upstream
/// if the content source is not trusted.
pub fn render_detail(ctx: &SiteContext, props: &BlogDetailProps) -> String {
    let blog = &props.blog;

    let categories: String = blog
        .categories
        .iter()
        .map(|category| {
            format!(
                r#"<h3 class="post-category">Category: {}</h3>"#,
                html_escape(&category.name)
            )
        })
        .collect();

    let main = format!(
        r#"<section class="post">
    <img src="{}" alt="Picture" width="{}" height="{}" class="post-image">
    <h2 class="post-title">{}</h2>
    {}
    <div class="post-body">{}</div>
</section>"#,
        html_escape(blog.image_url()),
        DETAIL_IMAGE_WIDTH,
        DETAIL_IMAGE_HEIGHT,
        html_escape(&blog.title),
        categories,
        blog.body
    );

    render_layout(ctx, Some(&blog.title), &main)
}

/// Listing of one archive month
pub fn render_archive_month(ctx: &SiteContext, props: &ArchiveMonthProps) -> String {
    let main = format!(
        r#"<h2 class="archive-title">{}</h2>
{}"#,
        html_escape(&props.archive.show_date),
        render_blog_list(&props.blog_list)
    );

    render_layout(ctx, Some(&props.archive.show_date), &main)
}

/// Search page as it looks for the given search box state.
///
/// The static build renders it with an empty keyword; `search.js` takes over
/// in the browser and the preview server renders it per request.
pub fn render_search(ctx: &SiteContext, search_box: &SearchBox) -> String {
    let results: String = search_box
        .show_blog_list()
        .iter()
        .map(render_search_hit)
        .collect();

    let main = format!(
        r#"<h2 class="breadcrumb">Search</h2>
<input id="search-input" class="search-input" type="text" name="keyword" value="{}" placeholder="Search posts" autocomplete="off">
<ul id="search-results" class="search-results">{}</ul>
<script src="/search.js" defer></script>"#,
        html_escape(search_box.search_text()),
        results
    );

    render_layout(ctx, Some("Search"), &main)
}

pub fn render_not_found(ctx: &SiteContext) -> String {
    let main = r#"<section class="not-found">
    <h2>404 - Page not found</h2>
    <p><a href="/">Back to top</a></p>
</section>"#;

    render_layout(ctx, Some("Not found"), main)
}

fn render_search_hit(blog: &BlogItem) -> String {
    format!(
        r#"<li><a href="{}/">{}</a></li>"#,
        html_escape(&blog.path()),
        html_escape(&blog.title)
    )
}

fn render_blog_list(blogs: &[BlogItem]) -> String {
    if blogs.is_empty() {
        return r#"<p class="empty">No posts yet.</p>"#.to_string();
    }

    blogs.iter().map(render_blog_item).collect()
}

fn render_blog_item(blog: &BlogItem) -> String {
    let categories: String = blog
        .categories
        .iter()
        .map(|c| format!(r#"<span class="tag">{}</span>"#, html_escape(&c.name)))
        .collect();

    let date = blog
        .published_at
        .map(|d| format!(r#"<time datetime="{}">{}</time>"#, d.to_rfc3339(), d.format("%Y-%m-%d")))
        .unwrap_or_default();

    format!(
        r#"<article class="blog-item">
    <a href="{}/"><img src="{}" alt="" class="blog-item-image" loading="lazy"></a>
    <div class="blog-item-text">
        <h2><a href="{}/">{}</a></h2>
        {}
        <div class="blog-item-tags">{}</div>
    </div>
</article>"#,
        html_escape(&blog.path()),
        html_escape(blog.image_url()),
        html_escape(&blog.path()),
        html_escape(&blog.title),
        date,
        categories
    )
}

/// Page links; page one is the top page
fn render_pagination(total_count: usize, page_size: usize, current: usize) -> String {
    let links: String = create_page_array(total_count, page_size)
        .into_iter()
        .map(|page| {
            let href = if page == 1 {
                "/".to_string()
            } else {
                format!("/page/{}/", page)
            };

            if page == current {
                format!(r#"<li><span class="current">{}</span></li>"#, page)
            } else {
                format!(r#"<li><a href="{}">{}</a></li>"#, href, page)
            }
        })
        .collect();

    format!(r#"<nav class="pagination"><ul>{}</ul></nav>"#, links)
}

/// Sidebar built from the shared state: profile, categories, archive
fn render_sidebar(state: &BlogState) -> String {
    let profile = state
        .profile()
        .map(|profile| {
            let image = profile
                .image
                .as_ref()
                .map(|i| {
                    format!(
                        r#"<img src="{}" alt="" class="profile-image">"#,
                        html_escape(&i.url)
                    )
                })
                .unwrap_or_default();
            let description = profile
                .description
                .as_deref()
                .map(|d| format!("<p>{}</p>", html_escape(d)))
                .unwrap_or_default();

            format!(
                r#"<section class="profile">{}<h3>{}</h3>{}</section>"#,
                image,
                html_escape(&profile.name),
                description
            )
        })
        .unwrap_or_default();

    let categories: String = state
        .categories()
        .iter()
        .map(|c| format!("<li>{}</li>", html_escape(&c.name)))
        .collect();

    let archive: String = state
        .archive_list()
        .iter()
        .map(|a| {
            format!(
                r#"<li><a href="{}/" data-date="{}">{}</a></li>"#,
                html_escape(&a.path()),
                html_escape(&a.origin_date),
                html_escape(&a.show_date)
            )
        })
        .collect();

    format!(
        r#"<aside class="sidebar">
    {}
    <section class="categories"><h3>Categories</h3><ul>{}</ul></section>
    <section class="archive"><h3>Archive</h3><ul>{}</ul></section>
</aside>"#,
        profile, categories, archive
    )
}

fn render_layout(ctx: &SiteContext, page_title: Option<&str>, main: &str) -> String {
    let title = match page_title {
        Some(page_title) => format!("{} | {}", html_escape(page_title), html_escape(&ctx.site.title)),
        None => html_escape(&ctx.site.title),
    };

    let description = ctx
        .site
        .description
        .as_deref()
        .map(|d| format!(r#"<meta name="description" content="{}">"#, html_escape(d)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    {}
    <style>
        :root {{
            --primary: #2b6cb0;
            --base-100: #ffffff;
            --base-200: #f4f5f7;
            --base-content: #1a202c;
        }}
        * {{ box-sizing: border-box; }}
        body {{ margin: 0; font-family: system-ui, sans-serif; color: var(--base-content); background: var(--base-200); }}
        a {{ color: var(--primary); text-decoration: none; }}
        .header {{ background: var(--base-100); padding: 1rem 2rem; display: flex; justify-content: space-between; align-items: center; }}
        .header h1 {{ margin: 0; font-size: 1.5rem; }}
        .divider {{ display: flex; gap: 2rem; max-width: 1100px; margin: 2rem auto; padding: 0 1rem; }}
        main {{ flex: 1; min-width: 0; }}
        .sidebar {{ width: 280px; }}
        .sidebar section {{ background: var(--base-100); padding: 1rem; margin-bottom: 1rem; border-radius: 6px; }}
        .blog-item {{ display: flex; gap: 1rem; background: var(--base-100); padding: 1rem; margin-bottom: 1rem; border-radius: 6px; }}
        .blog-item-image {{ width: 160px; height: 107px; object-fit: cover; }}
        .tag {{ display: inline-block; font-size: 0.8rem; padding: 0 0.5rem; margin-right: 0.25rem; border: 1px solid var(--primary); border-radius: 4px; }}
        .post {{ background: var(--base-100); padding: 1.5rem; border-radius: 6px; }}
        .post-image {{ max-width: 100%; height: auto; }}
        .pagination ul {{ list-style: none; display: flex; gap: 0.5rem; padding: 0; }}
        .pagination .current {{ font-weight: bold; }}
        .search-input {{ width: 100%; padding: 0.5rem; font-size: 1rem; }}
        .footer {{ text-align: center; padding: 2rem; font-size: 0.8rem; }}
        @media (max-width: 768px) {{
            .divider {{ flex-direction: column; }}
            .sidebar {{ width: 100%; }}
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1><a href="/">{}</a></h1>
        <form action="/search/" method="get" class="header-search">
            <input type="text" name="keyword" placeholder="Search">
        </form>
    </div>
    <div class="divider">
        <main>
{}
        </main>
        {}
    </div>
    <div class="footer">Generated by blogkit</div>
</body>
</html>
"#,
        title,
        description,
        html_escape(&ctx.site.title),
        main,
        render_sidebar(ctx.state)
    )
}

/// Insert `snippet` right before the closing body tag, or append it when the
/// page has none
pub fn inject_before_body_end(html: &str, snippet: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => format!("{}{}\n{}", &html[..idx], snippet, &html[idx..]),
        None => format!("{}{}", html, snippet),
    }
}

/// Client-side search: same case-sensitive substring match as the server,
/// run against the hydrated post list on every keystroke.
pub fn generate_search_js() -> &'static str {
    r#"(function () {
  const input = document.getElementById('search-input');
  const results = document.getElementById('search-results');
  if (!input || !results) return;

  const escapeHtml = (s) =>
    s.replace(/[&<>"']/g, (c) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#x27;' })[c]);

  let blogList = [];

  const render = (keyword) => {
    const hits = blogList.filter((blog) => blog.title.indexOf(keyword) > -1);
    results.innerHTML = hits
      .map((blog) => '<li><a href="/' + encodeURIComponent(blog.id) + '/">' + escapeHtml(blog.title) + '</a></li>')
      .join('');
  };

  input.addEventListener('input', (e) => render(e.target.value));

  fetch('/_data/state.json')
    .then((response) => response.json())
    .then((state) => {
      blogList = state.blogList || [];
      const keyword = new URLSearchParams(window.location.search).get('keyword') || '';
      input.value = keyword;
      render(keyword);
    });
})();
"#
}
