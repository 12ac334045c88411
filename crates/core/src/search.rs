//! Title search over the already-fetched post list.
//!
//! Matching is a literal, case-sensitive substring test. The search page
//! never goes back to the content service.

use crate::types::BlogItem;

/// Posts whose title contains `keyword`. An empty keyword matches everything.
pub fn filter_by_title(blogs: &[BlogItem], keyword: &str) -> Vec<BlogItem> {
    blogs
        .iter()
        .filter(|blog| blog.title.contains(keyword))
        .cloned()
        .collect()
}

/// State behind the search box: the text being shown and the posts it hits.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    blogs: Vec<BlogItem>,
    search_text: String,
    show_blog_list: Vec<BlogItem>,
}

impl SearchBox {
    /// Start from the hydrated post list and the `keyword` query parameter.
    pub fn mount(blogs: Vec<BlogItem>, query_keyword: Option<&str>) -> Self {
        let mut search_box = Self {
            blogs,
            search_text: query_keyword.unwrap_or_default().to_string(),
            show_blog_list: Vec::new(),
        };
        search_box.refresh(query_keyword.unwrap_or_default());
        search_box
    }

    /// The post list or the URL keyword changed; rerun the baseline search.
    pub fn reload(&mut self, blogs: Vec<BlogItem>, query_keyword: Option<&str>) {
        self.blogs = blogs;
        self.refresh(query_keyword.unwrap_or_default());
    }

    /// A keystroke in the search box.
    pub fn input(&mut self, value: &str) {
        self.search_text = value.to_string();
        self.refresh(value);
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn show_blog_list(&self) -> &[BlogItem] {
        &self.show_blog_list
    }

    fn refresh(&mut self, keyword: &str) {
        self.show_blog_list = filter_by_title(&self.blogs, keyword);
    }
}
