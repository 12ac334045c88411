use crate::types::{ArchiveEntry, BlogItem, Category, Profile};
use serde::Serialize;

/// Data shared by every page once a build has fetched it.
///
/// Created empty, filled in by page-level props, read by navigation and
/// search. Serialized as-is into the hydration file the search page loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogState {
    blog_list: Vec<BlogItem>,
    total_count: usize,
    categories: Vec<Category>,
    profile: Option<Profile>,
    archive_list: Vec<ArchiveEntry>,
}

impl BlogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_blog_data(&mut self, blog_list: Vec<BlogItem>, total_count: usize) {
        self.blog_list = blog_list;
        self.total_count = total_count;
    }

    pub fn set_category_data(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn set_profile_data(&mut self, profile: Profile) {
        self.profile = Some(profile);
    }

    pub fn set_archive(&mut self, archive_list: Vec<ArchiveEntry>) {
        self.archive_list = archive_list;
    }

    pub fn blog_list(&self) -> &[BlogItem] {
        &self.blog_list
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn archive_list(&self) -> &[ArchiveEntry] {
        &self.archive_list
    }

    /// JSON snapshot written to `/_data/state.json`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
