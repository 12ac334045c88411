/// Page numbers `1..=ceil(total_count / page_size)`.
///
/// Zero items produce no pages at all. A zero page size is treated as one.
pub fn create_page_array(total_count: usize, page_size: usize) -> Vec<usize> {
    let page_count = total_count.div_ceil(page_size.max(1));
    (1..=page_count).collect()
}

/// Offset passed to the content service for a 1-based page number
pub fn page_offset(page_num: usize, page_size: usize) -> usize {
    page_num.saturating_sub(1) * page_size
}

/// Whether the listing needs a pager, i.e. more than one page of posts
pub fn shows_pager(total_count: usize, page_size: usize) -> bool {
    total_count > page_size.max(1)
}
