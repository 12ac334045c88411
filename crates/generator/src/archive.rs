//! Archive month assembly.
//!
//! Months are walked newest first and each one costs one existence query.
//! Queries are awaited one at a time; the first failure ends the stream.

use async_stream::try_stream;
use blogkit_content::{ContentError, ContentService};
use blogkit_core::ArchiveEntry;
use blogkit_core::dates::{
    archive_months, change_show_year_month, change_year_month, change_year_month_date, MonthRange,
};
use chrono::{DateTime, FixedOffset};
use futures::{Stream, TryStreamExt};
use tracing::debug;

/// Lazily yield an entry for every month in `months` that has posts.
pub fn archive_stream<'a, I>(
    service: &'a dyn ContentService,
    months: I,
    show_format: &'a str,
) -> impl Stream<Item = Result<ArchiveEntry, ContentError>> + Send + 'a
where
    I: IntoIterator<Item = MonthRange>,
    I::IntoIter: Send + 'a,
{
    let months = months.into_iter();

    try_stream! {
        for month in months {
            let has_posts = service.is_blogs_archives(month.start, month.end).await?;
            debug!(month = %change_year_month(month.start), has_posts, "Checked archive month");

            if has_posts {
                yield archive_entry(month.start, show_format);
            }
        }
    }
}

/// Archive entries from the current month back to the blog start month.
pub async fn assemble_archive(
    service: &dyn ContentService,
    current_date: DateTime<FixedOffset>,
    blog_start_date: DateTime<FixedOffset>,
    show_format: &str,
) -> Result<Vec<ArchiveEntry>, ContentError> {
    archive_stream(
        service,
        archive_months(current_date, blog_start_date),
        show_format,
    )
    .try_collect()
    .await
}

fn archive_entry(start_month: DateTime<FixedOffset>, show_format: &str) -> ArchiveEntry {
    ArchiveEntry {
        origin_date: change_year_month_date(start_month),
        link_date: change_year_month(start_month),
        show_date: change_show_year_month(start_month, show_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jst, FakeContent};
    use blogkit_core::dates::DEFAULT_SHOW_FORMAT;

    #[tokio::test]
    async fn test_only_months_with_posts_newest_first() {
        let service = FakeContent::new(0).with_archive_months(&["2020-01", "2020-03"]);

        let archive = assemble_archive(
            &service,
            jst(2020, 3, 20),
            jst(2020, 1, 1),
            DEFAULT_SHOW_FORMAT,
        )
        .await
        .unwrap();

        let links: Vec<&str> = archive.iter().map(|e| e.link_date.as_str()).collect();
        assert_eq!(links, vec!["2020-03", "2020-01"]);
        assert_eq!(archive[0].origin_date, "2020-03-01");
        assert_eq!(archive[0].show_date, "2020年03月");

        // every month in range was asked about exactly once, in order
        assert_eq!(
            service.archive_queries(),
            vec!["2020-03", "2020-02", "2020-01"]
        );
    }

    #[tokio::test]
    async fn test_no_posts_yields_empty_archive() {
        let service = FakeContent::new(0);
        let archive = assemble_archive(&service, jst(2021, 2, 1), jst(2020, 1, 1), "%Y/%m")
            .await
            .unwrap();

        assert!(archive.is_empty());
        assert_eq!(service.archive_queries().len(), 14);
    }

    #[tokio::test]
    async fn test_spans_year_boundary_strictly_descending() {
        let service =
            FakeContent::new(0).with_archive_months(&["2019-11", "2019-12", "2020-01", "2020-02"]);

        let archive = assemble_archive(
            &service,
            jst(2020, 2, 29),
            jst(2019, 11, 30),
            DEFAULT_SHOW_FORMAT,
        )
        .await
        .unwrap();

        let keys: Vec<&str> = archive.iter().map(|e| e.origin_date.as_str()).collect();
        assert_eq!(keys, vec!["2020-02-01", "2020-01-01", "2019-12-01", "2019-11-01"]);
        assert!(keys.windows(2).all(|w| w[0] > w[1]));
    }

    #[tokio::test]
    async fn test_failed_query_fails_whole_archive() {
        let service = FakeContent::new(0)
            .with_archive_months(&["2020-03"])
            .failing_archive_month("2020-02");

        let result = assemble_archive(
            &service,
            jst(2020, 3, 20),
            jst(2020, 1, 1),
            DEFAULT_SHOW_FORMAT,
        )
        .await;

        assert!(result.is_err());
        // nothing after the failing month is queried
        assert_eq!(service.archive_queries(), vec!["2020-03", "2020-02"]);
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let service = FakeContent::new(0).with_archive_months(&["2020-03", "2020-01"]);
        let months = archive_months(jst(2020, 3, 20), jst(2020, 1, 1));
        let mut stream = Box::pin(archive_stream(&service, months, DEFAULT_SHOW_FORMAT));

        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.link_date, "2020-03");
        assert_eq!(service.archive_queries(), vec!["2020-03"]);
    }
}
