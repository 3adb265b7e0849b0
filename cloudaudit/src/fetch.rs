//! Per-chunk retrieval of audit logs
//!
//! The list API has no time parameters, so a chunk is fetched by paging from
//! page 1 and keeping only the records whose `createdAt` lies inside the
//! chunk. Paging stops at the reported last page or at the first empty page.
use crate::chunk::Chunk;
use crate::error::{ExportError, Result};
use crate::filter::FilterCriteria;
use crate::range::TimeWindow;
use crate::signal::{ChunkContext, ContextError};
use chrono::TimeZone;
use cloudaudit_api::{AuditLogRecord, AuditLogSource, CloudAuditError};
use futures::stream::{self, Stream, TryStreamExt};
use log::{debug, info, warn};

/// One page after time filtering
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Page number (1-indexed)
    pub number: u32,
    /// Total pages reported by the API
    pub total_pages: u32,
    /// Records on the page, before time filtering
    pub received: usize,
    /// Records on the page that fall inside the window
    pub records: Vec<AuditLogRecord>,
}

enum PageCursor {
    Next(u32),
    Exhausted,
}

/// Lazy sequence of filtered pages for `window`
///
/// The stream requests nothing until polled, ends after the last page, and
/// cannot be restarted.
pub fn record_pages<'a, S, Tz>(
    source: &'a S,
    filter: &'a FilterCriteria,
    window: TimeWindow<Tz>,
    page_size: u32,
) -> impl Stream<Item = std::result::Result<FetchedPage, CloudAuditError>> + 'a
where
    S: AuditLogSource + ?Sized,
    Tz: TimeZone + 'a,
{
    stream::try_unfold(PageCursor::Next(1), move |cursor| {
        let window = window.clone();
        async move {
            match cursor {
                PageCursor::Next(number) => {
                    next_page(source, filter, &window, page_size, number).await
                }
                PageCursor::Exhausted => Ok(None),
            }
        }
    })
}

async fn next_page<S, Tz>(
    source: &S,
    filter: &FilterCriteria,
    window: &TimeWindow<Tz>,
    page_size: u32,
    number: u32,
) -> std::result::Result<Option<(FetchedPage, PageCursor)>, CloudAuditError>
where
    S: AuditLogSource + ?Sized,
    Tz: TimeZone,
{
    let page = source
        .list_audit_logs(&filter.to_request(number, page_size))
        .await?;

    if page.items.is_empty() {
        debug!("Page {number} is empty, stopping");
        return Ok(None);
    }

    let received = page.items.len();
    let mut undated: usize = 0;
    let records: Vec<AuditLogRecord> = page
        .items
        .into_iter()
        .filter(|record| match &record.created_at {
            Some(created_at) => window.contains(created_at),
            None => {
                undated = undated.saturating_add(1);
                false
            }
        })
        .collect();

    if undated > 0 {
        warn!("Skipped {undated} record(s) on page {number} without a valid createdAt");
    }

    let next = if number >= page.total_pages {
        PageCursor::Exhausted
    } else {
        PageCursor::Next(number.saturating_add(1))
    };

    Ok(Some((
        FetchedPage {
            number,
            total_pages: page.total_pages,
            received,
            records,
        },
        next,
    )))
}

/// Fetch every record of `chunk`, each page bounded by `ctx`
///
/// # Errors
///
/// Returns `ChunkTimeout` naming the chunk when the context deadline passes,
/// `Interrupted` when the export is interrupted, and `Api` for backend
/// failures.
pub async fn fetch_chunk<S, Tz>(
    source: &S,
    ctx: &ChunkContext<'_>,
    chunk: &Chunk<Tz>,
    filter: &FilterCriteria,
    page_size: u32,
) -> Result<Vec<AuditLogRecord>>
where
    S: AuditLogSource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut pages = std::pin::pin!(record_pages(source, filter, chunk.window(), page_size));
    let mut records = Vec::new();

    loop {
        let next = ctx.run(pages.try_next()).await.map_err(|e| match e {
            ContextError::Interrupted => ExportError::Interrupted,
            ContextError::DeadlineExceeded => ExportError::ChunkTimeout {
                index: chunk.index,
                total: chunk.total,
                start: chunk.start.to_rfc3339(),
                end: chunk.end.to_rfc3339(),
                timeout: ctx.timeout(),
            },
        })?;

        let Some(page) = next? else {
            break;
        };

        debug!(
            "Chunk {}/{}: page {}/{} kept {} of {} records",
            chunk.index,
            chunk.total,
            page.number,
            page.total_pages,
            page.records.len(),
            page.received
        );

        if page.number == 1 || page.number == page.total_pages || page.number % 10 == 0 {
            info!(
                "Chunk {}/{}: retrieved page {}/{}",
                chunk.index, chunk.total, page.number, page.total_pages
            );
        }

        records.extend(page.records);
    }

    Ok(records)
}
