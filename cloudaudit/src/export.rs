//! Export orchestration: plan chunks, then fetch and write each one in order
use crate::chunk::split;
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::fetch::fetch_chunk;
use crate::output::{Destination, ExportArtifact, is_stdout, resolve_destination, write_artifact};
use crate::signal::{ChunkContext, Interrupt};
use chrono::{TimeZone, Utc};
use cloudaudit_api::AuditLogSource;
use log::{debug, info};
use std::fmt;

/// Outcome of a completed export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Destinations written, in chunk order
    pub files: Vec<Destination>,
    /// Records written across all chunks
    pub total_logs: usize,
}

/// Run the export described by `config` against `source`
///
/// Chunks are processed strictly one after another. Each chunk downloads
/// under a fresh [`ChunkContext`]; the first failure aborts the remaining
/// chunks, leaving already written files in place.
///
/// # Errors
///
/// Returns `Validation` before any request when stdout is combined with a
/// split that yields several chunks, and otherwise the first fetch or write
/// error.
pub async fn run_export<S, Tz>(
    source: &S,
    config: &ExportConfig<Tz>,
    interrupt: &Interrupt,
) -> Result<ExportSummary>
where
    S: AuditLogSource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let range = config.range();
    let chunks = split(&range.window, config.policy());
    let total = chunks.len();

    if is_stdout(config.output()) && total > 1 {
        return Err(ExportError::Validation(format!(
            "--output - writes a single document, but the {} split produces {total} chunks; \
             use a file path or drop the split flag",
            config.policy()
        )));
    }

    info!(
        "Exporting audit logs for {} ({} to {})",
        range.selection,
        range.window.start.to_rfc3339(),
        range.window.end.to_rfc3339()
    );
    info!("  Split: {} ({total} chunk(s))", config.policy());
    if config.filters().is_active() {
        debug!("  Filters: {:?}", config.filters());
    }

    let tz = range.window.start.timezone();
    let mut summary = ExportSummary {
        files: Vec::with_capacity(total),
        total_logs: 0,
    };

    for chunk in chunks {
        if interrupt.is_triggered() {
            return Err(ExportError::Interrupted);
        }

        info!(
            "Chunk {}/{}: {} to {}",
            chunk.index,
            chunk.total,
            chunk.start.to_rfc3339(),
            chunk.end.to_rfc3339()
        );

        let records = {
            let ctx = ChunkContext::new(config.chunk_timeout(), interrupt);
            fetch_chunk(source, &ctx, &chunk, config.filters(), config.page_size()).await?
        };

        let exported_at = Utc::now().with_timezone(&tz);
        let destination = resolve_destination(
            config.output(),
            &chunk,
            range.selection.range_type(),
            &exported_at,
        )?;
        let artifact = ExportArtifact::new(
            &range.selection,
            &chunk,
            records,
            config.filters(),
            &exported_at,
        );
        write_artifact(&artifact, &destination, interrupt).await?;

        summary.total_logs = summary.total_logs.saturating_add(artifact.total_logs);
        summary.files.push(destination);
    }

    info!(
        "Export complete: {} log entries in {} file(s)",
        summary.total_logs,
        summary.files.len()
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::ExportArgs;
    use crate::signal::interrupt_channel;
    use async_trait::async_trait;
    use chrono::DateTime;
    use cloudaudit_api::{AuditLogListRequest, AuditLogPage, AuditLogRecord, CloudAuditError};
    use serde_json::{Value, json};
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Serves the same record set, one record per page, to every chunk
    struct MemorySource {
        records: Vec<Value>,
        calls: AtomicUsize,
        stall_after: Option<usize>,
        requests: Mutex<Vec<AuditLogListRequest>>,
    }

    impl MemorySource {
        fn new(timestamps: &[&str]) -> Self {
            Self {
                records: timestamps
                    .iter()
                    .enumerate()
                    .map(|(i, ts)| json!({"id": i, "createdAt": ts}))
                    .collect(),
                calls: AtomicUsize::new(0),
                stall_after: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn stalling_after(mut self, calls: usize) -> Self {
            self.stall_after = Some(calls);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuditLogSource for MemorySource {
        async fn list_audit_logs(
            &self,
            request: &AuditLogListRequest,
        ) -> std::result::Result<AuditLogPage, CloudAuditError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if self.stall_after.is_some_and(|limit| call >= limit) {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
            }
            let index = usize::try_from(request.page).unwrap() - 1;
            Ok(AuditLogPage {
                items: self
                    .records
                    .get(index)
                    .cloned()
                    .map(AuditLogRecord::from)
                    .into_iter()
                    .collect(),
                total_pages: u32::try_from(self.records.len()).unwrap(),
                total_items: self.records.len() as u64,
                total_count: self.records.len() as u64,
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    fn config(args: ExportArgs) -> ExportConfig<Utc> {
        ExportConfig::from_args(&args, now()).unwrap()
    }

    fn three_days(output: Option<String>, daily: bool) -> ExportArgs {
        ExportArgs {
            from: Some("2024-01-01".to_string()),
            to: Some("2024-01-03".to_string()),
            daily,
            output,
            ..ExportArgs::default()
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    const RECORDS: [&str; 5] = [
        "2024-01-01T08:00:00Z",
        "2024-01-01T23:59:59.999999999Z",
        "2024-01-02T00:00:00Z",
        "2024-01-03T12:00:00Z",
        "2024-01-04T00:00:00Z",
    ];

    #[tokio::test]
    async fn test_daily_export_writes_one_file_per_day() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("audit.json");
        let source = MemorySource::new(&RECORDS);
        let config = config(three_days(Some(base.display().to_string()), true));

        let summary = run_export(&source, &config, &Interrupt::never()).await.unwrap();

        let expected: Vec<Destination> = ["20240101-20240101", "20240102-20240102", "20240103-20240103"]
            .iter()
            .map(|s| Destination::File(dir.path().join(format!("audit-{s}.json"))))
            .collect();
        assert_eq!(summary.files, expected);
        assert_eq!(summary.total_logs, 4);

        let counts: Vec<u64> = expected
            .iter()
            .map(|d| match d {
                Destination::File(path) => read_json(path)["totalLogs"].as_u64().unwrap(),
                Destination::Stdout => unreachable!(),
            })
            .collect();
        assert_eq!(counts, vec![2, 1, 1]);

        let Destination::File(second) = &expected[1] else {
            unreachable!()
        };
        let second = read_json(second);
        assert_eq!(second["chunk"], json!({"index": 2, "total": 3}));
        assert_eq!(second["timeRange"]["start"], "2024-01-02T00:00:00+00:00");
        assert_eq!(
            second["timeRange"]["end"],
            "2024-01-02T23:59:59.999999999+00:00"
        );
        assert_eq!(second["timeRange"]["startDate"], "2024-01-01");
        assert_eq!(second["timeRange"]["endDate"], "2024-01-03");
    }

    #[tokio::test]
    async fn test_unsplit_export_writes_single_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("all.json");
        let source = MemorySource::new(&RECORDS);
        let args = ExportArgs {
            actions: vec!["delete".to_string()],
            ..three_days(Some(path.display().to_string()), false)
        };

        let summary = run_export(&source, &config(args), &Interrupt::never())
            .await
            .unwrap();

        assert_eq!(summary.files, vec![Destination::File(path.clone())]);
        let value = read_json(&path);
        assert_eq!(value["totalLogs"], 4);
        assert_eq!(value["logs"].as_array().unwrap().len(), 4);
        assert!(value.get("chunk").is_none());
        assert_eq!(value["filters"], json!({"actions": ["delete"]}));
        assert_eq!(
            source.requests.lock().unwrap()[0].actions,
            vec!["delete".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stdout_with_split_fails_before_fetch() {
        let source = MemorySource::new(&RECORDS);
        let config = config(three_days(Some("-".to_string()), true));

        let result = run_export(&source, &config, &Interrupt::never()).await;

        assert!(matches!(result, Err(ExportError::Validation(_))));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_stdout_with_single_day_split_is_allowed() {
        let source = MemorySource::new(&[]);
        let args = ExportArgs {
            from: Some("2024-01-01".to_string()),
            to: Some("2024-01-01".to_string()),
            daily: true,
            output: Some("-".to_string()),
            ..ExportArgs::default()
        };

        let summary = run_export(&source, &config(args), &Interrupt::never())
            .await
            .unwrap();
        assert_eq!(summary.files, vec![Destination::Stdout]);
        assert_eq!(summary.total_logs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_aborts_remaining_chunks() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("audit.json");
        // First chunk pages through all five records, the second stalls
        let source = MemorySource::new(&RECORDS).stalling_after(RECORDS.len());
        let args = ExportArgs {
            chunk_download_timeout: Duration::from_secs(30),
            ..three_days(Some(base.display().to_string()), true)
        };

        let err = run_export(&source, &config(args), &Interrupt::never())
            .await
            .unwrap_err();

        match &err {
            ExportError::ChunkTimeout {
                index, start, end, ..
            } => {
                assert_eq!(*index, 2);
                assert_eq!(start, "2024-01-02T00:00:00+00:00");
                assert_eq!(end, "2024-01-02T23:59:59.999999999+00:00");
            }
            other => panic!("expected chunk timeout, got {other:?}"),
        }
        assert!(dir.path().join("audit-20240101-20240101.json").exists());
        assert!(!dir.path().join("audit-20240102-20240102.json").exists());
        assert!(!dir.path().join("audit-20240103-20240103.json").exists());
        assert_eq!(source.calls(), RECORDS.len() + 1);
    }

    #[tokio::test]
    async fn test_interrupt_stops_before_first_chunk() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new(&RECORDS);
        let (handle, interrupt) = interrupt_channel();
        handle.trigger();
        let config = config(three_days(
            Some(dir.path().join("audit.json").display().to_string()),
            true,
        ));

        let result = run_export(&source, &config, &interrupt).await;

        assert!(matches!(result, Err(ExportError::Interrupted)));
        assert_eq!(source.calls(), 0);
    }
}
