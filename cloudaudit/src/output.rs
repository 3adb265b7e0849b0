//! Export artifacts and where they are written
use crate::chunk::Chunk;
use crate::error::{ExportError, Result};
use crate::filter::FilterCriteria;
use crate::range::{FORMAT_DATE, RangeSelection};
use crate::signal::Interrupt;
use chrono::{DateTime, TimeZone};
use cloudaudit_api::AuditLogRecord;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `--output` value that selects standard output
pub const STDOUT_SENTINEL: &str = "-";

/// Chunk bounds in file names
const FORMAT_FILE_DATE: &str = "%Y%m%d";

/// Export time in default single-file names
const FORMAT_FILE_TIMESTAMP: &str = "%Y%m%d-%H%M%S";

/// Where one artifact goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Whether `output` selects standard output
#[must_use]
pub fn is_stdout(output: Option<&str>) -> bool {
    output.is_some_and(|o| o.trim() == STDOUT_SENTINEL)
}

/// Resolve the destination of `chunk`'s artifact
///
/// # Errors
///
/// Returns `Validation` when standard output is requested for a multi-chunk
/// export.
pub fn resolve_destination<Tz>(
    output: Option<&str>,
    chunk: &Chunk<Tz>,
    range_type: &str,
    exported_at: &DateTime<Tz>,
) -> Result<Destination>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let output = output.map(str::trim).filter(|o| !o.is_empty());

    if is_stdout(output) {
        if chunk.total > 1 {
            return Err(ExportError::Validation(format!(
                "Cannot write {} chunks to stdout; use --output with a file path",
                chunk.total
            )));
        }
        return Ok(Destination::Stdout);
    }

    if chunk.total <= 1 {
        let path = match output {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(format!(
                "audit-logs-{range_type}-{}.json",
                exported_at.format(FORMAT_FILE_TIMESTAMP)
            )),
        };
        return Ok(Destination::File(path));
    }

    let suffix = format!(
        "{}-{}",
        chunk.start.format(FORMAT_FILE_DATE),
        chunk.end.format(FORMAT_FILE_DATE)
    );
    let path = match output {
        Some(base) => with_chunk_suffix(Path::new(base), &suffix),
        None => PathBuf::from(format!("audit-logs-{suffix}.json")),
    };
    Ok(Destination::File(path))
}

/// `dir/name.ext` becomes `dir/name-<suffix>.ext`; without an extension the suffix is appended
fn with_chunk_suffix(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    };
    base.with_file_name(file_name)
}

/// `timeRange` section of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeMeta {
    #[serde(rename = "type")]
    pub range_type: &'static str,
    pub start: String,
    pub end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// `chunk` section of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkMeta {
    pub index: usize,
    pub total: usize,
}

/// The JSON document written for one chunk
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub exported_at: String,
    pub time_range: TimeRangeMeta,
    pub total_logs: usize,
    pub logs: Vec<AuditLogRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterCriteria>,
}

impl ExportArtifact {
    /// Assemble the artifact for `chunk`
    ///
    /// `chunk` metadata is present only for multi-chunk exports and `filters`
    /// only when some criterion is active.
    pub fn new<Tz>(
        selection: &RangeSelection,
        chunk: &Chunk<Tz>,
        logs: Vec<AuditLogRecord>,
        filters: &FilterCriteria,
        exported_at: &DateTime<Tz>,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let (since, start_date, end_date) = match selection {
            RangeSelection::Duration { since } => (Some(since.clone()), None, None),
            RangeSelection::Custom {
                start_date,
                end_date,
            } => (
                None,
                Some(start_date.format(FORMAT_DATE).to_string()),
                Some(end_date.format(FORMAT_DATE).to_string()),
            ),
        };

        Self {
            exported_at: exported_at.to_rfc3339(),
            time_range: TimeRangeMeta {
                range_type: selection.range_type(),
                start: chunk.start.to_rfc3339(),
                end: chunk.end.to_rfc3339(),
                since,
                start_date,
                end_date,
            },
            total_logs: logs.len(),
            logs,
            chunk: (chunk.total > 1).then_some(ChunkMeta {
                index: chunk.index,
                total: chunk.total,
            }),
            filters: filters.is_active().then(|| filters.clone()),
        }
    }
}

/// Write `artifact` to `destination` as 2-space indented JSON
///
/// Parent directories of file destinations are created as needed.
///
/// # Errors
///
/// Returns `Write` naming the path on file failures, `Io` on stdout failures
/// and `Interrupted` if the interrupt fires first.
pub async fn write_artifact(
    artifact: &ExportArtifact,
    destination: &Destination,
    interrupt: &Interrupt,
) -> Result<()> {
    let json = serde_json::to_string_pretty(artifact)?;

    if interrupt.is_triggered() {
        return Err(ExportError::Interrupted);
    }

    match destination {
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
            debug!("Wrote {} log entries to stdout", artifact.total_logs);
        }
        Destination::File(path) => {
            interrupt
                .guard(write_file(path, json))
                .await
                .map_err(|_| ExportError::Interrupted)?
                .map_err(|source| ExportError::Write {
                    path: path.clone(),
                    source,
                })?;
            info!(
                "Wrote {} log entries to {}",
                artifact.total_logs,
                path.display()
            );
        }
    }

    Ok(())
}

async fn write_file(path: &Path, json: String) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::signal::interrupt_channel;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn chunk(index: usize, total: usize) -> Chunk<Utc> {
        Chunk {
            index,
            total,
            start: at(2024, 1, 1, 0, 0, 0),
            end: at(2024, 1, 7, 23, 59, 59),
        }
    }

    fn exported_at() -> DateTime<Utc> {
        at(2024, 2, 3, 4, 5, 6)
    }

    fn custom() -> RangeSelection {
        RangeSelection::Custom {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        }
    }

    fn record(id: &str) -> AuditLogRecord {
        AuditLogRecord::from(json!({"id": id, "createdAt": "2024-01-02T00:00:00Z", "nested": {"k": [1, 2]}}))
    }

    #[test]
    fn test_single_chunk_explicit_path() {
        let dest =
            resolve_destination(Some("out/audit.json"), &chunk(1, 1), "custom", &exported_at())
                .unwrap();
        assert_eq!(dest, Destination::File(PathBuf::from("out/audit.json")));
    }

    #[test]
    fn test_single_chunk_default_name() {
        let dest = resolve_destination(None, &chunk(1, 1), "duration", &exported_at()).unwrap();
        assert_eq!(
            dest,
            Destination::File(PathBuf::from("audit-logs-duration-20240203-040506.json"))
        );
    }

    #[test]
    fn test_multi_chunk_default_name() {
        let dest = resolve_destination(None, &chunk(2, 5), "custom", &exported_at()).unwrap();
        assert_eq!(
            dest,
            Destination::File(PathBuf::from("audit-logs-20240101-20240107.json"))
        );
    }

    #[test]
    fn test_multi_chunk_base_path_keeps_extension() {
        let dest =
            resolve_destination(Some("exports/audit.json"), &chunk(2, 5), "custom", &exported_at())
                .unwrap();
        assert_eq!(
            dest,
            Destination::File(PathBuf::from("exports/audit-20240101-20240107.json"))
        );
    }

    #[test]
    fn test_multi_chunk_base_path_without_extension() {
        let dest =
            resolve_destination(Some("exports/audit"), &chunk(2, 5), "custom", &exported_at())
                .unwrap();
        assert_eq!(
            dest,
            Destination::File(PathBuf::from("exports/audit-20240101-20240107"))
        );
    }

    #[test]
    fn test_stdout_sentinel() {
        let dest = resolve_destination(Some("-"), &chunk(1, 1), "custom", &exported_at()).unwrap();
        assert_eq!(dest, Destination::Stdout);

        let err = resolve_destination(Some("-"), &chunk(1, 3), "custom", &exported_at()).unwrap_err();
        assert!(matches!(err, ExportError::Validation(_)));
    }

    #[test]
    fn test_single_chunk_artifact_shape() {
        let artifact = ExportArtifact::new(
            &custom(),
            &chunk(1, 1),
            vec![record("a"), record("b")],
            &FilterCriteria::default(),
            &exported_at(),
        );
        assert_eq!(artifact.total_logs, artifact.logs.len());

        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["exportedAt"], "2024-02-03T04:05:06+00:00");
        assert_eq!(
            value["timeRange"],
            json!({
                "type": "custom",
                "start": "2024-01-01T00:00:00+00:00",
                "end": "2024-01-07T23:59:59+00:00",
                "startDate": "2024-01-01",
                "endDate": "2024-01-07"
            })
        );
        assert_eq!(value["totalLogs"], 2);
        assert_eq!(value["logs"][1]["nested"], json!({"k": [1, 2]}));
        assert!(value.get("chunk").is_none());
        assert!(value.get("filters").is_none());
    }

    #[test]
    fn test_multi_chunk_artifact_carries_chunk_and_filters() {
        let filters = FilterCriteria {
            actions: vec!["delete".to_string()],
            ..FilterCriteria::default()
        };
        let selection = RangeSelection::Duration {
            since: "30d".to_string(),
        };
        let artifact = ExportArtifact::new(&selection, &chunk(2, 4), vec![], &filters, &exported_at());

        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["chunk"], json!({"index": 2, "total": 4}));
        assert_eq!(value["filters"], json!({"actions": ["delete"]}));
        assert_eq!(value["timeRange"]["type"], "duration");
        assert_eq!(value["timeRange"]["since"], "30d");
        assert!(value["timeRange"].get("startDate").is_none());
        assert_eq!(value["totalLogs"], 0);
        assert_eq!(value["logs"], json!([]));
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("audit.json");
        let artifact = ExportArtifact::new(
            &custom(),
            &chunk(1, 1),
            vec![record("a")],
            &FilterCriteria::default(),
            &exported_at(),
        );

        write_artifact(&artifact, &Destination::File(path.clone()), &Interrupt::never())
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("{\n  \"exportedAt\""));
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["totalLogs"], 1);
        assert_eq!(value["logs"][0]["id"], "a");
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, "stale").unwrap();
        let artifact = ExportArtifact::new(
            &custom(),
            &chunk(1, 1),
            vec![],
            &FilterCriteria::default(),
            &exported_at(),
        );

        write_artifact(&artifact, &Destination::File(path.clone()), &Interrupt::never())
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["totalLogs"], 0);
    }

    #[tokio::test]
    async fn test_write_error_names_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let path = blocker.join("audit.json");
        let artifact = ExportArtifact::new(
            &custom(),
            &chunk(1, 1),
            vec![],
            &FilterCriteria::default(),
            &exported_at(),
        );

        let err = write_artifact(&artifact, &Destination::File(path.clone()), &Interrupt::never())
            .await
            .unwrap_err();
        match err {
            ExportError::Write { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected write error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_interrupted_before_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.json");
        let (handle, interrupt) = interrupt_channel();
        handle.trigger();
        let artifact = ExportArtifact::new(
            &custom(),
            &chunk(1, 1),
            vec![],
            &FilterCriteria::default(),
            &exported_at(),
        );

        let result = write_artifact(&artifact, &Destination::File(path.clone()), &interrupt).await;
        assert!(matches!(result, Err(ExportError::Interrupted)));
        assert!(!path.exists());
    }
}
