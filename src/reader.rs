use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::alignment::RawPoint;

/// Path that means "read standard input"
pub const STDIN_PATH: &str = "-";

/// Configuration for submission reading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics for one submission read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

impl ReadStats {
    fn failed(file_path: String, duration_ms: u64, error: String) -> Self {
        Self {
            file_path,
            lines_read: 0,
            bytes_read: 0,
            duration_ms,
            read_error: Some(error),
        }
    }
}

/// Async reader for learner submissions stored one per file
pub struct SubmissionReader {
    config: ReaderConfig,
}

impl SubmissionReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a submission line-by-line, joining lines with `\n`
    ///
    /// Unless `fail_fast` is set, open and decoding failures come back as `Ok` with the
    /// error recorded in [`ReadStats::read_error`] and whatever text was read so far.
    pub async fn read_submission<P: AsRef<Path>>(&self, file_path: P) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting async read of submission: {}", path.display());

        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                let error_msg = format!("Failed to open file {}: {}", path.display(), e);
                warn!("{}", error_msg);
                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                let stats = ReadStats::failed(
                    path.display().to_string(),
                    start_time.elapsed().as_millis() as u64,
                    error_msg,
                );
                return Ok((String::new(), stats));
            }
        };

        let reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut lines = reader.lines();
        let mut text = String::new();
        let mut line_count = 0u64;
        let mut byte_count = 0u64;
        let mut read_error = None;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    byte_count += line.len() as u64 + 1;
                    line_count += 1;
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&line);
                }
                Ok(None) => break,
                Err(e) => {
                    let error_msg = format!(
                        "UTF-8 decoding error in {} at line {}: {}",
                        path.display(),
                        line_count + 1,
                        e
                    );
                    warn!("{}", error_msg);
                    if self.config.fail_fast {
                        return Err(anyhow::anyhow!(error_msg));
                    }
                    read_error = Some(error_msg);
                    break;
                }
            }
        }

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: line_count,
            bytes_read: byte_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
            read_error,
        };

        info!(
            "Read {}: {} lines, {} bytes in {}ms",
            path.display(),
            line_count,
            byte_count,
            stats.duration_ms
        );
        Ok((text, stats))
    }
}

/// Read a whole text input; `-` reads standard input
pub async fn read_text(path: &str) -> Result<String> {
    if path == STDIN_PATH {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read standard input")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {path}"))
}

/// Read LLM correction points from a JSON file (`-` reads standard input)
pub async fn read_points(path: &str) -> Result<Vec<RawPoint>> {
    let json = read_text(path).await?;
    parse_points(&json).with_context(|| format!("Invalid correction points in {path}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointsPayload {
    List(Vec<serde_json::Value>),
    Wrapped { points: Vec<serde_json::Value> },
}

/// Parse correction points given either as a bare array or as `{"points": [...]}`
///
/// Each record is decoded on its own: a malformed record is logged and skipped, the rest
/// are kept. Only a payload of the wrong shape is an error.
pub fn parse_points(json: &str) -> Result<Vec<RawPoint>> {
    let payload: PointsPayload = serde_json::from_str(json)
        .context("Expected a JSON array of points or an object with a \"points\" array")?;
    let records = match payload {
        PointsPayload::List(records) | PointsPayload::Wrapped { points: records } => records,
    };

    let total = records.len();
    let points: Vec<RawPoint> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<RawPoint>(record) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("Point {}: malformed record, skipping: {}", i + 1, e);
                None
            }
        })
        .collect();
    debug!("Parsed {} of {} raw correction points", points.len(), total);
    Ok(points)
}
