// WHY: Concurrent processing of many submission files with per-file statistics
// Each file is independent; results come back in input order for stable stats output

use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::constraints::WordRange;
use crate::pipeline::SubmissionPipeline;
use crate::reader::{ReaderConfig, SubmissionReader};

/// Per-file processing statistics
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionStats {
    pub path: String,
    pub chars_processed: u64,
    pub sentences_detected: u64,
    pub word_count: u64,
    pub within_word_range: bool,
    pub detected_units: u8,
    pub processing_time_ms: u64,
    /// "success" or "failed"
    pub status: String,
    pub error: Option<String>,
}

impl SubmissionStats {
    fn failed(path: String, processing_time_ms: u64, error: String) -> Self {
        Self {
            path,
            chars_processed: 0,
            sentences_detected: 0,
            word_count: 0,
            within_word_range: false,
            detected_units: 0,
            processing_time_ms,
            status: "failed".to_string(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Aggregate statistics for one batch run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Seconds since the Unix epoch when the run started
    pub run_start: u64,
    pub total_processing_time_ms: u64,
    pub total_chars_processed: u64,
    pub total_sentences_detected: u64,
    pub total_words: u64,
    pub files_processed: u64,
    pub files_failed: u64,
    pub file_stats: Vec<SubmissionStats>,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum files in flight; 0 picks the number of CPUs
    pub concurrency: usize,
    pub fail_fast: bool,
    pub word_range: WordRange,
    pub required_units: u8,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            fail_fast: false,
            word_range: WordRange::default(),
            required_units: 2,
        }
    }
}

impl BatchConfig {
    fn effective_concurrency(&self) -> usize {
        match self.concurrency {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }
}

/// Process every file, at most `concurrency` at a time
///
/// With `fail_fast` the first failing file aborts the run with an error; otherwise
/// failures are recorded in that file's stats and processing continues.
pub async fn process_submissions(
    pipeline: Arc<SubmissionPipeline>,
    paths: &[PathBuf],
    config: &BatchConfig,
) -> Result<RunStats> {
    let run_start = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let started = Instant::now();
    let concurrency = config.effective_concurrency();
    info!("Processing {} submissions with concurrency {}", paths.len(), concurrency);

    let reader = Arc::new(SubmissionReader::new(ReaderConfig {
        fail_fast: config.fail_fast,
        ..ReaderConfig::default()
    }));

    let mut results = stream::iter(paths.iter().cloned())
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            let reader = Arc::clone(&reader);
            let word_range = config.word_range;
            let required_units = config.required_units;
            async move { process_one(&pipeline, &reader, &path, word_range, required_units).await }
        })
        .buffered(concurrency);

    let mut file_stats = Vec::with_capacity(paths.len());
    while let Some(stats) = results.next().await {
        if !stats.is_success() {
            if let Some(error) = &stats.error {
                warn!("Failed to process {}: {}", stats.path, error);
            }
            if config.fail_fast {
                anyhow::bail!(
                    "Aborting batch after failure in {}: {}",
                    stats.path,
                    stats.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        file_stats.push(stats);
    }

    let run = summarize(run_start, started.elapsed().as_millis() as u64, file_stats);
    info!(
        "Batch complete: {} processed, {} failed in {}ms",
        run.files_processed, run.files_failed, run.total_processing_time_ms
    );
    Ok(run)
}

async fn process_one(
    pipeline: &SubmissionPipeline,
    reader: &SubmissionReader,
    path: &Path,
    word_range: WordRange,
    required_units: u8,
) -> SubmissionStats {
    let started = Instant::now();
    let display = path.display().to_string();

    let (text, read_stats) = match reader.read_submission(path).await {
        Ok(result) => result,
        Err(e) => return SubmissionStats::failed(display, started.elapsed().as_millis() as u64, e.to_string()),
    };
    if let Some(error) = read_stats.read_error {
        return SubmissionStats::failed(display, started.elapsed().as_millis() as u64, error);
    }

    let processed = pipeline.process(&text);
    let report = pipeline.check(&text, word_range, required_units);

    SubmissionStats {
        path: display,
        chars_processed: text.chars().count() as u64,
        sentences_detected: processed.sentence_count() as u64,
        word_count: processed.word_count as u64,
        within_word_range: report.within_word_range,
        detected_units: report.detected_units,
        processing_time_ms: started.elapsed().as_millis() as u64,
        status: "success".to_string(),
        error: None,
    }
}

fn summarize(run_start: u64, total_processing_time_ms: u64, file_stats: Vec<SubmissionStats>) -> RunStats {
    let succeeded = || file_stats.iter().filter(|s| s.is_success());
    RunStats {
        run_start,
        total_processing_time_ms,
        total_chars_processed: succeeded().map(|s| s.chars_processed).sum(),
        total_sentences_detected: succeeded().map(|s| s.sentences_detected).sum(),
        total_words: succeeded().map(|s| s.word_count).sum(),
        files_processed: succeeded().count() as u64,
        files_failed: file_stats.iter().filter(|s| !s.is_success()).count() as u64,
        file_stats,
    }
}

/// Write run statistics as pretty JSON
pub async fn write_stats(path: &Path, stats: &RunStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
