pub mod alignment;
pub mod batch;
pub mod config;
pub mod constraints;
pub mod normalization;
pub mod pipeline;
pub mod reader;
pub mod sentence_detector;

// Re-export main types for convenient access
pub use alignment::{CorrectionPoint, Level, PointAligner, RawPoint};
pub use constraints::{ConstraintChecker, ConstraintReport, TwoUnitReport, WordRange};
pub use normalization::{normalize_punctuation, InputNormalizer};
pub use pipeline::{ProcessedSubmission, SubmissionPipeline};
pub use sentence_detector::{split_japanese_sentences, AbbreviationSet, Sentence, SentenceSegmenter};

// Re-export batch processing types for the CLI and benchmarks
pub use batch::{process_submissions, write_stats, BatchConfig, RunStats, SubmissionStats};
pub use config::Config;
