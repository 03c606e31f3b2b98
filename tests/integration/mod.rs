// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture helper for creating temporary directories with submission files
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Create a learner submission file with given content
    pub fn create_submission_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    /// Create a JSON file of raw correction points
    pub fn create_points_file<P: AsRef<Path>>(&self, relative_path: P, points: &serde_json::Value) -> PathBuf {
        let json = serde_json::to_string_pretty(points).expect("Failed to serialize points");
        self.create_submission_file(relative_path, &json)
    }

    pub fn path<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        self.root_path.join(relative_path)
    }
}

/// Sentence texts of a segmented submission
pub fn sentence_texts(sentences: &[tensaku::Sentence]) -> Vec<&str> {
    sentences.iter().map(|s| s.as_str()).collect()
}

/// Learner essay with full-width punctuation, a missing space and a line wrap
pub const SAMPLE_ESSAY: &str = "I think students should study abroad\u{3002}First\u{FF0C}they can learn a new language quickly.Second, they meet people from\nmany countries because they live with them\u{FF01}";

/// Japanese source text matching [`SAMPLE_ESSAY`] sentence for sentence
pub const SAMPLE_SOURCE: &str = "学生は留学すべきだと思う。第一に、新しい言語をすぐに学べる。第二に、一緒に暮らすので多くの国の人と出会える！";

/// Compare two strings line by line, providing detailed diff on mismatch
pub fn assert_golden_lines(actual: &str, expected: &str, context: &str) {
    let actual_lines: Vec<&str> = actual.lines().collect();
    let expected_lines: Vec<&str> = expected.lines().collect();

    if actual_lines.len() != expected_lines.len() {
        panic!(
            "{}: Line count mismatch. Expected {} lines, got {} lines",
            context,
            expected_lines.len(),
            actual_lines.len()
        );
    }

    for (i, (actual_line, expected_line)) in actual_lines.iter().zip(expected_lines.iter()).enumerate() {
        if actual_line != expected_line {
            panic!(
                "{}: Line {} mismatch\nExpected: {}\nActual:   {}",
                context,
                i + 1,
                expected_line,
                actual_line
            );
        }
    }
}
