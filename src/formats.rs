use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub cookie_path: String,
    pub root_url: String,
    pub course_url: String,
    pub redownload_existing_subtitles: bool,
}

/// One entry of the course progress page, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsection {
    pub title: String,
    /// Path relative to the site root, e.g. `/courses/abc/courseware/1/`.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SkippedExisting,
    NoTranscript,
    Written { path: PathBuf, bytes: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub skipped_existing: usize,
    pub no_transcript: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::SkippedExisting => self.skipped_existing += 1,
            Outcome::NoTranscript => self.no_transcript += 1,
            Outcome::Written { .. } => self.written += 1,
        }
    }
}
