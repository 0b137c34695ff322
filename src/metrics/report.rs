use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::ImageRole;
use crate::model::ReportEntryRecord;

const REPORT_HEADER: &str = "=== Image-Text Comparison Metrics ===";
const REPORT_FOOTER: &str = "=====================================";

/// Why a metric fell back to its sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricFailure {
    Error(String),
    TimedOut(Duration),
    Panicked(String),
}

impl MetricFailure {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Error(_) => "failed",
            Self::TimedOut(_) => "timed_out",
            Self::Panicked(_) => "panicked",
        }
    }
}

impl fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "{message}"),
            Self::TimedOut(limit) => write!(f, "timed out after {} ms", limit.as_millis()),
            Self::Panicked(message) => write!(f, "calculator panicked: {message}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricEntry {
    pub key: String,
    pub metric: &'static str,
    pub role: Option<ImageRole>,
    pub outcome: Result<f64, MetricFailure>,
    pub sentinel: f64,
    pub duration: Duration,
}

impl MetricEntry {
    /// The computed value, or the metric's sentinel on failure.
    pub fn score(&self) -> f64 {
        match &self.outcome {
            Ok(score) => *score,
            Err(_) => self.sentinel,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn status(&self) -> &'static str {
        match &self.outcome {
            Ok(_) => "computed",
            Err(failure) => failure.status(),
        }
    }

    pub fn to_record(&self) -> ReportEntryRecord {
        ReportEntryRecord {
            key: self.key.clone(),
            metric: self.metric.to_string(),
            role: self.role.map(|role| role.as_str().to_string()),
            score: self.score(),
            status: self.status().to_string(),
            error: self.outcome.as_ref().err().map(ToString::to_string),
            duration_ms: self.duration.as_millis(),
        }
    }
}

/// Result of one `collect()` call; entries are in deterministic key order.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub run_id: String,
    pub entries: Vec<MetricEntry>,
    pub duration: Duration,
}

impl MetricsReport {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entry(key).map(MetricEntry::score)
    }

    pub fn entry(&self, key: &str) -> Option<&MetricEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.key.as_str()).collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.score()))
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_failed()).count()
    }
}

/// `Title Case Name: 12.34` per entry between a header and footer rule.
pub fn format_report(report: &MetricsReport) -> String {
    let mut lines = Vec::with_capacity(report.entries.len() + 2);
    lines.push(REPORT_HEADER.to_string());
    for entry in &report.entries {
        lines.push(format!("{}: {:.2}", title_case(&entry.key), entry.score()));
    }
    lines.push(REPORT_FOOTER.to_string());
    lines.join("\n")
}

/// `original_clip_similarity` -> `Original Clip Similarity`.
pub fn title_case(key: &str) -> String {
    let mut output = String::with_capacity(key.len());
    let mut word_start = true;

    for character in key.chars() {
        let character = if character == '_' { ' ' } else { character };
        if character.is_alphabetic() {
            if word_start {
                output.extend(character.to_uppercase());
            } else {
                output.extend(character.to_lowercase());
            }
            word_start = false;
        } else {
            output.push(character);
            word_start = true;
        }
    }

    output
}
