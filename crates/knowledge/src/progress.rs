//! Structured progress reporting for ingestion.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Stage of an ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Discover,
    Extract,
    Chunk,
    Embed,
    Store,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::Extract => "extract",
            Self::Chunk => "chunk",
            Self::Embed => "embed",
            Self::Store => "store",
        }
    }
}

/// Progress event emitted during ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub phase: Phase,

    /// Units done so far (files, chunks)
    pub current: u64,

    /// Units expected, if known
    pub total: Option<u64>,

    /// 0.0 - 100.0
    pub percentage: Option<f64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, current: u64, total: Option<u64>, message: impl Into<String>) -> Self {
        let percentage = total.map(|t| {
            if t > 0 {
                (current as f64 / t as f64) * 100.0
            } else {
                100.0
            }
        });

        Self {
            phase,
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// One line for terminal output.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase.as_str(), progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Sends progress events to a callback and the debug log.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let event = event.with_elapsed(self.start_time.elapsed().as_secs_f64());

        tracing::debug!(
            phase = event.phase.as_str(),
            current = event.current,
            total = ?event.total,
            percentage = ?event.percentage,
            elapsed_secs = ?event.elapsed_secs,
            "{}",
            event.message
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn discover(&self, found: u64, path: &str) {
        self.emit(ProgressEvent::new(
            Phase::Discover,
            found,
            None,
            format!("scanning {}", path),
        ));
    }

    pub fn extract(&self, current: u64, total: u64, file: &str) {
        self.emit(ProgressEvent::new(
            Phase::Extract,
            current,
            Some(total),
            format!("reading {}", file),
        ));
    }

    pub fn chunk(&self, current: u64, total: u64, file: &str, chunks_created: usize) {
        self.emit(ProgressEvent::new(
            Phase::Chunk,
            current,
            Some(total),
            format!("{}: {} chunks", file, chunks_created),
        ));
    }

    pub fn embed(&self, done: u64, total: u64, model: &str) {
        self.emit(ProgressEvent::new(
            Phase::Embed,
            done,
            Some(total),
            format!("model={}", model),
        ));
    }

    pub fn store(&self, current: u64, total: u64, file: &str) {
        self.emit(ProgressEvent::new(
            Phase::Store,
            current,
            Some(total),
            format!("writing {} to SQLite", file),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new(Phase::Embed, 5, Some(10), "model=trigram-v1");
        assert_eq!(event.format_simple(), "[embed] 5/10 (50%) - model=trigram-v1");

        let open = ProgressEvent::new(Phase::Discover, 3, None, "scanning docs");
        assert_eq!(open.format_simple(), "[discover] 3 - scanning docs");
    }

    #[test]
    fn test_zero_total_is_complete() {
        let event = ProgressEvent::new(Phase::Store, 0, Some(0), "nothing");
        assert_eq!(event.percentage, Some(100.0));
    }

    #[test]
    fn test_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::new(Arc::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(event);
        }));

        reporter.extract(1, 2, "lease.pdf");
        reporter.chunk(1, 2, "lease.pdf", 7);

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].phase, Phase::Extract);
        assert_eq!(captured[1].message, "lease.pdf: 7 chunks");
        assert!(captured[1].elapsed_secs.is_some());
    }

    #[test]
    fn test_noop_reporter() {
        ProgressReporter::noop().discover(1, "docs");
    }
}
