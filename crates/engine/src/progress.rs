use std::fmt;
use std::time::{Duration, Instant};

/// One progress line per flush. Pure data; rendering happens in
/// `Display` and emission is left to the caller.
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub label: String,
    pub elapsed: Duration,
    pub processed: u64,
    pub total: u64,
    pub finished: bool,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.finished {
            f.write_str("Finished ")?;
        }
        write!(f, "{}, ", self.label)?;

        // Seconds up to ten minutes, minutes past that.
        let secs = self.elapsed.as_secs_f64();
        if secs <= 600.0 {
            write!(f, "{:.2} seconds", secs)?;
        } else {
            write!(f, "{:.2} minutes", secs / 60.0)?;
        }

        write!(f, ", {} of {}", self.processed, self.total)
    }
}

/// Captures the start of a run and stamps reports against it.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    label: String,
    started_at: Instant,
}

impl ProgressTracker {
    pub fn new(label: &str) -> Self {
        ProgressTracker {
            label: label.to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn report(&self, processed: u64, total: u64, finished: bool) -> ProgressReport {
        self.report_at(self.started_at.elapsed(), processed, total, finished)
    }

    fn report_at(
        &self,
        elapsed: Duration,
        processed: u64,
        total: u64,
        finished: bool,
    ) -> ProgressReport {
        ProgressReport {
            label: self.label.clone(),
            elapsed,
            processed,
            total,
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(secs: f64, finished: bool) -> ProgressReport {
        ProgressTracker::new("reindex metadata").report_at(
            Duration::from_secs_f64(secs),
            1000,
            2500,
            finished,
        )
    }

    #[test]
    fn short_runs_render_in_seconds() {
        assert_eq!(
            report(59.99, false).to_string(),
            "reindex metadata, 59.99 seconds, 1000 of 2500"
        );
    }

    #[test]
    fn ten_minutes_is_still_seconds() {
        assert_eq!(
            report(600.0, false).to_string(),
            "reindex metadata, 600.00 seconds, 1000 of 2500"
        );
    }

    #[test]
    fn past_ten_minutes_renders_in_minutes() {
        assert_eq!(
            report(600.01, false).to_string(),
            "reindex metadata, 10.00 minutes, 1000 of 2500"
        );
        assert_eq!(
            report(750.0, false).to_string(),
            "reindex metadata, 12.50 minutes, 1000 of 2500"
        );
    }

    #[test]
    fn final_report_is_prefixed() {
        assert_eq!(
            report(12.0, true).to_string(),
            "Finished reindex metadata, 12.00 seconds, 1000 of 2500"
        );
    }
}
