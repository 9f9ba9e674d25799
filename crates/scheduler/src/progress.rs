use std::fmt;
use std::time::Duration;

/// One completed compute pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub pass: u32,
    pub total_passes: u32,
    pub samples_per_pass: u32,
    pub elapsed: Duration,
}

impl PassReport {
    pub fn percent(&self) -> f64 {
        f64::from(self.pass) * 100.0 / f64::from(self.total_passes.max(1))
    }
}

/// The pass index is padded to the digit width of the pass count.
impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total_passes.to_string().len();
        let plural = if self.samples_per_pass == 1 { "" } else { "s" };
        write!(
            f,
            "[{pass:>width$}/{total} | {percent:>5.1}%] Rendered {samples} sample{plural}/pixel in {ms} ms",
            pass = self.pass,
            total = self.total_passes,
            percent = self.percent(),
            samples = self.samples_per_pass,
            ms = self.elapsed.as_millis(),
        )
    }
}

/// Totals for a run that reached its last pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub width: u32,
    pub height: u32,
    pub passes: u32,
    pub samples_per_pixel: u32,
    pub compute_time: Duration,
}

impl RenderSummary {
    pub fn mean_ms_per_sample(&self) -> f64 {
        if self.samples_per_pixel == 0 {
            return 0.0;
        }
        self.compute_time.as_secs_f64() * 1000.0 / f64::from(self.samples_per_pixel)
    }
}

impl fmt::Display for RenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "=> Rendered {}x{} image with {} samples/pixel in {} ms (mean {:.2} ms / sample)",
            self.width,
            self.height,
            self.samples_per_pixel,
            self.compute_time.as_millis(),
            self.mean_ms_per_sample(),
        )
    }
}

/// Everything a host hears from a run, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Pass(PassReport),
    Completed(RenderSummary),
    Cancelled {
        completed_passes: u32,
        total_passes: u32,
        samples_per_pixel: u32,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Pass(report) => report.fmt(f),
            ProgressEvent::Completed(summary) => summary.fmt(f),
            ProgressEvent::Cancelled {
                completed_passes,
                total_passes,
                samples_per_pixel,
            } => write!(
                f,
                "=> Cancelled after {completed_passes}/{total_passes} passes ({samples_per_pixel} samples/pixel accumulated)"
            ),
        }
    }
}

/// Receives progress events from a run.
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl ProgressSink for Vec<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

impl ProgressSink for crossbeam_channel::Sender<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        // A host that stopped listening does not stop the run.
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(pass: u32, total: u32, samples: u32, ms: u64) -> PassReport {
        PassReport {
            pass,
            total_passes: total,
            samples_per_pass: samples,
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn pass_line_pads_index_and_percentage() {
        assert_eq!(
            pass(7, 100, 1, 42).to_string(),
            "[  7/100 |   7.0%] Rendered 1 sample/pixel in 42 ms"
        );
        assert_eq!(
            pass(100, 100, 1, 40).to_string(),
            "[100/100 | 100.0%] Rendered 1 sample/pixel in 40 ms"
        );
        assert_eq!(
            pass(1, 4, 3, 5).to_string(),
            "[1/4 |  25.0%] Rendered 3 samples/pixel in 5 ms"
        );
    }

    #[test]
    fn pass_index_width_follows_pass_count_not_sample_count() {
        // 100 samples/pixel in passes of 25: four passes, so one digit.
        assert_eq!(
            pass(2, 4, 25, 8).to_string(),
            "[2/4 |  50.0%] Rendered 25 samples/pixel in 8 ms"
        );
    }

    #[test]
    fn summary_reports_mean_per_computed_sample() {
        let summary = RenderSummary {
            width: 1920,
            height: 1080,
            passes: 4,
            samples_per_pixel: 12,
            compute_time: Duration::from_millis(300),
        };
        assert_eq!(
            summary.to_string(),
            "=> Rendered 1920x1080 image with 12 samples/pixel in 300 ms (mean 25.00 ms / sample)"
        );
    }

    #[test]
    fn cancelled_line_names_progress() {
        let event = ProgressEvent::Cancelled {
            completed_passes: 3,
            total_passes: 10,
            samples_per_pixel: 3,
        };
        assert_eq!(
            event.to_string(),
            "=> Cancelled after 3/10 passes (3 samples/pixel accumulated)"
        );
    }

    #[test]
    fn channel_sink_forwards_and_ignores_hangups() {
        let (mut sender, receiver) = crossbeam_channel::unbounded();
        sender.report(ProgressEvent::Pass(pass(1, 1, 1, 1)));
        assert!(matches!(receiver.recv(), Ok(ProgressEvent::Pass(_))));
        drop(receiver);
        sender.report(ProgressEvent::Pass(pass(1, 1, 1, 1)));
    }
}
