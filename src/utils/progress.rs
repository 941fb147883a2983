use std::io::Write;
use std::time::{Duration, Instant};

/// Live `n/total` line on stderr, plus a debug event per step.
pub struct ProgressReporter {
    total: usize,
    current: usize,
    start_time: Instant,
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(total: usize, enabled: bool) -> Self {
        Self {
            total,
            current: 0,
            start_time: Instant::now(),
            enabled,
        }
    }

    pub fn tick(&mut self) {
        self.current += 1;
        tracing::debug!("Processed {}/{} records", self.current, self.total);

        if self.enabled {
            let mut stderr = std::io::stderr().lock();
            // 進度列寫在同一行
            let _ = write!(stderr, "\rGeocoding records: {}/{}", self.current, self.total);
            if self.current >= self.total {
                let _ = writeln!(stderr);
            }
            let _ = stderr.flush();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
