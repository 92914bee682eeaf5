//! Timeout-rate monitor.
//!
//! When the portal changes its markup the selectors stop matching and jobs
//! start timing out rather than failing loudly. The monitor watches the most
//! recent job outcomes and raises one alert per excursion above the
//! configured timeout ratio.

use crate::config::MonitorConfig;
use std::collections::VecDeque;

/// Raised when timeouts dominate a full window of recent jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftAlert {
    /// Timed-out jobs in the window.
    pub timeouts: usize,
    /// Window size.
    pub window: usize,
}

/// Sliding window over recent job outcomes.
#[derive(Debug)]
pub struct DriftMonitor {
    window: usize,
    ratio: f64,
    recent: VecDeque<bool>,
    alerted: bool,
}

impl DriftMonitor {
    /// Create a monitor. A window of zero disables alerts.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            window: config.window,
            ratio: config.timeout_ratio.clamp(0.0, 1.0),
            recent: VecDeque::with_capacity(config.window),
            alerted: false,
        }
    }

    /// Record one job outcome.
    ///
    /// Returns an alert the first time the window fills past the ratio; no
    /// further alert is raised until the ratio has dropped below it again.
    pub fn record(&mut self, timed_out: bool) -> Option<DriftAlert> {
        if self.window == 0 {
            return None;
        }

        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(timed_out);

        if self.recent.len() < self.window {
            return None;
        }

        let timeouts = self.timeouts();
        if self.exceeds(timeouts) {
            if self.alerted {
                return None;
            }
            self.alerted = true;
            Some(DriftAlert {
                timeouts,
                window: self.window,
            })
        } else {
            self.alerted = false;
            None
        }
    }

    /// Timed-out jobs currently in the window.
    #[must_use]
    pub fn timeouts(&self) -> usize {
        self.recent.iter().filter(|t| **t).count()
    }

    #[allow(clippy::cast_precision_loss)]
    fn exceeds(&self, timeouts: usize) -> bool {
        timeouts > 0 && timeouts as f64 / self.window as f64 >= self.ratio
    }
}
