/// Performance measurement utilities
/// Frame stages are timed and reported through `log::debug!`
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::debug!("{}: {}us", self.name, self.elapsed().as_micros());
    }
}

/// Rolling frame-time average used for the window title.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
    accumulated: Duration,
    frames: u32,
    fps: f32,
}

impl FrameTimer {
    /// How often the FPS figure is refreshed.
    pub const REPORT_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            accumulated: Duration::ZERO,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Mark the end of a frame. Returns seconds since the previous call.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        self.accumulated += dt;
        self.frames += 1;
        if self.accumulated >= Self::REPORT_INTERVAL {
            self.fps = self.frames as f32 / self.accumulated.as_secs_f32();
            self.accumulated = Duration::ZERO;
            self.frames = 0;
        }
        dt.as_secs_f32()
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
