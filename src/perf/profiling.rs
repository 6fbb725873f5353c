/// Instrumentation for the rasterizer's hot paths
/// Call counting is compiled in with the `profiling` feature, which also
/// enables hardware performance counters through `perf-event`
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! function_counters {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        /// Thread-safe counters, one per instrumented event
        pub struct FunctionCounters {
            $($(#[$doc])* pub $name: AtomicU64,)*
        }

        impl FunctionCounters {
            pub const fn new() -> Self {
                Self {
                    $($name: AtomicU64::new(0),)*
                }
            }

            /// Reset all counters to zero
            pub fn reset(&self) {
                $(self.$name.store(0, Ordering::Relaxed);)*
            }

            pub fn snapshot(&self) -> CounterSnapshot {
                CounterSnapshot {
                    $($name: self.$name.load(Ordering::Relaxed),)*
                }
            }
        }

        /// Counter values at a point in time
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct CounterSnapshot {
            $(pub $name: u64,)*
        }
    };
}

function_counters! {
    // Vertex stage
    vertices_transformed,

    // Triangle setup
    triangles_submitted,
    triangles_degenerate,
    triangles_outside_ndc,
    triangles_near_zero_w,
    triangles_near_zero_z,
    triangles_zero_area,
    /// Removed by the cull mode.
    triangles_culled,

    // Per pixel
    pixels_covered,
    depth_test_passed,
    depth_test_failed,
    pixels_shaded,

    framebuffer_clear_calls,
}

impl CounterSnapshot {
    pub fn depth_pass_rate(&self) -> Option<f64> {
        let tested = self.depth_test_passed + self.depth_test_failed;
        (tested > 0).then(|| self.depth_test_passed as f64 / tested as f64)
    }

    pub fn log_report(&self) {
        log::info!(
            "vertices: {} transformed | triangles: {} submitted, {} degenerate, {} outside ndc, {} near-zero w, {} near-zero z, {} zero area, {} culled",
            self.vertices_transformed,
            self.triangles_submitted,
            self.triangles_degenerate,
            self.triangles_outside_ndc,
            self.triangles_near_zero_w,
            self.triangles_near_zero_z,
            self.triangles_zero_area,
            self.triangles_culled,
        );
        log::info!(
            "pixels: {} covered, {} shaded | depth test: {} passed, {} failed{} | clears: {}",
            self.pixels_covered,
            self.pixels_shaded,
            self.depth_test_passed,
            self.depth_test_failed,
            self.depth_pass_rate()
                .map(|r| format!(" ({:.2}%)", r * 100.0))
                .unwrap_or_default(),
            self.framebuffer_clear_calls,
        );
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Hardware performance counters around a measured region
#[cfg(feature = "profiling")]
pub mod hardware {
    use perf_event::events::Hardware;
    use perf_event::{Builder, Counter};

    const EVENTS: [(&str, Hardware); 6] = [
        ("cpu cycles", Hardware::CPU_CYCLES),
        ("instructions", Hardware::INSTRUCTIONS),
        ("cache references", Hardware::CACHE_REFERENCES),
        ("cache misses", Hardware::CACHE_MISSES),
        ("branch instructions", Hardware::BRANCH_INSTRUCTIONS),
        ("branch misses", Hardware::BRANCH_MISSES),
    ];

    /// Counters the kernel refused to open are skipped and read as zero.
    pub struct PerfCounters {
        counters: Vec<Option<Counter>>,
    }

    impl PerfCounters {
        pub fn new() -> Self {
            let counters = EVENTS
                .iter()
                .map(|(name, kind)| match Builder::new().kind(kind.clone()).build() {
                    Ok(counter) => Some(counter),
                    Err(err) => {
                        log::warn!("hardware counter '{name}' unavailable: {err}");
                        None
                    }
                })
                .collect();
            Self { counters }
        }

        pub fn enable_all(&mut self) {
            for c in self.counters.iter_mut().flatten() {
                let _ = c.enable();
            }
        }

        pub fn disable_all(&mut self) {
            for c in self.counters.iter_mut().flatten() {
                let _ = c.disable();
            }
        }

        pub fn reset_all(&mut self) {
            for c in self.counters.iter_mut().flatten() {
                let _ = c.reset();
            }
        }

        pub fn read_all(&mut self) -> PerfSnapshot {
            let mut values = [0u64; 6];
            for (value, counter) in values.iter_mut().zip(self.counters.iter_mut()) {
                *value = counter.as_mut().and_then(|c| c.read().ok()).unwrap_or(0);
            }
            PerfSnapshot {
                cpu_cycles: values[0],
                instructions: values[1],
                cache_references: values[2],
                cache_misses: values[3],
                branch_instructions: values[4],
                branch_misses: values[5],
            }
        }
    }

    impl Default for PerfCounters {
        fn default() -> Self {
            Self::new()
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct PerfSnapshot {
        pub cpu_cycles: u64,
        pub instructions: u64,
        pub cache_references: u64,
        pub cache_misses: u64,
        pub branch_instructions: u64,
        pub branch_misses: u64,
    }

    impl PerfSnapshot {
        pub fn instructions_per_cycle(&self) -> Option<f64> {
            (self.cpu_cycles > 0).then(|| self.instructions as f64 / self.cpu_cycles as f64)
        }

        pub fn log_report(&self) {
            log::info!(
                "cycles: {} | instructions: {} | ipc: {:.3}",
                self.cpu_cycles,
                self.instructions,
                self.instructions_per_cycle().unwrap_or(0.0)
            );
            log::info!(
                "cache: {} refs, {} misses | branches: {} total, {} missed",
                self.cache_references,
                self.cache_misses,
                self.branch_instructions,
                self.branch_misses
            );
        }
    }
}
