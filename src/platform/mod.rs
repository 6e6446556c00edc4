//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Monotonic frame time (`performance.now()` on web, `Instant` natively)
//! - Wall-clock timestamps for saved progress

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Monotonic time since an arbitrary origin
pub trait MonotonicClock {
    fn now(&self) -> Duration;
}

/// Hand-driven clock for tests and headless runs; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::InstantClock;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::{Duration, Instant};

    use super::MonotonicClock;

    #[derive(Debug, Clone, Copy)]
    pub struct InstantClock {
        origin: Instant,
    }

    impl InstantClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for InstantClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MonotonicClock for InstantClock {
        fn now(&self) -> Duration {
            self.origin.elapsed()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::PerformanceClock;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::time::Duration;

    use web_sys::Performance;

    use super::MonotonicClock;

    /// `performance.now()`; reads zero if the API is missing
    pub struct PerformanceClock {
        performance: Option<Performance>,
    }

    impl PerformanceClock {
        pub fn new() -> Self {
            Self {
                performance: web_sys::window().and_then(|w| w.performance()),
            }
        }
    }

    impl Default for PerformanceClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MonotonicClock for PerformanceClock {
        fn now(&self) -> Duration {
            let ms = self.performance.as_ref().map_or(0.0, |p| p.now());
            Duration::from_secs_f64(ms.max(0.0) / 1000.0)
        }
    }
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn epoch_millis() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn epoch_millis() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let view = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(view.now(), Duration::from_millis(250));
        clock.set(Duration::from_secs(2));
        assert_eq!(view.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_instant_clock_is_monotonic() {
        let clock = InstantClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(epoch_millis() > 0.0);
    }
}
