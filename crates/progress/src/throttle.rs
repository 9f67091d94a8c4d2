use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Render-rate limiter so rapid progress updates coalesce into one draw.
pub struct Throttle {
    /// Last update timestamp in epoch millis
    last_update: AtomicU64,
    /// Minimum interval between draws (in milliseconds)
    interval_ms: u64,
}

impl Throttle {
    /// Default draw interval (100ms)
    pub fn new() -> Self {
        Self::with_interval(100)
    }

    pub fn with_interval(interval_ms: u64) -> Self {
        Self {
            last_update: AtomicU64::new(0),
            interval_ms,
        }
    }

    /// Whether enough time has passed to draw again; claims the slot if so.
    pub fn should_update(&self) -> bool {
        let now = now_millis();
        let last = self.last_update.load(Ordering::Relaxed);
        if now.saturating_sub(last) >= self.interval_ms {
            self.last_update.store(now, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Claim the slot unconditionally (terminal-state transitions).
    pub fn force_update(&self) {
        self.last_update.store(now_millis(), Ordering::Relaxed);
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn coalesces_rapid_updates() {
        let throttle = Throttle::with_interval(50);
        assert!(throttle.should_update());
        assert!(!throttle.should_update());
        sleep(Duration::from_millis(60));
        assert!(throttle.should_update());
    }

    #[test]
    fn force_resets_the_window() {
        let throttle = Throttle::with_interval(50);
        throttle.force_update();
        assert!(!throttle.should_update());
    }
}
