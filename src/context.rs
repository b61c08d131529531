//! State shared between all devices of one reader.

use std::time::Duration;

/// Passed by reference into every engine call; the engine never stores it.
#[derive(Debug, Clone, Default)]
pub struct ReaderContext {
    /// Keyboard modifier state attached to emitted notifications.
    pub meta_state: i32,
    disable_virtual_keys_until: Duration,
}

impl ReaderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress virtual keys on every device until `until`.
    pub fn disable_virtual_keys_until(&mut self, until: Duration) {
        self.disable_virtual_keys_until = until;
    }

    /// Whether a virtual key press at `now` falls in the quiet window.
    pub fn should_drop_virtual_key(&self, now: Duration, key_code: i32, scan_code: i32) -> bool {
        if now < self.disable_virtual_keys_until {
            log::info!(
                "Dropping virtual key from device because virtual keys are temporarily disabled \
                 for the next {:?}: keyCode={}, scanCode={}",
                self.disable_virtual_keys_until - now,
                key_code,
                scan_code
            );
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_window() {
        let mut ctx = ReaderContext::new();
        assert!(!ctx.should_drop_virtual_key(Duration::ZERO, 4, 158));

        ctx.disable_virtual_keys_until(Duration::from_millis(100));
        assert!(ctx.should_drop_virtual_key(Duration::from_millis(99), 4, 158));
        assert!(!ctx.should_drop_virtual_key(Duration::from_millis(100), 4, 158));
    }
}
