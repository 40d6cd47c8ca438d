//! Rapid-keystroke safety override

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::types::Seconds;

/// Arms after `required` presses land inside a rolling `window`.
///
/// Once armed it stays armed until the next blocked warp engagement consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyOverride {
    presses: VecDeque<Seconds>,
    required: usize,
    window: Seconds,
    armed: bool,
}

impl SafetyOverride {
    pub fn new(required: usize, window: Seconds) -> Self {
        Self {
            presses: VecDeque::with_capacity(required),
            required: required.max(1),
            window,
            armed: false,
        }
    }

    /// Record a press at `now`; returns true when this press armed the override
    pub fn press(&mut self, now: Seconds) -> bool {
        if self.armed {
            return false;
        }
        self.presses.push_back(now);
        while let Some(&oldest) = self.presses.front() {
            if now - oldest > self.window {
                self.presses.pop_front();
            } else {
                break;
            }
        }
        if self.presses.len() >= self.required {
            self.presses.clear();
            self.armed = true;
            return true;
        }
        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Presses still needed inside the current window
    pub fn presses_remaining(&self) -> usize {
        if self.armed {
            0
        } else {
            self.required - self.presses.len()
        }
    }

    /// Spend the override; returns whether it was armed
    pub fn consume(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arms_after_rapid_presses() {
        let mut safety = SafetyOverride::new(3, 1.0);
        assert!(!safety.press(0.0));
        assert!(!safety.press(0.3));
        assert!(safety.press(0.6));
        assert!(safety.is_armed());
    }

    #[test]
    fn test_slow_presses_never_arm() {
        let mut safety = SafetyOverride::new(3, 1.0);
        safety.press(0.0);
        safety.press(0.8);
        safety.press(1.6); // first press has fallen out of the window
        assert!(!safety.is_armed());
        assert_eq!(safety.presses_remaining(), 1);
        safety.press(1.7);
        assert!(safety.is_armed());
    }

    #[test]
    fn test_consume_disarms() {
        let mut safety = SafetyOverride::new(2, 1.0);
        safety.press(0.0);
        safety.press(0.1);
        assert!(safety.consume());
        assert!(!safety.is_armed());
        assert!(!safety.consume());
    }
}
