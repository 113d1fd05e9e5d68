//! Hardware seams for the motor and the three digital inputs.
//!
//! The door logic never touches pins directly: it talks to a [`Motor`] and to
//! [`DebouncedInput`]s wrapping raw [`InputPin`]s. Real deployments implement
//! these traits over GPIO; the built-in [`sim`] module implements them over a
//! modelled door so the binary and the tests can run end to end.

use std::time::{Duration, Instant};

pub mod sim;

/// Binary direction control for the door motor. No speed control; the only
/// feedback is the limit switches.
pub trait Motor: Send {
    fn drive_forward(&mut self);
    fn drive_reverse(&mut self);
    fn stop(&mut self);
}

/// A raw digital input. `true` means contact (switch pressed).
pub trait InputPin: Send {
    fn read(&mut self) -> bool;
}

/// Debounced view of an [`InputPin`] with level and edge queries.
///
/// A raw level change only becomes the stable level once it has held for the
/// debounce window; faster toggles are ignored. Edges are latched and
/// consumed by `just_pressed`/`just_released`.
pub struct DebouncedInput {
    pin: Box<dyn InputPin>,
    debounce: Duration,
    stable: bool,
    candidate: bool,
    changed_at: Instant,
    rose: bool,
    fell: bool,
}

impl DebouncedInput {
    /// Wrap a pin, priming the stable level from an immediate read so boot
    /// sees the true switch position without generating an edge.
    pub fn new(mut pin: Box<dyn InputPin>, debounce: Duration) -> Self {
        let level = pin.read();
        Self {
            pin,
            debounce,
            stable: level,
            candidate: level,
            changed_at: Instant::now(),
            rose: false,
            fell: false,
        }
    }

    /// Sample the raw pin and advance the debounce state. Call once per tick.
    pub fn update(&mut self) {
        let raw = self.pin.read();
        if raw != self.candidate {
            self.candidate = raw;
            self.changed_at = Instant::now();
        }
        if self.candidate != self.stable && self.changed_at.elapsed() >= self.debounce {
            self.stable = self.candidate;
            if self.stable {
                self.rose = true;
            } else {
                self.fell = true;
            }
        }
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    /// Debounced level, inverted.
    pub fn is_released(&self) -> bool {
        !self.stable
    }

    /// One-shot rising edge since the last call.
    pub fn just_pressed(&mut self) -> bool {
        std::mem::take(&mut self.rose)
    }

    /// One-shot falling edge since the last call.
    pub fn just_released(&mut self) -> bool {
        std::mem::take(&mut self.fell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct SharedPin(Arc<AtomicBool>);

    impl InputPin for SharedPin {
        fn read(&mut self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn pin_pair(initial: bool) -> (Arc<AtomicBool>, Box<dyn InputPin>) {
        let level = Arc::new(AtomicBool::new(initial));
        (Arc::clone(&level), Box::new(SharedPin(level)))
    }

    #[test]
    fn boot_level_is_primed_without_edge() {
        let (_, pin) = pin_pair(true);
        let mut input = DebouncedInput::new(pin, Duration::ZERO);
        assert!(input.is_pressed());
        assert!(!input.just_pressed());
    }

    #[test]
    fn zero_debounce_follows_level_with_edges() {
        let (level, pin) = pin_pair(false);
        let mut input = DebouncedInput::new(pin, Duration::ZERO);

        level.store(true, Ordering::SeqCst);
        input.update();
        assert!(input.is_pressed());
        assert!(input.just_pressed());
        assert!(!input.just_pressed(), "edge is consumed");

        level.store(false, Ordering::SeqCst);
        input.update();
        assert!(input.is_released());
        assert!(input.just_released());
    }

    #[test]
    fn fast_toggle_inside_window_is_ignored() {
        let (level, pin) = pin_pair(false);
        let mut input = DebouncedInput::new(pin, Duration::from_millis(50));

        level.store(true, Ordering::SeqCst);
        input.update();
        assert!(input.is_released(), "change not yet stable");

        // Bounce back before the window elapses: no edge ever fires.
        level.store(false, Ordering::SeqCst);
        input.update();
        std::thread::sleep(Duration::from_millis(60));
        input.update();
        assert!(input.is_released());
        assert!(!input.just_pressed());
    }

    #[test]
    fn change_becomes_stable_after_window() {
        let (level, pin) = pin_pair(false);
        let mut input = DebouncedInput::new(pin, Duration::from_millis(20));

        level.store(true, Ordering::SeqCst);
        input.update();
        std::thread::sleep(Duration::from_millis(30));
        input.update();
        assert!(input.is_pressed());
        assert!(input.just_pressed());
    }
}
