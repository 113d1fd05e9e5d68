//! Simulated door rig.
//!
//! Models a door carriage travelling between two limit switches at constant
//! speed. The motor sets a direction, the carriage position advances with
//! wall-clock time, and the limit switch pins read directly from the modelled
//! position. A little mechanical slack past each limit lets the overrun wait
//! drive "into the stop" the way the real hardware does.
//!
//! The binary runs against this rig; tests use it to drive full
//! open/close/override sequences without hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::{InputPin, Motor};

/// Travel slack past each limit switch, in milliseconds of motion.
const SLACK_MS: f64 = 200.0;

struct RigState {
    /// Carriage position in milliseconds of travel; 0 is the closed limit,
    /// `travel_ms` the open limit.
    position_ms: f64,
    travel_ms: f64,
    direction: i8,
    last_step: Instant,
}

impl RigState {
    fn advance(&mut self) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.last_step).as_secs_f64() * 1000.0;
        self.last_step = now;
        self.position_ms += elapsed_ms * f64::from(self.direction);
        self.position_ms = self.position_ms.clamp(-SLACK_MS, self.travel_ms + SLACK_MS);
    }
}

/// Handle to a simulated door rig. Produces the boxed trait objects the door
/// controller consumes, and exposes the modelled state for tests and logging.
#[derive(Clone)]
pub struct SimRig {
    state: Arc<Mutex<RigState>>,
    override_pressed: Arc<AtomicBool>,
}

impl SimRig {
    /// Build a rig whose full travel takes `travel_ms` of motor run time.
    pub fn new(travel_ms: u64, start_closed: bool) -> Self {
        let travel_ms = travel_ms as f64;
        Self {
            state: Arc::new(Mutex::new(RigState {
                position_ms: if start_closed { 0.0 } else { travel_ms / 2.0 },
                travel_ms,
                direction: 0,
                last_step: Instant::now(),
            })),
            override_pressed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn motor(&self) -> Box<dyn Motor> {
        Box::new(SimMotor { state: Arc::clone(&self.state) })
    }

    pub fn open_switch_pin(&self) -> Box<dyn InputPin> {
        Box::new(SimLimitPin { state: Arc::clone(&self.state), open_end: true })
    }

    pub fn closed_switch_pin(&self) -> Box<dyn InputPin> {
        Box::new(SimLimitPin { state: Arc::clone(&self.state), open_end: false })
    }

    pub fn override_pin(&self) -> Box<dyn InputPin> {
        Box::new(SimButtonPin { pressed: Arc::clone(&self.override_pressed) })
    }

    /// Hold or release the simulated override button.
    pub fn set_override(&self, pressed: bool) {
        self.override_pressed.store(pressed, Ordering::SeqCst);
    }

    /// Carriage position as a fraction of travel (0 closed, 1 open). May
    /// slightly exceed the range while driving into the slack.
    pub fn position_fraction(&self) -> f64 {
        let mut s = self.state.lock().unwrap();
        s.advance();
        s.position_ms / s.travel_ms
    }
}

struct SimMotor {
    state: Arc<Mutex<RigState>>,
}

impl Motor for SimMotor {
    fn drive_forward(&mut self) {
        let mut s = self.state.lock().unwrap();
        s.advance();
        s.direction = 1;
    }

    fn drive_reverse(&mut self) {
        let mut s = self.state.lock().unwrap();
        s.advance();
        s.direction = -1;
    }

    fn stop(&mut self) {
        let mut s = self.state.lock().unwrap();
        s.advance();
        s.direction = 0;
    }
}

struct SimLimitPin {
    state: Arc<Mutex<RigState>>,
    open_end: bool,
}

impl InputPin for SimLimitPin {
    fn read(&mut self) -> bool {
        let mut s = self.state.lock().unwrap();
        s.advance();
        if self.open_end {
            s.position_ms >= s.travel_ms
        } else {
            s.position_ms <= 0.0
        }
    }
}

struct SimButtonPin {
    pressed: Arc<AtomicBool>,
}

impl InputPin for SimButtonPin {
    fn read(&mut self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_on_closed_limit() {
        let rig = SimRig::new(100, true);
        let mut closed = rig.closed_switch_pin();
        let mut open = rig.open_switch_pin();
        assert!(closed.read());
        assert!(!open.read());
    }

    #[test]
    fn forward_travel_reaches_open_limit() {
        let rig = SimRig::new(40, true);
        let mut motor = rig.motor();
        let mut open = rig.open_switch_pin();

        motor.drive_forward();
        std::thread::sleep(Duration::from_millis(80));
        assert!(open.read());
        motor.stop();

        // Position saturates inside the slack, not unbounded.
        assert!(rig.position_fraction() <= 1.0 + SLACK_MS / 40.0 + f64::EPSILON);
    }

    #[test]
    fn reverse_travel_returns_to_closed_limit() {
        let rig = SimRig::new(40, false);
        let mut motor = rig.motor();
        let mut closed = rig.closed_switch_pin();

        motor.drive_reverse();
        std::thread::sleep(Duration::from_millis(80));
        motor.stop();
        assert!(closed.read());
    }

    #[test]
    fn override_button_reflects_handle() {
        let rig = SimRig::new(40, true);
        let mut pin = rig.override_pin();
        assert!(!pin.read());
        rig.set_override(true);
        assert!(pin.read());
        rig.set_override(false);
        assert!(!pin.read());
    }
}
