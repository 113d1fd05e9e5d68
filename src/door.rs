//! Door state machine: motor actuation gated by the limit switches, with
//! overrun compensation and the single-button override.
//!
//! Every transition is deterministic given the current state plus the
//! trigger; there are no internal counters. Undefined (state, trigger) pairs
//! are no-ops. State changes persist through [`DoorStore`] immediately so the
//! last known state survives power loss.

use std::time::Duration;

use crate::hardware::{DebouncedInput, Motor};
use crate::persist::DoorStore;

/// The door's current state. `Unknown` means the true position has not yet
/// been confirmed by a limit switch (cold boot, or a sensor fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Unknown,
    Open,
    Closed,
    Opening,
    Closing,
    StoppedOpening,
    StoppedClosing,
}

impl DoorState {
    pub fn as_str(self) -> &'static str {
        match self {
            DoorState::Unknown => "Unknown",
            DoorState::Open => "Open",
            DoorState::Closed => "Closed",
            DoorState::Opening => "Opening",
            DoorState::Closing => "Closing",
            DoorState::StoppedOpening => "Stopped-Opening",
            DoorState::StoppedClosing => "Stopped-Closing",
        }
    }

    /// Parse the persisted representation; anything unrecognized is `None`
    /// so the caller falls back to `Unknown`.
    pub fn from_stored(s: &str) -> Option<Self> {
        match s {
            "Unknown" => Some(DoorState::Unknown),
            "Open" => Some(DoorState::Open),
            "Closed" => Some(DoorState::Closed),
            "Opening" => Some(DoorState::Opening),
            "Closing" => Some(DoorState::Closing),
            "Stopped-Opening" => Some(DoorState::StoppedOpening),
            "Stopped-Closing" => Some(DoorState::StoppedClosing),
            _ => None,
        }
    }
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the door state, the motor, and the two limit switches.
pub struct Door {
    state: DoorState,
    overrun: Duration,
    sensor_fault: bool,
    motor: Box<dyn Motor>,
    open_switch: DebouncedInput,
    closed_switch: DebouncedInput,
    store: Box<dyn DoorStore>,
}

impl Door {
    /// Build the controller, restoring the persisted state and overrun.
    /// Without a persisted state the door starts `Unknown` and the first
    /// ticks resolve the real position from the closed-limit switch; without
    /// a persisted overrun the configured default applies.
    pub fn new(
        motor: Box<dyn Motor>,
        open_switch: DebouncedInput,
        closed_switch: DebouncedInput,
        mut store: Box<dyn DoorStore>,
        default_overrun: Duration,
    ) -> Self {
        let state = store.load_door_state().unwrap_or(DoorState::Unknown);
        let overrun = store.load_overrun().unwrap_or(default_overrun);
        Self {
            state,
            overrun,
            sensor_fault: false,
            motor,
            open_switch,
            closed_switch,
            store,
        }
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn overrun(&self) -> Duration {
        self.overrun
    }

    /// Whether automation is latched off after a sensor fault. Cleared by
    /// the next manual command.
    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    pub fn set_overrun(&mut self, overrun: Duration) {
        self.overrun = overrun;
        if let Err(e) = self.store.save_overrun(overrun) {
            log_warning!("Failed to persist overrun: {e}");
        }
    }

    fn set_state(&mut self, state: DoorState) {
        if state != self.state {
            log_decorated!("Door: {} → {}", self.state, state);
        }
        self.state = state;
        if let Err(e) = self.store.save_door_state(state) {
            log_warning!("Failed to persist door state: {e}");
        }
    }

    /// Advance the state machine one step: sample the switches, finish any
    /// in-progress travel whose limit switch has made contact, and resolve an
    /// `Unknown` state from the closed-limit switch.
    ///
    /// The only blocking path is the overrun wait after a limit switch
    /// confirms contact; it is bounded by the configured overrun and must not
    /// be interrupted, so the whole tick simply runs long for that one step.
    pub fn tick(&mut self) {
        self.open_switch.update();
        self.closed_switch.update();

        match self.state {
            DoorState::Opening => {
                if self.both_limits_pressed() {
                    self.fault();
                } else if self.open_switch.is_pressed() {
                    self.finish_travel(DoorState::Open);
                }
            }
            DoorState::Closing => {
                if self.both_limits_pressed() {
                    self.fault();
                } else if self.closed_switch.is_pressed() {
                    self.finish_travel(DoorState::Closed);
                }
            }
            DoorState::Unknown if !self.sensor_fault => {
                // Position is only known for certain from a limit switch. If
                // the door already sits on the closed limit, resolve without
                // moving; otherwise start an open attempt.
                if self.closed_switch.is_pressed() {
                    self.motor.stop();
                    self.set_state(DoorState::Closed);
                } else {
                    self.open();
                }
            }
            _ => {}
        }
    }

    /// Open command (alarm or manual). Clears a fault latch: a command is
    /// the external intervention the fault waits for.
    pub fn open(&mut self) {
        self.sensor_fault = false;
        if self.open_switch.is_pressed() {
            self.motor.stop();
            self.set_state(DoorState::Open);
        } else {
            self.set_state(DoorState::Opening);
            self.motor.drive_forward();
        }
    }

    /// Close command (alarm or manual).
    pub fn close(&mut self) {
        self.sensor_fault = false;
        if self.closed_switch.is_pressed() {
            self.motor.stop();
            self.set_state(DoorState::Closed);
        } else {
            self.set_state(DoorState::Closing);
            self.motor.drive_reverse();
        }
    }

    /// Single-button override: reverse from a resting state, halt in place
    /// mid-motion, resume toward the opposite limit from a stopped state.
    pub fn toggle(&mut self) {
        match self.state {
            DoorState::Open => self.close(),
            DoorState::Closed => self.open(),
            DoorState::Opening => self.halt(DoorState::StoppedOpening),
            DoorState::Closing => self.halt(DoorState::StoppedClosing),
            DoorState::StoppedOpening => self.close(),
            DoorState::StoppedClosing => self.open(),
            DoorState::Unknown => self.open(),
        }
    }

    fn halt(&mut self, stopped: DoorState) {
        self.motor.stop();
        self.set_state(stopped);
    }

    fn both_limits_pressed(&self) -> bool {
        self.open_switch.is_pressed() && self.closed_switch.is_pressed()
    }

    /// A limit switch has confirmed contact: keep driving for the overrun so
    /// the door seats fully, then stop. Blocks for at most the configured
    /// overrun.
    fn finish_travel(&mut self, end: DoorState) {
        if !self.overrun.is_zero() {
            std::thread::sleep(self.overrun);
        }
        self.motor.stop();
        self.set_state(end);
    }

    /// Both limit switches pressed mid-motion: sensor fault. Stop the motor,
    /// drop to `Unknown`, and latch automation off until a manual command.
    fn fault(&mut self) {
        self.motor.stop();
        self.sensor_fault = true;
        self.set_state(DoorState::Unknown);
        log_pipe!();
        log_error!("Both limit switches report contact while the door is moving");
        log_indented!("Motor stopped; automation disabled until a manual command");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::InputPin;
    use crate::persist::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Forward,
        Reverse,
        Stop,
    }

    #[derive(Clone, Default)]
    struct RecordedMotor {
        log: Arc<Mutex<Vec<(Cmd, Instant)>>>,
    }

    impl Motor for RecordedMotor {
        fn drive_forward(&mut self) {
            self.log.lock().unwrap().push((Cmd::Forward, Instant::now()));
        }
        fn drive_reverse(&mut self) {
            self.log.lock().unwrap().push((Cmd::Reverse, Instant::now()));
        }
        fn stop(&mut self) {
            self.log.lock().unwrap().push((Cmd::Stop, Instant::now()));
        }
    }

    impl RecordedMotor {
        fn commands(&self) -> Vec<Cmd> {
            self.log.lock().unwrap().iter().map(|(c, _)| *c).collect()
        }
        fn last_stop_at(&self) -> Option<Instant> {
            self.log
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(c, _)| *c == Cmd::Stop)
                .map(|(_, t)| *t)
        }
    }

    struct SharedPin(Arc<AtomicBool>);

    impl InputPin for SharedPin {
        fn read(&mut self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Handle to a MemoryStore that stays observable after the door takes
    /// ownership of its clone.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl DoorStore for SharedStore {
        fn load_door_state(&mut self) -> Option<DoorState> {
            self.0.lock().unwrap().load_door_state()
        }
        fn save_door_state(&mut self, state: DoorState) -> anyhow::Result<()> {
            self.0.lock().unwrap().save_door_state(state)
        }
        fn load_overrun(&mut self) -> Option<Duration> {
            self.0.lock().unwrap().load_overrun()
        }
        fn save_overrun(&mut self, overrun: Duration) -> anyhow::Result<()> {
            self.0.lock().unwrap().save_overrun(overrun)
        }
    }

    struct Rig {
        door: Door,
        motor: RecordedMotor,
        open_level: Arc<AtomicBool>,
        closed_level: Arc<AtomicBool>,
    }

    fn rig_with(initial: Option<DoorState>, open: bool, closed: bool) -> Rig {
        crate::logger::Log::set_enabled(false);
        let motor = RecordedMotor::default();
        let open_level = Arc::new(AtomicBool::new(open));
        let closed_level = Arc::new(AtomicBool::new(closed));
        let open_switch = DebouncedInput::new(
            Box::new(SharedPin(Arc::clone(&open_level))),
            Duration::ZERO,
        );
        let closed_switch = DebouncedInput::new(
            Box::new(SharedPin(Arc::clone(&closed_level))),
            Duration::ZERO,
        );
        let store = MemoryStore {
            door_state: initial,
            ..MemoryStore::default()
        };
        let door = Door::new(
            Box::new(motor.clone()),
            open_switch,
            closed_switch,
            Box::new(store),
            Duration::ZERO,
        );
        Rig {
            door,
            motor,
            open_level,
            closed_level,
        }
    }

    #[test]
    fn boot_on_closed_limit_resolves_closed_without_motion() {
        let mut rig = rig_with(None, false, true);
        assert_eq!(rig.door.state(), DoorState::Unknown);
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Closed);
        assert!(
            !rig.motor.commands().iter().any(|c| matches!(c, Cmd::Forward | Cmd::Reverse)),
            "motor must not be driven: {:?}",
            rig.motor.commands()
        );
    }

    #[test]
    fn boot_off_closed_limit_starts_open_attempt() {
        let mut rig = rig_with(None, false, false);
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Opening);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Forward));

        // Limit switch confirms contact on a later tick.
        rig.open_level.store(true, Ordering::SeqCst);
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Open);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Stop));
    }

    #[test]
    fn open_command_when_already_at_open_limit() {
        let mut rig = rig_with(Some(DoorState::Closed), true, false);
        rig.door.open();
        assert_eq!(rig.door.state(), DoorState::Open);
        assert_eq!(rig.motor.commands(), vec![Cmd::Stop]);
    }

    #[test]
    fn close_command_drives_reverse_until_limit() {
        let mut rig = rig_with(Some(DoorState::Open), true, false);
        rig.door.close();
        assert_eq!(rig.door.state(), DoorState::Closing);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Reverse));

        rig.open_level.store(false, Ordering::SeqCst);
        rig.closed_level.store(true, Ordering::SeqCst);
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Closed);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Stop));
    }

    #[test]
    fn overrun_delays_the_stop_command() {
        let mut rig = rig_with(Some(DoorState::Closed), false, true);
        rig.door.set_overrun(Duration::from_millis(500));
        rig.door.open();
        assert_eq!(rig.door.state(), DoorState::Opening);

        rig.open_level.store(true, Ordering::SeqCst);
        let before = Instant::now();
        rig.door.tick();
        let stop_at = rig.motor.last_stop_at().expect("stop was issued");
        let waited = stop_at.duration_since(before);
        assert!(waited >= Duration::from_millis(500), "waited {waited:?}");
        assert!(waited <= Duration::from_millis(650), "waited {waited:?}");
        assert_eq!(rig.door.state(), DoorState::Open);
    }

    #[test]
    fn override_cycles_stop_and_reverse() {
        let mut rig = rig_with(Some(DoorState::Closed), false, false);
        rig.door.open();
        assert_eq!(rig.door.state(), DoorState::Opening);

        rig.door.toggle();
        assert_eq!(rig.door.state(), DoorState::StoppedOpening);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Stop));

        rig.door.toggle();
        assert_eq!(rig.door.state(), DoorState::Closing);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Reverse));

        rig.door.toggle();
        assert_eq!(rig.door.state(), DoorState::StoppedClosing);

        rig.door.toggle();
        assert_eq!(rig.door.state(), DoorState::Opening);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Forward));
    }

    #[test]
    fn override_from_open_closes_immediately_if_on_limit() {
        let mut rig = rig_with(Some(DoorState::Open), false, true);
        rig.door.toggle();
        assert_eq!(rig.door.state(), DoorState::Closed);
        assert!(!rig.motor.commands().contains(&Cmd::Reverse));
    }

    #[test]
    fn override_from_open_drives_reverse() {
        let mut rig = rig_with(Some(DoorState::Open), true, false);
        rig.door.toggle();
        assert_eq!(rig.door.state(), DoorState::Closing);
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Reverse));
    }

    #[test]
    fn both_limits_mid_motion_is_a_latched_fault() {
        let mut rig = rig_with(Some(DoorState::Open), true, false);
        rig.door.close();
        assert_eq!(rig.door.state(), DoorState::Closing);

        rig.closed_level.store(true, Ordering::SeqCst);
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Unknown);
        assert!(rig.door.sensor_fault());
        assert_eq!(rig.motor.commands().last(), Some(&Cmd::Stop));

        // Automation stays off: further ticks do not resolve Unknown.
        let commands_before = rig.motor.commands().len();
        rig.door.tick();
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Unknown);
        assert_eq!(rig.motor.commands().len(), commands_before);

        // A manual command is the external intervention that clears it.
        rig.open_level.store(false, Ordering::SeqCst);
        rig.door.close();
        assert!(!rig.door.sensor_fault());
        assert_eq!(rig.door.state(), DoorState::Closed);
    }

    #[test]
    fn resting_states_ignore_switch_activity() {
        // Undefined (state, trigger) pairs are no-ops.
        let mut rig = rig_with(Some(DoorState::Open), true, false);
        rig.open_level.store(false, Ordering::SeqCst);
        rig.closed_level.store(true, Ordering::SeqCst);
        rig.door.tick();
        assert_eq!(rig.door.state(), DoorState::Open);
        assert!(rig.motor.commands().is_empty());
    }

    #[test]
    fn state_changes_are_persisted() {
        crate::logger::Log::set_enabled(false);
        let motor = RecordedMotor::default();
        let open_switch = DebouncedInput::new(
            Box::new(SharedPin(Arc::new(AtomicBool::new(false)))),
            Duration::ZERO,
        );
        let closed_switch = DebouncedInput::new(
            Box::new(SharedPin(Arc::new(AtomicBool::new(false)))),
            Duration::ZERO,
        );
        let store = SharedStore::default();
        let mut door = Door::new(
            Box::new(motor),
            open_switch,
            closed_switch,
            Box::new(store.clone()),
            Duration::ZERO,
        );
        door.open();
        door.toggle();

        // Each transition saved: Opening, then StoppedOpening.
        {
            let inner = store.0.lock().unwrap();
            assert_eq!(inner.door_state, Some(DoorState::StoppedOpening));
            assert_eq!(inner.door_state_saves, 2);
        }

        door.set_overrun(Duration::from_millis(250));
        assert_eq!(
            store.0.lock().unwrap().overrun,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn persisted_resting_state_is_restored() {
        let rig = rig_with(Some(DoorState::Open), true, false);
        assert_eq!(rig.door.state(), DoorState::Open);
    }
}
