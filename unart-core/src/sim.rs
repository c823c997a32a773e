//! Discrete-event test bench
//!
//! Virtual nanosecond clock, a hard timer that only fires when the test
//! says so, an input line replaying a recorded waveform, and an output line
//! that records every level it is driven to. Handles are `Clone` and share
//! state, so a test keeps one copy while the engine owns another.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use unart_hal::{EdgeInterrupt, HardTimer, InputLine, OutputLine, TimerRestart};

use crate::consumer::ByteConsumer;
use crate::frame::frame_levels;

/// Shared virtual clock
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn set(&self, t: u64) {
        self.now.set(t);
    }
}

#[derive(Debug, Default)]
struct TimerSlot {
    deadline: Option<u64>,
    running: bool,
    starts: u32,
}

/// Hard timer driven by the test
#[derive(Debug, Clone)]
pub struct SimTimer {
    clock: SimClock,
    slot: Rc<RefCell<TimerSlot>>,
}

impl SimTimer {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            slot: Rc::new(RefCell::new(TimerSlot::default())),
        }
    }

    /// Pending deadline, if armed
    pub fn deadline(&self) -> Option<u64> {
        self.slot.borrow().deadline
    }

    /// Number of start_at/start_after calls so far
    pub fn starts(&self) -> u32 {
        self.slot.borrow().starts
    }

    /// Pretend the callback is executing on another context
    pub fn set_running(&self, running: bool) {
        self.slot.borrow_mut().running = running;
    }

    /// Expire the timer `late_ns` after its deadline and run `callback`
    pub fn fire(&self, late_ns: u64, callback: impl FnOnce() -> TimerRestart) -> TimerRestart {
        let deadline = self
            .slot
            .borrow()
            .deadline
            .expect("fired a timer that is not armed");
        self.clock.set(deadline + late_ns);
        self.slot.borrow_mut().running = true;
        let restart = callback();
        let mut slot = self.slot.borrow_mut();
        slot.running = false;
        if !restart.is_restart() {
            slot.deadline = None;
        }
        restart
    }
}

impl HardTimer for SimTimer {
    fn now_ns(&self) -> u64 {
        self.clock.now()
    }

    fn start_at(&mut self, deadline_ns: u64) {
        let mut slot = self.slot.borrow_mut();
        slot.deadline = Some(deadline_ns);
        slot.starts += 1;
    }

    fn forward(&mut self, period_ns: u64) {
        let mut slot = self.slot.borrow_mut();
        let last = slot.deadline.expect("forward on an idle timer");
        slot.deadline = Some(last + period_ns);
    }

    fn cancel(&mut self) {
        self.slot.borrow_mut().deadline = None;
    }

    fn is_active(&self) -> bool {
        let slot = self.slot.borrow();
        slot.deadline.is_some() || slot.running
    }
}

/// Input line replaying level transitions
#[derive(Debug, Clone)]
pub struct SimInput {
    clock: SimClock,
    transitions: Rc<RefCell<Vec<(u64, bool)>>>,
    irq_enabled: Rc<Cell<bool>>,
    can_sleep: bool,
}

impl SimInput {
    /// Idle-high line
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            transitions: Rc::new(RefCell::new(Vec::new())),
            irq_enabled: Rc::new(Cell::new(false)),
            can_sleep: false,
        }
    }

    /// Line that claims it may sleep
    pub fn sleeping(clock: &SimClock) -> Self {
        Self {
            can_sleep: true,
            ..Self::new(clock)
        }
    }

    /// Force the level from `t` onwards
    pub fn set_level_at(&self, t: u64, high: bool) {
        let mut transitions = self.transitions.borrow_mut();
        transitions.push((t, high));
        transitions.sort_by_key(|&(time, _)| time);
    }

    /// Drive one 8N1 frame starting at `t0`, back to idle afterwards
    pub fn drive_frame(&self, t0: u64, period_ns: u64, byte: u8) {
        self.drive_levels(t0, period_ns, &frame_levels(byte));
    }

    /// Drive arbitrary bit levels, one per period, then idle high
    pub fn drive_levels(&self, t0: u64, period_ns: u64, levels: &[bool]) {
        for (i, &level) in levels.iter().enumerate() {
            self.set_level_at(t0 + i as u64 * period_ns, level);
        }
        self.set_level_at(t0 + levels.len() as u64 * period_ns, true);
    }

    /// Level at time `t` (idle high before the first transition)
    pub fn level_at(&self, t: u64) -> bool {
        self.transitions
            .borrow()
            .iter()
            .take_while(|&&(time, _)| time <= t)
            .last()
            .map_or(true, |&(_, level)| level)
    }

    /// Times of all high-to-low transitions
    pub fn falling_edges(&self) -> Vec<u64> {
        let mut edges = Vec::new();
        let mut level = true;
        for &(t, next) in self.transitions.borrow().iter() {
            if level && !next {
                edges.push(t);
            }
            level = next;
        }
        edges
    }

    pub fn irq_enabled(&self) -> bool {
        self.irq_enabled.get()
    }
}

impl InputLine for SimInput {
    fn is_high(&mut self) -> bool {
        self.level_at(self.clock.now())
    }

    fn can_sleep(&self) -> bool {
        self.can_sleep
    }
}

impl EdgeInterrupt for SimInput {
    fn enable_falling_edge(&mut self) {
        self.irq_enabled.set(true);
    }

    fn disable(&mut self) {
        self.irq_enabled.set(false);
    }
}

/// Output line recording `(time, level)` for every write
#[derive(Debug, Clone)]
pub struct SimOutput {
    clock: SimClock,
    writes: Rc<RefCell<Vec<(u64, bool)>>>,
    can_sleep: bool,
}

impl SimOutput {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            writes: Rc::new(RefCell::new(Vec::new())),
            can_sleep: false,
        }
    }

    pub fn sleeping(clock: &SimClock) -> Self {
        Self {
            can_sleep: true,
            ..Self::new(clock)
        }
    }

    pub fn writes(&self) -> Vec<(u64, bool)> {
        self.writes.borrow().clone()
    }

    /// Driven levels only, in order
    pub fn levels(&self) -> Vec<bool> {
        self.writes.borrow().iter().map(|&(_, level)| level).collect()
    }

    pub fn clear(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl OutputLine for SimOutput {
    fn set_high(&mut self) {
        self.writes.borrow_mut().push((self.clock.now(), true));
    }

    fn set_low(&mut self) {
        self.writes.borrow_mut().push((self.clock.now(), false));
    }

    fn can_sleep(&self) -> bool {
        self.can_sleep
    }
}

/// Consumer that keeps everything it is given
#[derive(Debug, Default)]
pub struct Recorder {
    pub received: Vec<u8>,
    pub batches: usize,
    pub space_notifications: usize,
}

impl ByteConsumer for Recorder {
    fn on_bytes_received(&mut self, bytes: &[u8]) {
        self.received.extend_from_slice(bytes);
        self.batches += 1;
    }

    fn on_transmit_space_available(&mut self) {
        self.space_notifications += 1;
    }
}

/// Replay falling edges and timer expiries in time order
///
/// Edges are delivered only while the line's interrupt is enabled. Each
/// expiry fires `jitter()` ns after its deadline. Runs until no edges are
/// left and the timer has gone idle.
pub fn run_receiver(
    input: &SimInput,
    timer: &SimTimer,
    mut on_edge: impl FnMut(u64),
    mut on_timer: impl FnMut() -> TimerRestart,
    mut jitter: impl FnMut() -> u64,
) {
    let mut edges = input.falling_edges().into_iter().peekable();
    let mut next_fire: Option<u64> = None;
    loop {
        if next_fire.is_none() {
            next_fire = timer.deadline().map(|d| d + jitter());
        }
        let edge = edges.peek().copied();
        match (edge, next_fire) {
            (Some(e), Some(f)) if e < f => {
                edges.next();
                if input.irq_enabled() {
                    input.clock.set(e);
                    on_edge(e);
                }
            }
            (_, Some(f)) => {
                let late = f - timer.deadline().unwrap_or(f);
                timer.fire(late, &mut on_timer);
                next_fire = None;
            }
            (Some(e), None) => {
                edges.next();
                if input.irq_enabled() {
                    input.clock.set(e);
                    on_edge(e);
                }
            }
            (None, None) => break,
        }
    }
}

/// Fire the timer on its deadlines until it stops, returns firing count
pub fn run_transmitter(timer: &SimTimer, mut on_timer: impl FnMut() -> TimerRestart) -> usize {
    let mut fired = 0;
    while timer.deadline().is_some() {
        timer.fire(0, &mut on_timer);
        fired += 1;
    }
    fired
}
