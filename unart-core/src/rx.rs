//! Receive engine
//!
//! A falling edge on the idle line arms the hard timer for `edge + skew`,
//! i.e. a fraction of a bit into the start bit. From then on the timer
//! samples the line once per bit period:
//!
//! ```text
//!   ‾‾‾‾‾|_____|‾‾‾‾‾|_____| ... |‾‾‾‾‾‾‾‾‾‾
//!        start   d0    d1          stop
//!          ^      ^     ^            ^
//!          skew   +period ...        last sample, timer stops
//! ```
//!
//! A high start sample is noise: the frame is abandoned. A low stop sample
//! is a framing error: the byte is discarded. Edges while a frame is in
//! progress are ignored. Completed bytes go to a small queue and a deferred
//! request hands them to the consumer outside the hard contexts.

use core::cell::RefCell;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use unart_hal::{EdgeInterrupt, HardTimer, InputLine, LineDirection, TimerRestart};

use crate::config::DiagnosticMode;
use crate::consumer::ByteConsumer;
use crate::deferred::Deferred;
use crate::error::{LineConfigError, SetupError};
use crate::frame::BitSlot;
use crate::queue::ByteQueue;
use crate::timing::LineTiming;

/// RX queue capacity in bytes
pub const RX_QUEUE_SIZE: usize = 32;

/// Receiver of the diagnostic toggle
///
/// While diagnostic mode is on, the receiver flips a level on every edge it
/// accepts and every sample it takes, and hands it here. The device wires
/// this to the transmit line.
pub trait SampleProbe {
    fn drive_probe(&self, level: bool);
}

/// No probe attached
impl SampleProbe for () {
    fn drive_probe(&self, _level: bool) {}
}

/// Receive counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxStats {
    /// Bytes queued for delivery
    pub frames: u32,
    /// Frames abandoned because the start sample was high
    pub start_errors: u32,
    /// Bytes discarded because the stop sample was low
    pub framing_errors: u32,
    /// Good bytes dropped because the queue was full
    pub overruns: u32,
}

struct RxState<I, T> {
    line: I,
    timer: T,
    timing: LineTiming,
    skew_percent: u32,
    slot: BitSlot,
    payload: u8,
    debug_toggle: bool,
    queue: ByteQueue<RX_QUEUE_SIZE>,
    stats: RxStats,
}

impl<I, T> RxState<I, T> {
    fn toggle_probe<P: SampleProbe>(&mut self, probe: &P) {
        self.debug_toggle = !self.debug_toggle;
        probe.drive_probe(self.debug_toggle);
    }
}

/// Soft UART receiver
pub struct RxEngine<'a, I, T> {
    state: Mutex<CriticalSectionRawMutex, RefCell<RxState<I, T>>>,
    push_work: Deferred,
    diag: &'a DiagnosticMode,
}

impl<'a, I, T> RxEngine<'a, I, T>
where
    I: InputLine + EdgeInterrupt,
    T: HardTimer,
{
    /// Create a receiver on `line`, sampled by `timer`
    ///
    /// The edge interrupt stays disabled until [`RxEngine::activate`].
    pub fn new(
        line: I,
        timer: T,
        skew_percent: u32,
        baud_rate: u32,
        diag: &'a DiagnosticMode,
    ) -> Result<Self, SetupError> {
        if line.can_sleep() {
            error!("RX line can sleep");
            return Err(SetupError::LineCanSleep(LineDirection::Rx));
        }

        let skew_percent = skew_percent.min(100);
        let timing = LineTiming::new(baud_rate, skew_percent)
            .ok_or(SetupError::InvalidBaudRate(baud_rate))?;

        Ok(Self {
            state: Mutex::new(RefCell::new(RxState {
                line,
                timer,
                timing,
                skew_percent,
                slot: BitSlot::Start,
                payload: 0,
                debug_toggle: false,
                queue: ByteQueue::new(),
                stats: RxStats::default(),
            })),
            push_work: Deferred::new(),
            diag,
        })
    }

    /// Recompute period and skew for a new rate
    ///
    /// A frame in flight keeps its already computed next deadline.
    pub fn set_baud_rate(&self, baud_rate: u32) -> Result<(), LineConfigError> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let timing = LineTiming::new(baud_rate, state.skew_percent)
                .ok_or(LineConfigError::InvalidBaudRate(baud_rate))?;
            debug!(
                "RX baud {}: period {} ns, skew {} ns",
                baud_rate,
                timing.period_ns,
                timing.skew_ns
            );
            state.timing = timing;
            Ok(())
        })
    }

    /// Current timing
    pub fn timing(&self) -> LineTiming {
        self.state.lock(|state| state.borrow().timing)
    }

    /// Start listening for start edges
    pub fn activate(&self) {
        self.state
            .lock(|state| state.borrow_mut().line.enable_falling_edge());
    }

    /// Stop listening for start edges
    ///
    /// A frame already being sampled runs to completion.
    pub fn shutdown(&self) {
        self.state.lock(|state| state.borrow_mut().line.disable());
    }

    /// Falling-edge interrupt handler
    ///
    /// `edge_ns` is the interrupt timestamp on the timer's clock.
    pub fn on_falling_edge<P: SampleProbe>(&self, edge_ns: u64, probe: &P) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let state = &mut *state;

            // Ignore falling edges while a byte is being read
            if state.slot != BitSlot::Start || state.timer.is_active() {
                return;
            }

            state.payload = 0;
            let deadline = edge_ns.saturating_add(state.timing.skew_ns);
            state.timer.start_at(deadline);

            if self.diag.is_enabled() {
                state.toggle_probe(probe);
            }
        });
    }

    /// Hard timer callback: take one sample
    pub fn on_timer<P: SampleProbe>(&self, probe: &P) -> TimerRestart {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let state = &mut *state;

            let bit = state.line.read_bit();

            if self.diag.is_enabled() {
                state.toggle_probe(probe);
            }

            match state.slot {
                BitSlot::Start => {
                    if bit != 0 {
                        state.stats.start_errors += 1;
                        trace!("RX start bit invalid");
                        return TimerRestart::NoRestart;
                    }
                }
                BitSlot::Data(_) => {
                    state.payload = (bit << 7) | (state.payload >> 1);
                }
                BitSlot::Stop => {
                    if bit == 1 {
                        if state.queue.push(state.payload) {
                            state.stats.frames += 1;
                            self.push_work.schedule();
                        } else {
                            state.stats.overruns += 1;
                            warn!("RX queue full, dropped {=u8:#x}", state.payload);
                        }
                    } else {
                        state.stats.framing_errors += 1;
                        trace!("RX stop bit invalid, dropped {=u8:#x}", state.payload);
                    }
                    state.slot = BitSlot::Start;
                    return TimerRestart::NoRestart;
                }
            }

            state.slot = state.slot.next();
            state.timer.forward(state.timing.period_ns);
            TimerRestart::Restart
        })
    }

    /// Deferred delivery: hand everything queued to `consumer` in one batch
    ///
    /// Bytes arriving meanwhile stay queued for the next run. Returns the
    /// number of bytes delivered.
    pub fn deliver<C: ByteConsumer>(&self, consumer: &mut C) -> usize {
        let mut buf = [0u8; RX_QUEUE_SIZE];
        let n = self
            .state
            .lock(|state| state.borrow_mut().queue.pop_into(&mut buf));
        if n > 0 {
            consumer.on_bytes_received(&buf[..n]);
        }
        n
    }

    /// Delivery request posted by the timer callback
    pub fn push_work(&self) -> &Deferred {
        &self.push_work
    }

    /// Frame position: -1 idle, 0-7 data bit, 8 stop bit
    pub fn bit_index(&self) -> i8 {
        self.state.lock(|state| state.borrow().slot.index())
    }

    /// Byte assembled so far
    pub fn payload(&self) -> u8 {
        self.state.lock(|state| state.borrow().payload)
    }

    pub fn is_timer_active(&self) -> bool {
        self.state.lock(|state| state.borrow().timer.is_active())
    }

    /// Bytes waiting for delivery
    pub fn queued(&self) -> usize {
        self.state.lock(|state| state.borrow().queue.len())
    }

    pub fn stats(&self) -> RxStats {
        self.state.lock(|state| state.borrow().stats)
    }

    /// Stop the receiver for good
    ///
    /// Disables the edge interrupt, cancels the timer, then yields until no
    /// callback is in flight. Afterwards nothing touches the engine state.
    pub async fn teardown(&self) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.line.disable();
            state.timer.cancel();
        });
        while self.is_timer_active() {
            yield_now().await;
        }
    }
}
