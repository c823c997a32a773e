//! Transmit engine
//!
//! `write` only queues bytes. The hard timer does all line driving, one bit
//! per period: start bit, eight data bits LSB first, stop bit. The next
//! queued byte is loaded in the stop-bit callback so consecutive frames
//! have no idle gap. When the queue runs dry the timer stops and a deferred
//! wakeup releases drain waiters and notifies the consumer.

use core::cell::{Cell, RefCell};
use core::future::poll_fn;
use core::task::Poll;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::{with_timeout, Duration, Timer};

use unart_hal::{HardTimer, LineDirection, OutputLine, TimerRestart};

use crate::config::DiagnosticMode;
use crate::consumer::ByteConsumer;
use crate::deferred::Deferred;
use crate::error::{LineConfigError, SetupError};
use crate::frame::BitSlot;
use crate::queue::ByteQueue;
use crate::rx::SampleProbe;
use crate::timing::LineTiming;

/// TX queue capacity in bytes
pub const TX_QUEUE_SIZE: usize = 1024;

/// Waiters woken by the drain wakeup
///
/// Further concurrent [`TxEngine::wait_until_sent`] callers re-check the
/// queue once per frame time instead of registering, so the registry never
/// overflows and mass-wakes its waiters.
const MAX_DRAIN_WAITERS: usize = 4;

/// Transmit counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxStats {
    /// Frames whose stop bit has been driven
    pub sent: u32,
}

struct TxState<O, T> {
    line: O,
    timer: T,
    timing: LineTiming,
    slot: BitSlot,
    payload: u8,
    queue: ByteQueue<TX_QUEUE_SIZE>,
    drain_waiters: MultiWakerRegistration<MAX_DRAIN_WAITERS>,
    stats: TxStats,
}

/// Soft UART transmitter
pub struct TxEngine<'a, O, T> {
    state: Mutex<CriticalSectionRawMutex, RefCell<TxState<O, T>>>,
    wakeup_work: Deferred,
    drain_slots: Mutex<CriticalSectionRawMutex, Cell<usize>>,
    diag: &'a DiagnosticMode,
}

/// Claimed registry slot, released when the waiting future completes or is
/// dropped on timeout
struct DrainSlot<'e> {
    slots: &'e Mutex<CriticalSectionRawMutex, Cell<usize>>,
}

impl<'e> DrainSlot<'e> {
    fn claim(slots: &'e Mutex<CriticalSectionRawMutex, Cell<usize>>) -> Option<Self> {
        slots.lock(|taken| {
            if taken.get() < MAX_DRAIN_WAITERS {
                taken.set(taken.get() + 1);
                Some(Self { slots })
            } else {
                None
            }
        })
    }
}

impl Drop for DrainSlot<'_> {
    fn drop(&mut self) {
        self.slots.lock(|taken| taken.set(taken.get() - 1));
    }
}

impl<'a, O, T> TxEngine<'a, O, T>
where
    O: OutputLine,
    T: HardTimer,
{
    /// Create a transmitter driving `line`, clocked by `timer`
    ///
    /// The line is driven to the idle (high) level right away.
    pub fn new(
        mut line: O,
        timer: T,
        baud_rate: u32,
        diag: &'a DiagnosticMode,
    ) -> Result<Self, SetupError> {
        if line.can_sleep() {
            error!("TX line can sleep");
            return Err(SetupError::LineCanSleep(LineDirection::Tx));
        }

        let timing = LineTiming::new(baud_rate, 0).ok_or(SetupError::InvalidBaudRate(baud_rate))?;
        line.set_high();

        Ok(Self {
            state: Mutex::new(RefCell::new(TxState {
                line,
                timer,
                timing,
                slot: BitSlot::Start,
                payload: 0,
                queue: ByteQueue::new(),
                drain_waiters: MultiWakerRegistration::new(),
                stats: TxStats::default(),
            })),
            wakeup_work: Deferred::new(),
            drain_slots: Mutex::new(Cell::new(0)),
            diag,
        })
    }

    /// Change the bit period; a frame in flight finishes its current bit
    /// at the old rate
    pub fn set_baud_rate(&self, baud_rate: u32) -> Result<(), LineConfigError> {
        let timing =
            LineTiming::new(baud_rate, 0).ok_or(LineConfigError::InvalidBaudRate(baud_rate))?;
        self.state.lock(|state| {
            debug!("TX baud {}: period {} ns", baud_rate, timing.period_ns);
            state.borrow_mut().timing = timing;
        });
        Ok(())
    }

    /// Current bit period (ns)
    pub fn period_ns(&self) -> u64 {
        self.state.lock(|state| state.borrow().timing.period_ns)
    }

    /// Queue as much of `buf` as fits and return how much was taken
    ///
    /// Never blocks. Starts the timer if it is idle. In diagnostic mode the
    /// line belongs to the RX probe: everything is reported as accepted and
    /// dropped.
    pub fn write(&self, buf: &[u8]) -> usize {
        if self.diag.is_enabled() {
            return buf.len();
        }

        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let state = &mut *state;

            let accepted = state.queue.push_slice(buf);

            if !state.timer.is_active() {
                if let Some(byte) = state.queue.pop() {
                    state.payload = byte;
                    state.slot = BitSlot::Start;
                    // A full period out so the start bit is never shortened
                    state.timer.start_after(state.timing.period_ns);
                }
            }

            accepted
        })
    }

    /// Free space in the TX queue
    pub fn write_room(&self) -> usize {
        self.state.lock(|state| state.borrow().queue.available())
    }

    /// Bytes queued but not yet started
    pub fn queued(&self) -> usize {
        self.state.lock(|state| state.borrow().queue.len())
    }

    /// Hard timer callback: drive one bit
    pub fn on_timer(&self) -> TimerRestart {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let state = &mut *state;

            match state.slot {
                BitSlot::Start => state.line.set_low(),
                BitSlot::Data(_) => {
                    state.line.set_state(state.payload & 1 != 0);
                    state.payload >>= 1;
                }
                BitSlot::Stop => {
                    state.line.set_high();
                    state.stats.sent += 1;
                    match state.queue.pop() {
                        Some(byte) => state.payload = byte,
                        None => {
                            state.slot = BitSlot::Start;
                            trace!("TX drained");
                            self.wakeup_work.schedule();
                            return TimerRestart::NoRestart;
                        }
                    }
                }
            }

            state.slot = state.slot.next();
            state.timer.forward(state.timing.period_ns);
            TimerRestart::Restart
        })
    }

    /// Deferred wakeup: release drain waiters, then tell the consumer
    pub fn wake_writers<C: ByteConsumer>(&self, consumer: &mut C) {
        self.state
            .lock(|state| state.borrow_mut().drain_waiters.wake());
        consumer.on_transmit_space_available();
    }

    /// Wakeup request posted when the queue drains
    pub fn wakeup_work(&self) -> &Deferred {
        &self.wakeup_work
    }

    /// Wait until the TX queue is empty or `timeout` elapses
    ///
    /// Returns `true` if the queue drained in time. The last byte may still
    /// be on the wire when this returns.
    pub async fn wait_until_sent(&self, timeout: Duration) -> bool {
        with_timeout(timeout, self.drained()).await.is_ok()
    }

    async fn drained(&self) {
        let Some(_slot) = DrainSlot::claim(&self.drain_slots) else {
            while !self.is_drained() {
                let frame_ns = self.state.lock(|state| state.borrow().timing.frame_ns());
                Timer::after(Duration::from_nanos(frame_ns)).await;
            }
            return;
        };

        poll_fn(|cx| {
            self.state.lock(|state| {
                let mut state = state.borrow_mut();
                if state.queue.is_empty() {
                    Poll::Ready(())
                } else {
                    state.drain_waiters.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }

    fn is_drained(&self) -> bool {
        self.state.lock(|state| state.borrow().queue.is_empty())
    }

    /// Frame position: -1 before the start bit, 0-7 data bit, 8 stop bit
    pub fn bit_index(&self) -> i8 {
        self.state.lock(|state| state.borrow().slot.index())
    }

    pub fn is_timer_active(&self) -> bool {
        self.state.lock(|state| state.borrow().timer.is_active())
    }

    pub fn stats(&self) -> TxStats {
        self.state.lock(|state| state.borrow().stats)
    }

    /// Stop the transmitter for good
    ///
    /// Cancels the timer and yields until no callback is in flight, then
    /// drops whatever is still queued.
    pub async fn teardown(&self) {
        self.state.lock(|state| state.borrow_mut().timer.cancel());
        while self.is_timer_active() {
            yield_now().await;
        }
        self.state.lock(|state| state.borrow_mut().queue.clear());
    }
}

/// Diagnostic mode: the RX sampler drives the TX line directly
impl<O, T> SampleProbe for TxEngine<'_, O, T>
where
    O: OutputLine,
    T: HardTimer,
{
    fn drive_probe(&self, level: bool) {
        self.state
            .lock(|state| state.borrow_mut().line.set_state(level));
    }
}
