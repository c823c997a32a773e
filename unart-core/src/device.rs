//! Soft UART device
//!
//! One receiver and one transmitter sharing a configuration and the
//! diagnostic switch. The board glue routes the RX edge interrupt and both
//! timer expiries to the `on_*` handlers and runs [`Unart::run_deferred`]
//! in a task.

use embassy_time::Duration;

use unart_hal::{EdgeInterrupt, HardTimer, InputLine, OutputLine, TimerRestart, UartConfig};

use crate::config::{DeviceConfig, DiagnosticMode, UnartParams};
use crate::consumer::ByteConsumer;
use crate::deferred::{next_work, Work};
use crate::error::{LineConfigError, SetupError};
use crate::rx::RxEngine;
use crate::tx::TxEngine;

/// Bit-banged UART built from two lines and two hard timers
pub struct Unart<'a, RI, RT, TO, TT> {
    rx: RxEngine<'a, RI, RT>,
    tx: TxEngine<'a, TO, TT>,
}

impl<'a, RI, RT, TO, TT> Unart<'a, RI, RT, TO, TT>
where
    RI: InputLine + EdgeInterrupt,
    RT: HardTimer,
    TO: OutputLine,
    TT: HardTimer,
{
    /// Set up RX, then TX
    ///
    /// Fails if either line may sleep or the initial baud rate is unusable.
    /// The RX edge interrupt is left disabled; call [`Unart::activate`].
    pub fn new(
        rx_line: RI,
        rx_timer: RT,
        tx_line: TO,
        tx_timer: TT,
        params: &UnartParams,
        config: &DeviceConfig,
        diag: &'a DiagnosticMode,
    ) -> Result<Self, SetupError> {
        let skew_percent = config.effective_skew_percent(params);
        let rx = RxEngine::new(rx_line, rx_timer, skew_percent, params.baud_rate, diag)?;
        let tx = TxEngine::new(tx_line, tx_timer, params.baud_rate, diag)?;

        info!(
            "unart ready: {} baud, RX skew {}%",
            params.baud_rate,
            skew_percent
        );

        Ok(Self { rx, tx })
    }

    pub fn rx(&self) -> &RxEngine<'a, RI, RT> {
        &self.rx
    }

    pub fn tx(&self) -> &TxEngine<'a, TO, TT> {
        &self.tx
    }

    /// Port opened: start accepting start edges
    pub fn activate(&self) {
        self.rx.activate();
    }

    /// Port closed: stop accepting start edges
    pub fn shutdown(&self) {
        self.rx.shutdown();
    }

    /// RX falling-edge interrupt
    pub fn on_rx_edge(&self, edge_ns: u64) {
        self.rx.on_falling_edge(edge_ns, &self.tx);
    }

    /// RX hard timer expiry
    pub fn on_rx_timer(&self) -> TimerRestart {
        self.rx.on_timer(&self.tx)
    }

    /// TX hard timer expiry
    pub fn on_tx_timer(&self) -> TimerRestart {
        self.tx.on_timer()
    }

    /// See [`TxEngine::write`]
    pub fn write(&self, buf: &[u8]) -> usize {
        self.tx.write(buf)
    }

    pub fn write_room(&self) -> usize {
        self.tx.write_room()
    }

    /// See [`TxEngine::wait_until_sent`]
    pub async fn wait_until_sent(&self, timeout: Duration) -> bool {
        self.tx.wait_until_sent(timeout).await
    }

    /// Apply one baud rate to both directions
    ///
    /// On error neither direction changes.
    pub fn set_baud_rate(&self, baud_rate: u32) -> Result<(), LineConfigError> {
        self.rx.set_baud_rate(baud_rate)?;
        self.tx.set_baud_rate(baud_rate)
    }

    /// Apply serial line settings
    ///
    /// The baud rate is applied whatever the framing. Anything other than
    /// 8N1 is reported as [`LineConfigError::UnsupportedFraming`]; the line
    /// keeps running 8N1.
    pub fn set_line_config(&self, config: &UartConfig) -> Result<(), LineConfigError> {
        self.set_baud_rate(config.baudrate)?;
        if !config.is_8n1() {
            error!("unsupported line settings, expected 8N1");
            return Err(LineConfigError::UnsupportedFraming);
        }
        Ok(())
    }

    /// Run whatever deferred work is pending, without waiting
    ///
    /// Returns the number of work items run (0 to 2).
    pub fn run_pending_work<C: ByteConsumer>(&self, consumer: &mut C) -> usize {
        let mut ran = 0;
        if self.rx.push_work().take() {
            self.rx.deliver(consumer);
            ran += 1;
        }
        if self.tx.wakeup_work().take() {
            self.tx.wake_writers(consumer);
            ran += 1;
        }
        ran
    }

    /// Deferred worker; never returns
    ///
    /// Hands received bytes to `consumer` and runs TX wakeups as they are
    /// requested. Spawn it on the executor next to the interrupt glue.
    pub async fn run_deferred<C: ByteConsumer>(&self, mut consumer: C) {
        loop {
            match next_work(self.rx.push_work(), self.tx.wakeup_work()).await {
                Work::PushReceived => {
                    self.rx.deliver(&mut consumer);
                }
                Work::WakeWriters => self.tx.wake_writers(&mut consumer),
            }
        }
    }

    /// Quiesce both engines before the device is dropped
    pub async fn teardown(&self) {
        self.rx.teardown().await;
        self.tx.teardown().await;
        debug!("unart torn down");
    }
}
