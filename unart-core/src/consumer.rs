//! Byte-stream consumer
//!
//! Whatever sits above the soft UART (a tty layer, a protocol parser, a
//! test recorder). Only ever called from the deferred context, so it may
//! block or take its own locks.

/// Receiver of decoded bytes and transmit-space notifications
pub trait ByteConsumer {
    /// A batch of received bytes, oldest first
    fn on_bytes_received(&mut self, bytes: &[u8]);

    /// The TX queue drained; buffered writers can resume
    fn on_transmit_space_available(&mut self);
}

impl<C: ByteConsumer + ?Sized> ByteConsumer for &mut C {
    fn on_bytes_received(&mut self, bytes: &[u8]) {
        (**self).on_bytes_received(bytes);
    }

    fn on_transmit_space_available(&mut self) {
        (**self).on_transmit_space_available();
    }
}
