//! Frame bit positions
//!
//! An 8N1 frame is one start bit (0), eight data bits LSB first, and one
//! stop bit (1). Both engines walk the same sequence of slots, strictly in
//! order, one slot per timer period.

/// Number of data bits per frame
pub const DATA_BITS: u8 = 8;

/// Position within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitSlot {
    /// Start bit (RX: idle / awaiting start; TX: about to send start)
    #[default]
    Start,
    /// Data bit 0..=7
    Data(u8),
    /// Stop bit
    Stop,
}

impl BitSlot {
    /// Slot following this one; `Stop` wraps back to `Start`
    pub fn next(self) -> Self {
        match self {
            BitSlot::Start => BitSlot::Data(0),
            BitSlot::Data(i) if i + 1 < DATA_BITS => BitSlot::Data(i + 1),
            BitSlot::Data(_) => BitSlot::Stop,
            BitSlot::Stop => BitSlot::Start,
        }
    }

    /// Numeric bit index: -1 for start, 0..=7 for data, 8 for stop
    pub fn index(self) -> i8 {
        match self {
            BitSlot::Start => -1,
            BitSlot::Data(i) => i as i8,
            BitSlot::Stop => DATA_BITS as i8,
        }
    }
}

/// Level sequence of one 8N1 frame, start bit first
pub fn frame_levels(byte: u8) -> [bool; 10] {
    let mut levels = [true; 10];
    levels[0] = false;
    for (i, level) in levels[1..9].iter_mut().enumerate() {
        *level = byte & (1 << i) != 0;
    }
    levels
}
