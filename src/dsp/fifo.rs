//! Sliding input window for the rate stages
//!
//! Frames are addressed by their absolute index in the stage's input
//! stream. Only the window `[base, end)` is held; callers discard what
//! they will never read again.

use crate::engine::buffer::AudioBlock;

#[derive(Debug, Clone, Default)]
pub(crate) struct FrameFifo {
    channels: Vec<Vec<f32>>,
    base: u64,
}

impl FrameFifo {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: vec![Vec::new(); channels],
            base: 0,
        }
    }

    /// Append a block of input frames
    pub fn push(&mut self, block: &AudioBlock) {
        for (held, incoming) in self.channels.iter_mut().zip(&block.samples) {
            held.extend_from_slice(incoming);
        }
    }

    /// Absolute index of the oldest held frame
    #[cfg(test)]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Absolute index one past the newest held frame
    pub fn end(&self) -> u64 {
        self.base + self.channels.first().map_or(0, |c| c.len() as u64)
    }

    /// Sample at a fractional absolute position, linearly interpolated
    ///
    /// Positions outside the held window read as silence.
    #[inline]
    pub fn sample_at(&self, channel: usize, pos: f64) -> f32 {
        if pos < 0.0 {
            return 0.0;
        }
        let index = pos.floor();
        let frac = (pos - index) as f32;
        let a = self.frame(channel, index as u64);
        if frac == 0.0 {
            return a;
        }
        let b = self.frame(channel, index as u64 + 1);
        a + (b - a) * frac
    }

    #[inline]
    fn frame(&self, channel: usize, index: u64) -> f32 {
        if index < self.base {
            return 0.0;
        }
        self.channels[channel]
            .get((index - self.base) as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Drop every frame before absolute index `index`
    pub fn discard_before(&mut self, index: u64) {
        if index <= self.base {
            return;
        }
        let count = ((index - self.base) as usize).min(self.channels.first().map_or(0, Vec::len));
        for channel in &mut self.channels {
            channel.drain(..count);
        }
        self.base += count as u64;
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
        self.base = 0;
    }
}
