//! Audio Block Management
//!
//! `AudioBlock` is the planar, reusable buffer that carries one render
//! block through the effect chain. Blocks keep their allocations across
//! `clear`/`resize`, so a render reuses the same memory for every block.

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// AudioBlock
// ============================================================================

/// Planar block of audio frames
///
/// `samples[ch][frame]`; every channel holds the same number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    pub samples: Vec<Vec<f32>>,
}

impl AudioBlock {
    /// Create an empty block with room for `capacity` frames per channel
    pub fn with_capacity(channels: usize, capacity: usize) -> Self {
        Self {
            samples: (0..channels).map(|_| Vec::with_capacity(capacity)).collect(),
        }
    }

    /// Create a zeroed block of `frames` frames
    pub fn silent(channels: usize, frames: usize) -> Self {
        Self {
            samples: vec![vec![0.0; frames]; channels],
        }
    }

    /// Build a block from interleaved samples (L, R, L, R, ...)
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn from_interleaved(interleaved: &[f32], channels: usize) -> Self {
        let mut block = Self::with_capacity(channels, interleaved.len() / channels.max(1));
        block.extend_interleaved(interleaved);
        block
    }

    /// Number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of frames per channel
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the block holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Drop all frames, keeping allocations
    pub fn clear(&mut self) {
        for channel in &mut self.samples {
            channel.clear();
        }
    }

    /// Resize every channel to `frames`, zero-filling new frames
    pub fn resize(&mut self, frames: usize) {
        for channel in &mut self.samples {
            channel.resize(frames, 0.0);
        }
    }

    /// Get one channel's samples
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get one channel's samples mutably
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Append one frame (one sample per channel)
    #[inline]
    pub fn push_frame(&mut self, frame: impl IntoIterator<Item = f32>) {
        for (channel, sample) in self.samples.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    /// Append all frames of another block with the same channel count
    pub fn append(&mut self, other: &AudioBlock) {
        for (channel, source) in self.samples.iter_mut().zip(&other.samples) {
            channel.extend_from_slice(source);
        }
    }

    /// Append interleaved samples
    pub fn extend_interleaved(&mut self, interleaved: &[f32]) {
        let channels = self.channels();
        if channels == 0 {
            return;
        }
        for frame in interleaved.chunks_exact(channels) {
            for (channel, &sample) in self.samples.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
    }

    /// Write the block as interleaved samples into `out` (cleared first)
    pub fn write_interleaved(&self, out: &mut Vec<f32>) {
        out.clear();
        let frames = self.frames();
        out.reserve(frames * self.channels());
        for frame in 0..frames {
            for channel in &self.samples {
                out.push(channel[frame]);
            }
        }
    }

    /// Peak absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// RMS level across all channels in dB
    ///
    /// Returns -f32::INFINITY for empty or silent blocks.
    pub fn rms_db(&self) -> f32 {
        let total = self.channels() * self.frames();
        if total == 0 {
            return f32::NEG_INFINITY;
        }
        let sum_squares: f64 = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        linear_to_db((sum_squares / total as f64).sqrt() as f32)
    }

    /// Check that all samples are finite (no NaN/Inf)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .all(|s| s.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert_relative_eq!(db_to_linear(-6.0), 0.501_187, epsilon = 1e-5);
        assert_relative_eq!(linear_to_db(1.0), 0.0);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_interleave_round_trip() {
        let interleaved = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let block = AudioBlock::from_interleaved(&interleaved, 2);
        assert_eq!(block.frames(), 3);
        assert_eq!(block.channel(1), &[-0.1, -0.2, -0.3]);

        let mut out = Vec::new();
        block.write_interleaved(&mut out);
        assert_eq!(out, interleaved);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut block = AudioBlock::with_capacity(2, 4096);
        block.resize(4096);
        block.clear();
        assert!(block.is_empty());
        assert!(block.samples[0].capacity() >= 4096);
    }

    #[test]
    fn test_push_and_append() {
        let mut a = AudioBlock::with_capacity(2, 4);
        a.push_frame([1.0, 2.0]);
        let mut b = AudioBlock::with_capacity(2, 4);
        b.push_frame([3.0, 4.0]);
        a.append(&b);
        assert_eq!(a.frames(), 2);
        assert_eq!(a.channel(0), &[1.0, 3.0]);
        assert_eq!(a.peak(), 4.0);
    }

    #[test]
    fn test_rms_of_silence() {
        let block = AudioBlock::silent(1, 16);
        assert_eq!(block.rms_db(), f32::NEG_INFINITY);
        assert!(block.is_finite());
    }
}
