//! # Sample Ring Buffer Module
//!
//! Audio callbacks deliver chunks of arbitrary size (128-512 samples is
//! typical); the YIN estimator wants fixed windows. This buffer absorbs the
//! mismatch: chunks are written circularly over a store of twice the window
//! size, and whole windows are read back out with 50% overlap once enough
//! samples have arrived.
//!
//! Overflow silently overwrites the oldest samples. For a real-time stream
//! this is the correct behavior: the buffer must never block the audio
//! callback and must never grow.

/// Fixed-capacity circular store of samples with windowed read-out.
#[derive(Debug)]
pub struct RingBuffer {
    store: Vec<f32>,
    /// Next write position.
    cursor: usize,
    /// Logical count of samples available for reading, clamped to capacity.
    available: usize,
    block_size: usize,
    /// Reused for every window hand-off; no steady-state allocation.
    window: Vec<f32>,
}

impl RingBuffer {
    /// Creates a buffer holding `2 * block_size` samples.
    pub fn new(block_size: usize) -> Self {
        Self {
            store: vec![0.0; block_size * 2],
            cursor: 0,
            available: 0,
            block_size,
            window: vec![0.0; block_size],
        }
    }

    /// Appends a chunk, overwriting the oldest samples once full.
    pub fn push(&mut self, chunk: &[f32]) {
        for &sample in chunk {
            self.store[self.cursor] = sample;
            self.cursor = (self.cursor + 1) % self.store.len();
        }
        self.available = (self.available + chunk.len()).min(self.store.len());
    }

    /// Returns the most recent `block_size` samples in chronological order,
    /// or `None` until enough samples have accumulated.
    ///
    /// A successful read consumes only half a window of availability, so
    /// consecutive windows overlap by `block_size / 2`.
    pub fn try_read_window(&mut self) -> Option<&[f32]> {
        if self.available < self.block_size {
            return None;
        }

        let capacity = self.store.len();
        // The newest sample sits just behind the cursor; the window starts
        // block_size samples before it.
        let start = (self.cursor + capacity - self.block_size) % capacity;
        for i in 0..self.block_size {
            self.window[i] = self.store[(start + i) % capacity];
        }

        self.available -= self.block_size / 2;
        Some(&self.window)
    }

    /// Discards all buffered samples.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.available = 0;
    }

    /// Number of samples currently available for a window read.
    pub fn available(&self) -> usize {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_window_until_block_size_pushed() {
        let mut ring = RingBuffer::new(8);
        ring.push(&[1.0; 7]);
        assert!(ring.try_read_window().is_none());
        ring.push(&[1.0; 1]);
        assert!(ring.try_read_window().is_some());
    }

    #[test]
    fn window_is_most_recent_samples_in_order() {
        let mut ring = RingBuffer::new(4);
        ring.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let window = ring.try_read_window().unwrap();
        assert_eq!(window, &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn consecutive_windows_overlap_by_half_a_block() {
        let mut ring = RingBuffer::new(8);
        // Marker values: sample i carries value i.
        let samples: Vec<f32> = (0..12).map(|i| i as f32).collect();
        ring.push(&samples[..8]);
        let first: Vec<f32> = ring.try_read_window().unwrap().to_vec();
        assert_eq!(first, (0..8).map(|i| i as f32).collect::<Vec<_>>());

        // Half a block was consumed; half a block more makes a new window.
        ring.push(&samples[8..12]);
        let second: Vec<f32> = ring.try_read_window().unwrap().to_vec();
        assert_eq!(second, (4..12).map(|i| i as f32).collect::<Vec<_>>());

        // Overlap is exactly block/2 samples.
        assert_eq!(&first[4..], &second[..4]);
    }

    #[test]
    fn overflow_overwrites_oldest() {
        let mut ring = RingBuffer::new(4);
        let samples: Vec<f32> = (0..20).map(|i| i as f32).collect();
        ring.push(&samples);
        assert_eq!(ring.available(), 8);
        let window = ring.try_read_window().unwrap();
        assert_eq!(window, &[16.0, 17.0, 18.0, 19.0]);
    }

    #[test]
    fn reset_discards_contents() {
        let mut ring = RingBuffer::new(4);
        ring.push(&[1.0; 6]);
        ring.reset();
        assert!(ring.try_read_window().is_none());
        assert_eq!(ring.available(), 0);
    }
}
