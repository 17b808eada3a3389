//! Conversions between ADC blocks and the interleaved bus format.
//!
//! ## Bus format
//!
//! Each frame is `channels` consecutive 32-bit words. A 16-bit sample is
//! carried in the upper half of its word (MSB aligned), so the bus word
//! for sample `x` is `x << 16`.
//!
//! ```text
//! ADC block:  x0      x1      x2 ...
//! Bus block:  x0<<16  x0<<16  x1<<16  x1<<16  x2<<16 ...
//!             └── L ┘ └── R ┘
//! ```

/// Widen mono samples into interleaved frames, duplicating each sample onto
/// every channel.
///
/// Writes `src.len() * channels` words and returns that count. Frames that
/// do not fit in `dest` are dropped.
pub fn widen_mono(dest: &mut [i32], src: &[i16], channels: usize) -> usize {
    let channels = channels.max(1);
    let mut written = 0;
    for (frame, &x) in dest.chunks_exact_mut(channels).zip(src.iter()) {
        frame.fill((x as i32) << 16);
        written += channels;
    }
    written
}
