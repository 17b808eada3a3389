use super::chain::BlockTransform;
use super::intrinsics::qsub;

/// Replaces each interleaved `[L, R]` pair with `[R - L, R - L]`.
///
/// Cancels whatever is common to both channels. A trailing unpaired
/// sample is left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct StereoDifference;

impl BlockTransform for StereoDifference {
    fn process(&mut self, samples: &mut [i32]) {
        for frame in samples.chunks_exact_mut(2) {
            let diff = qsub(frame[1], frame[0]);
            frame[0] = diff;
            frame[1] = diff;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_minus_left() {
        let mut samples = [100, 300, -50, 25];
        StereoDifference.process(&mut samples);
        assert_eq!(samples, [200, 200, 75, 75]);
    }

    #[test]
    fn common_mode_cancels() {
        let mut samples = [1234, 1234, -9, -9];
        StereoDifference.process(&mut samples);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn difference_saturates() {
        let mut samples = [i32::MIN, i32::MAX, i32::MAX, i32::MIN];
        StereoDifference.process(&mut samples);
        assert_eq!(samples, [i32::MAX, i32::MAX, i32::MIN, i32::MIN]);
    }

    #[test]
    fn odd_tail_is_untouched() {
        let mut samples = [1, 2, 3];
        StereoDifference.process(&mut samples);
        assert_eq!(samples, [1, 1, 3]);
    }
}
