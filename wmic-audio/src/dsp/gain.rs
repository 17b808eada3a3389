use super::chain::BlockTransform;
use crate::constants::AMP_FACTOR;

/// Power-of-two amplifier with saturation.
///
/// Samples inside `[i32::MIN >> shift, i32::MAX >> shift]` are shifted left;
/// anything outside clamps to the rail of its sign instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gain {
    shift: u32,
    min_limit: i32,
    max_limit: i32,
}

impl Gain {
    /// `shift` must be below 32.
    pub const fn new(shift: u32) -> Self {
        Gain {
            shift,
            min_limit: i32::MIN >> shift,
            max_limit: i32::MAX >> shift,
        }
    }

    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Linear gain factor.
    pub const fn factor(&self) -> i32 {
        1 << self.shift
    }

    #[inline]
    pub fn apply(&self, x: i32) -> i32 {
        if x > self.max_limit {
            i32::MAX
        } else if x < self.min_limit {
            i32::MIN
        } else {
            x << self.shift
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Gain::new(AMP_FACTOR)
    }
}

impl BlockTransform for Gain {
    fn process(&mut self, samples: &mut [i32]) {
        for s in samples.iter_mut() {
            *s = self.apply(*s);
        }
    }
}
