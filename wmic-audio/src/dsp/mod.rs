//! Per-block transform stages.
//!
//! | Stage | Type | Effect |
//! |---|---|---|
//! | Signal injection | [`SignalGenerator`] | Replace input with a 1 kHz + 15 kHz test tone |
//! | Low-pass | [`LowPassFilter`] | 39-tap Q15 FIR, one state per channel |
//! | Stereo difference | [`StereoDifference`] | `[L, R]` → `[R - L, R - L]` |
//! | Gain | [`Gain`] | `x << shift`, clamped to the rails |
//!
//! [`TransformChain`] runs the enabled stages in that order. [`DelayLine`]
//! is a standalone building block for the ADT effect.

pub mod chain;
pub mod delay;
pub mod fir;
pub mod gain;
pub mod helpers;
pub mod intrinsics;
pub mod signal;
pub mod stereo;

pub use chain::{BlockTransform, Passthrough, TransformChain};
pub use delay::{AdtDelay, DelayLine};
pub use fir::{FirQ15, LowPassFilter, LOWPASS_COEFFS};
pub use gain::Gain;
pub use signal::SignalGenerator;
pub use stereo::StereoDifference;
