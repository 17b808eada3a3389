use crate::config::TransformConfig;
use crate::error::PipelineError;

use super::fir::LowPassFilter;
use super::gain::Gain;
use super::signal::SignalGenerator;
use super::stereo::StereoDifference;

/// In-place processing of one block of interleaved bus samples.
///
/// Called with exclusive access to the block for the duration of the call;
/// implementations must not keep the slice.
pub trait BlockTransform {
    fn process(&mut self, samples: &mut [i32]);
}

impl<F> BlockTransform for F
where
    F: FnMut(&mut [i32]),
{
    fn process(&mut self, samples: &mut [i32]) {
        self(samples)
    }
}

/// Leaves blocks untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl BlockTransform for Passthrough {
    fn process(&mut self, _samples: &mut [i32]) {}
}

/// The enabled stages, run in a fixed order: signal injection, low-pass,
/// stereo difference, gain.
pub struct TransformChain {
    config: TransformConfig,
    signal: Option<SignalGenerator>,
    lowpass: Option<LowPassFilter>,
    stereo: Option<StereoDifference>,
    gain: Option<Gain>,
}

impl TransformChain {
    pub fn new(config: TransformConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let channels = config.channels;
        Ok(TransformChain {
            config,
            signal: config.signal_injection.then(|| SignalGenerator::new(channels)),
            lowpass: config.lowpass.then(|| LowPassFilter::new(channels)),
            stereo: config.stereo_difference.then_some(StereoDifference),
            // The injected tone is already full scale.
            gain: (config.gain && !config.signal_injection).then(|| Gain::new(config.gain_shift)),
        })
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Number of stages that will run.
    pub fn stage_count(&self) -> usize {
        self.signal.is_some() as usize
            + self.lowpass.is_some() as usize
            + self.stereo.is_some() as usize
            + self.gain.is_some() as usize
    }

    /// Clear filter history and rewind the test tone.
    pub fn reset(&mut self) {
        if let Some(signal) = self.signal.as_mut() {
            signal.reset();
        }
        if let Some(lowpass) = self.lowpass.as_mut() {
            lowpass.reset();
        }
    }
}

impl BlockTransform for TransformChain {
    fn process(&mut self, samples: &mut [i32]) {
        if let Some(signal) = self.signal.as_mut() {
            signal.process(samples);
        }
        if let Some(lowpass) = self.lowpass.as_mut() {
            lowpass.process(samples);
        }
        if let Some(stereo) = self.stereo.as_mut() {
            stereo.process(samples);
        }
        if let Some(gain) = self.gain.as_mut() {
            gain.process(samples);
        }
    }
}
