//! Error taxonomy shared by every stage of the pipeline.

use thiserror::Error;

/// Why a configuration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigFault {
    #[error("peripheral not ready")]
    NotReady,
    #[error("parameter out of range: {0}")]
    InvalidParameter(&'static str),
    #[error("block size does not match the pool block size")]
    BlockSizeMismatch,
    #[error("not enough free blocks to prime the peripheral")]
    InsufficientBlocks,
    #[error("peripheral rejected the configuration (code {0})")]
    Rejected(i32),
    #[error("operation not valid in the current state")]
    InvalidState,
}

/// Errors raised by the block pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineError {
    /// Init-time failure; the subsystem does not start.
    #[error("configuration error: {0}")]
    ConfigurationError(ConfigFault),
    /// No free block under the non-blocking policy (or the blocking wait
    /// expired).
    #[error("block pool exhausted")]
    PoolExhausted,
    /// A receive, transmit or buffer-arm deadline was missed.
    #[error("peripheral timeout")]
    PeripheralTimeout,
    /// The producer could not get a free slot; it was stalled instead of
    /// overwriting unconsumed data.
    #[error("overrun risk: producer stalled")]
    OverrunRisk,
    /// Unknown hardware event reached the acquisition engine.
    #[error("unexpected hardware event {0:#x}")]
    EventError(u32),
    /// The peripheral reported an error code.
    #[error("peripheral fault (code {0})")]
    PeripheralFault(i32),
}

impl PipelineError {
    /// Whether the error stops the subsystem that raised it.
    ///
    /// `PeripheralTimeout` is only returned once the retry budget is spent,
    /// so it is fatal by the time a caller sees it.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::ConfigurationError(_)
            | PipelineError::PeripheralTimeout
            | PipelineError::PeripheralFault(_) => true,
            PipelineError::PoolExhausted
            | PipelineError::OverrunRisk
            | PipelineError::EventError(_) => false,
        }
    }
}

impl From<ConfigFault> for PipelineError {
    fn from(fault: ConfigFault) -> Self {
        PipelineError::ConfigurationError(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(PipelineError::ConfigurationError(ConfigFault::NotReady).is_fatal());
        assert!(PipelineError::PeripheralTimeout.is_fatal());
        assert!(PipelineError::PeripheralFault(-5).is_fatal());
        assert!(!PipelineError::PoolExhausted.is_fatal());
        assert!(!PipelineError::OverrunRisk.is_fatal());
        assert!(!PipelineError::EventError(7).is_fatal());
    }

    #[test]
    fn config_fault_converts() {
        let err: PipelineError = ConfigFault::BlockSizeMismatch.into();
        assert_eq!(
            err,
            PipelineError::ConfigurationError(ConfigFault::BlockSizeMismatch)
        );
    }
}
