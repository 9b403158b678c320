//! Errors surfaced by the deployment sequencer.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy_core::primitives::Address;

/// Failure of one of the two sequencing steps.
///
/// Neither variant is recovered from: the run aborts and the runner exits
/// non-zero.
#[derive(Debug)]
pub enum SequencerError {
    /// The contract-creation transaction did not confirm successfully.
    Deployment(anyhow::Error),
    /// The configuration call against a deployed instance did not confirm
    /// successfully.
    Configuration {
        /// The instance that was deployed before configuration failed.
        address: Address,
        /// Underlying cause.
        source: anyhow::Error,
    },
}

impl SequencerError {
    /// Whether the run got far enough to leave a deployed instance behind.
    pub fn deployed_address(&self) -> Option<Address> {
        match self {
            SequencerError::Deployment(_) => None,
            SequencerError::Configuration { address, .. } => Some(*address),
        }
    }
}

impl Display for SequencerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SequencerError::Deployment(e) => write!(f, "deployment failed: {:#}", e),
            SequencerError::Configuration { address, source } => write!(
                f,
                "configuration of instance {} failed: {:#}",
                address, source
            ),
        }
    }
}

impl Error for SequencerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SequencerError::Deployment(e) => Some(&**e),
            SequencerError::Configuration { source, .. } => Some(&**source),
        }
    }
}
