//! Probing of the host environment for default values
use std::num::NonZeroUsize;

use tracing::warn;

/// Source of information about the machine the process runs on
pub trait EnvironmentProbe: Send + Sync {
    /// Number of logical processing units, None if it can't be determined
    fn logical_cores(&self) -> Option<usize>;
}

/// Probe reading the actual host, through [`std::thread::available_parallelism`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl EnvironmentProbe for SystemProbe {
    fn logical_cores(&self) -> Option<usize> {
        std::thread::available_parallelism()
            .ok()
            .map(NonZeroUsize::get)
    }
}

/// Probe returning a fixed core count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedProbe(pub Option<usize>);

impl EnvironmentProbe for FixedProbe {
    fn logical_cores(&self) -> Option<usize> {
        self.0
    }
}

/// Determine the default number of processes to use for parallel work
///
/// One core is left free for the calling process when more than one is available. If the
/// core count can't be determined a single process is assumed.
pub fn default_processes(probe: &dyn EnvironmentProbe) -> usize {
    match probe.logical_cores() {
        None => {
            warn!("The number of cores could not be detected - assuming one.");
            1
        }
        Some(cores) if cores > 1 => cores - 1,
        Some(_) => 1,
    }
}
