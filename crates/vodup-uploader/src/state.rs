//! Upload state machine.
//!
//! Makes the sequential contract of the pipeline explicit: one chunk in
//! flight at a time, ascending index order, reassembly only after every chunk
//! succeeded. The driver advances this machine on the completion or failure
//! of each network call, so a violation of the contract is a bug caught here
//! rather than a silent reordering.

use crate::error::StateError;

/// Phase of one chunked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    /// Nothing started yet.
    Idle,
    /// Deriving the upload descriptor from the source file.
    Splitting,
    /// Chunk `chunk_index` is the one currently in flight.
    Uploading { chunk_index: u32 },
    /// All chunks uploaded; reassembly request in flight.
    Assembling,
    /// Final object written and locator received.
    Completed,
    /// Aborted; no further transitions.
    Failed { reason: String },
}

impl UploadPhase {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Completed | UploadPhase::Failed { .. })
    }
}

/// Checked state machine for one upload sequence.
#[derive(Debug, Clone)]
pub struct UploadState {
    phase: UploadPhase,
    total_chunks: u32,
}

impl Default for UploadState {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadState {
    pub fn new() -> Self {
        Self {
            phase: UploadPhase::Idle,
            total_chunks: 0,
        }
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    fn invalid(&self, event: &'static str) -> StateError {
        StateError {
            from: self.phase.clone(),
            event,
        }
    }

    /// Idle → Splitting.
    pub fn begin_splitting(&mut self) -> Result<(), StateError> {
        match self.phase {
            UploadPhase::Idle => {
                self.phase = UploadPhase::Splitting;
                Ok(())
            }
            _ => Err(self.invalid("begin_splitting")),
        }
    }

    /// Splitting → Uploading(0). `total_chunks` must be at least 1.
    pub fn begin_uploading(&mut self, total_chunks: u32) -> Result<(), StateError> {
        match self.phase {
            UploadPhase::Splitting if total_chunks >= 1 => {
                self.total_chunks = total_chunks;
                self.phase = UploadPhase::Uploading { chunk_index: 0 };
                Ok(())
            }
            _ => Err(self.invalid("begin_uploading")),
        }
    }

    /// The in-flight chunk completed: advance to the next index, or to
    /// Assembling when it was the last one.
    pub fn chunk_completed(&mut self) -> Result<(), StateError> {
        match self.phase {
            UploadPhase::Uploading { chunk_index } => {
                if chunk_index + 1 == self.total_chunks {
                    self.phase = UploadPhase::Assembling;
                } else {
                    self.phase = UploadPhase::Uploading {
                        chunk_index: chunk_index + 1,
                    };
                }
                Ok(())
            }
            _ => Err(self.invalid("chunk_completed")),
        }
    }

    /// Assembling → Completed.
    pub fn assembled(&mut self) -> Result<(), StateError> {
        match self.phase {
            UploadPhase::Assembling => {
                self.phase = UploadPhase::Completed;
                Ok(())
            }
            _ => Err(self.invalid("assembled")),
        }
    }

    /// Any non-terminal phase → Failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), StateError> {
        if self.phase.is_terminal() {
            return Err(self.invalid("fail"));
        }
        self.phase = UploadPhase::Failed {
            reason: reason.into(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = UploadState::new();
        state.begin_splitting().unwrap();
        state.begin_uploading(3).unwrap();
        assert_eq!(*state.phase(), UploadPhase::Uploading { chunk_index: 0 });

        state.chunk_completed().unwrap();
        assert_eq!(*state.phase(), UploadPhase::Uploading { chunk_index: 1 });
        state.chunk_completed().unwrap();
        state.chunk_completed().unwrap();
        assert_eq!(*state.phase(), UploadPhase::Assembling);

        state.assembled().unwrap();
        assert_eq!(*state.phase(), UploadPhase::Completed);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn test_single_chunk_goes_straight_to_assembling() {
        let mut state = UploadState::new();
        state.begin_splitting().unwrap();
        state.begin_uploading(1).unwrap();
        state.chunk_completed().unwrap();
        assert_eq!(*state.phase(), UploadPhase::Assembling);
    }

    #[test]
    fn test_failure_from_any_nonterminal_phase() {
        let mut state = UploadState::new();
        state.begin_splitting().unwrap();
        state.begin_uploading(2).unwrap();
        state.fail("network down").unwrap();
        assert_eq!(
            *state.phase(),
            UploadPhase::Failed {
                reason: "network down".to_string()
            }
        );
        assert!(state.phase().is_terminal());
        // Terminal states reject everything, including another failure.
        assert!(state.fail("again").is_err());
        assert!(state.chunk_completed().is_err());
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut state = UploadState::new();
        assert!(state.chunk_completed().is_err());
        assert!(state.assembled().is_err());
        assert!(state.begin_uploading(3).is_err());

        state.begin_splitting().unwrap();
        assert!(state.begin_splitting().is_err());
        assert!(state.begin_uploading(0).is_err());
    }
}
