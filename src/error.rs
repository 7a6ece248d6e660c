use thiserror::Error;

/// Failures that end an analysis request.
///
/// An empty result set is not represented here: it is a valid `Results` view
/// that renders as "no results".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid death record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("{0}")]
    Transport(String),
}

impl AnalysisError {
    pub fn invalid(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Text shown in the error view.
    pub fn user_message(&self) -> String {
        match self {
            // Transport text is surfaced verbatim.
            AnalysisError::Transport(text) => text.clone(),
            AnalysisError::InvalidRecord { .. } => format!("Analysis failed: {self}"),
        }
    }
}
