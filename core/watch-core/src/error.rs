//! Error types for watch-core operations.
//!
//! Fetch failures are split by type, not by message text: only
//! [`FetchError::AutomationUnavailable`] is a configuration defect, everything
//! else the renderer or the page can throw at us is worth another attempt.

use std::path::PathBuf;

use crate::target::Location;

// ═══════════════════════════════════════════════════════════════════════════════
// Input Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Malformed user input (target date, month names read off the page).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid --target-date (expected YYYY-MM-DD): {0}")]
    TargetDate(String),

    #[error("unrecognized month name: {0}")]
    MonthName(String),

    #[error("unrecognized location: {0} (expected ALPINE or PALISADES)")]
    Location(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Renderer Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Failures reported by a [`crate::renderer::Renderer`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The automation client cannot be reached or started at all.
    #[error("automation client unavailable: {0}")]
    Unavailable(String),

    #[error("renderer timeout: {0}")]
    Timeout(String),

    #[error("renderer error: {0}")]
    Protocol(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Fetch Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything that can go wrong while fetching one availability verdict.
///
/// Page-level variants carry the bounded page text captured at the moment of
/// failure so the orchestrator can write it to the diagnostic snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("automation client unavailable: {0}")]
    AutomationUnavailable(String),

    #[error("{0}")]
    Renderer(String),

    #[error("rendered page shows error state")]
    RenderedErrorState { snapshot: String },

    #[error("{location} selector not found")]
    LocationNotFound { location: Location, snapshot: String },

    #[error("target day cell not found: {label}")]
    CellNotFound { label: String, snapshot: String },

    #[error("unexpected page content: {0}")]
    UnexpectedPage(String),

    /// A failure that had no page text of its own, with the page captured after the fact.
    #[error("{source}")]
    WithSnapshot {
        source: Box<FetchError>,
        snapshot: String,
    },

    #[error("{last} (after {attempts} attempts)")]
    FetchFailed {
        last: Box<FetchError>,
        attempts: u32,
    },
}

impl FetchError {
    /// Whether another attempt could possibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::AutomationUnavailable(_) | FetchError::FetchFailed { .. } => false,
            FetchError::WithSnapshot { source, .. } => source.is_retryable(),
            _ => true,
        }
    }

    /// Page text captured when this failure happened, if any.
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            FetchError::RenderedErrorState { snapshot }
            | FetchError::LocationNotFound { snapshot, .. }
            | FetchError::CellNotFound { snapshot, .. }
            | FetchError::WithSnapshot { snapshot, .. } => Some(snapshot),
            FetchError::FetchFailed { last, .. } => last.snapshot(),
            _ => None,
        }
    }

    /// Attaches `page_text` unless this failure already carries its own.
    pub(crate) fn with_snapshot(self, page_text: String) -> Self {
        if self.snapshot().is_some() {
            return self;
        }
        FetchError::WithSnapshot {
            source: Box::new(self),
            snapshot: page_text,
        }
    }
}

impl From<RenderError> for FetchError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Unavailable(message) => FetchError::AutomationUnavailable(message),
            other => FetchError::Renderer(other.to_string()),
        }
    }
}

impl From<ParseError> for FetchError {
    fn from(err: ParseError) -> Self {
        FetchError::UnexpectedPage(err.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Storage Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from the local files the watcher owns (state, log, lock, snapshot).
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Path has no parent directory: {0}")]
    NoParent(PathBuf),
}

impl WatchError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        WatchError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using WatchError.
pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_renderer_maps_to_non_retryable() {
        let err: FetchError = RenderError::Unavailable("connection refused".to_string()).into();
        assert!(matches!(err, FetchError::AutomationUnavailable(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_maps_to_retryable() {
        let err: FetchError = RenderError::Timeout("page load".to_string()).into();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "renderer timeout: page load");
    }

    #[test]
    fn test_snapshot_survives_exhaustion_wrapper() {
        let err = FetchError::FetchFailed {
            last: Box::new(FetchError::CellNotFound {
                label: "Saturday, February 28, 2026".to_string(),
                snapshot: "page text".to_string(),
            }),
            attempts: 3,
        };
        assert_eq!(err.snapshot(), Some("page text"));
        assert_eq!(
            err.to_string(),
            "target day cell not found: Saturday, February 28, 2026 (after 3 attempts)"
        );
    }

    #[test]
    fn test_attached_snapshot_keeps_message_and_retryability() {
        let err = FetchError::UnexpectedPage("element not found: .mbsc-calendar-month".to_string())
            .with_snapshot("calendar text".to_string());
        assert_eq!(err.snapshot(), Some("calendar text"));
        assert_eq!(err.to_string(), "unexpected page content: element not found: .mbsc-calendar-month");
        assert!(err.is_retryable());

        let unavailable = FetchError::AutomationUnavailable("gone".to_string()).with_snapshot(String::new());
        assert!(!unavailable.is_retryable());
    }

    #[test]
    fn test_existing_snapshot_is_not_replaced() {
        let err = FetchError::RenderedErrorState {
            snapshot: "banner".to_string(),
        }
        .with_snapshot("later text".to_string());
        assert!(matches!(err, FetchError::RenderedErrorState { .. }));
        assert_eq!(err.snapshot(), Some("banner"));
    }
}
