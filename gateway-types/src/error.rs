//! Error types for the payment gateway.

use std::error::Error as StdError;
use std::time::Duration;

/// Boxed error retained as the diagnostic cause of a failure.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Transport-level errors raised by a `PaymentProcessor` adapter.
///
/// These never cross the orchestrator boundary: they are converted into a
/// `NormalizedError` of kind `ThirdPartyFailure` at the call site.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("processor responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("processor request timed out after {0:?}")]
    Timeout(Duration),

    #[error("processor transport failure: {0}")]
    Transport(#[source] BoxError),

    #[error("processor returned an unreadable body: {0}")]
    InvalidBody(String),
}

impl ProcessorError {
    /// HTTP status reported by the processor, when one was received.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ProcessorError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The canonical failure kinds shared by all layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, detected before any external call.
    Validation,
    Unauthorized,
    NotFound,
    /// The processor returned an error status or the transport failed.
    ThirdPartyFailure,
    /// Unexpected failure in local processing (e.g. an undecodable response).
    Internal,
}

impl ErrorKind {
    /// Status carried by errors of this kind when no upstream status applies.
    pub fn default_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::ThirdPartyFailure | ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ThirdPartyFailure => "THIRD_PARTY_FAILURE",
            ErrorKind::Internal => "INTERNAL",
        };
        write!(f, "{}", name)
    }
}

/// The single failure value produced by orchestrator operations.
///
/// `http_status` is the status attached to the failure itself: the upstream
/// status for `ThirdPartyFailure` (500 when unknown), otherwise the kind's
/// default. `cause` keeps the original error for diagnostics only.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
    pub http_status: u16,
    #[source]
    pub cause: Option<BoxError>,
}

impl NormalizedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: kind.default_status(),
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// A `ThirdPartyFailure`; `status` defaults to 500 when the upstream status is unknown.
    pub fn third_party(message: impl Into<String>, status: Option<u16>, cause: BoxError) -> Self {
        Self {
            kind: ErrorKind::ThirdPartyFailure,
            message: message.into(),
            http_status: status.unwrap_or(500),
            cause: Some(cause),
        }
    }

    /// Attaches an underlying error as the cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Prefixes the message with call-site context. Kind, status and cause are kept.
    pub fn with_context(mut self, context: &str) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<ProcessorError> for NormalizedError {
    fn from(err: ProcessorError) -> Self {
        let status = err.upstream_status();
        NormalizedError::third_party(
            format!("Processor API error: {}", err),
            status,
            Box::new(err),
        )
    }
}
