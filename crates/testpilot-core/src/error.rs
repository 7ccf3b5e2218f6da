//! Error types for flow execution
//!
//! A flow invocation fails in exactly one of two ways: the request does not
//! match its schema (`ValidationError`) or the model could not produce a usable
//! answer (`ModelError`). Neither is retried.

use thiserror::Error;

/// A payload that does not match its declared schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{schema}: field `{field}` is missing")]
    Missing {
        schema: &'static str,
        field: &'static str,
    },

    #[error("{schema}: field `{field}` is required and must not be empty")]
    Empty {
        schema: &'static str,
        field: &'static str,
    },

    #[error("{schema}: field `{field}` must be a string, found {found}")]
    WrongType {
        schema: &'static str,
        field: &'static str,
        found: &'static str,
    },

    #[error("{schema}: payload must be an object, found {found}")]
    NotAnObject {
        schema: &'static str,
        found: &'static str,
    },
}

impl ValidationError {
    /// Name of the offending field, if the error concerns a single field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Missing { field, .. }
            | ValidationError::Empty { field, .. }
            | ValidationError::WrongType { field, .. } => Some(field),
            ValidationError::NotAnObject { .. } => None,
        }
    }

    pub fn schema(&self) -> &'static str {
        match self {
            ValidationError::Missing { schema, .. }
            | ValidationError::Empty { schema, .. }
            | ValidationError::WrongType { schema, .. }
            | ValidationError::NotAnObject { schema, .. } => schema,
        }
    }
}

/// Failure of the model call itself, or of the answer it produced
#[derive(Error, Debug)]
pub enum ModelError {
    /// Provider selected but not usable (usually a missing API key)
    #[error("{provider} is not configured: {hint}")]
    NotConfigured {
        provider: &'static str,
        hint: String,
    },

    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("Model request timed out")]
    Timeout,

    /// Non-success HTTP status from the provider
    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The answer did not contain a JSON object
    #[error("Model response could not be parsed: {message}")]
    MalformedResponse { message: String },

    /// The answer parsed but does not match the result schema
    #[error("Model response rejected: {0}")]
    InvalidOutput(#[source] ValidationError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ModelError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a transport error, separating timeouts from other network failures
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network { source: err }
        }
    }
}

/// Stages of a single flow invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    ValidatingInput,
    Rendering,
    AwaitingModel,
    ValidatingOutput,
    Done,
    Failed,
}

impl FlowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStage::ValidatingInput => "validating-input",
            FlowStage::Rendering => "rendering",
            FlowStage::AwaitingModel => "awaiting-model",
            FlowStage::ValidatingOutput => "validating-output",
            FlowStage::Done => "done",
            FlowStage::Failed => "failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),
}

impl FlowError {
    /// Stage at which the invocation stopped
    pub fn stage(&self) -> FlowStage {
        match self {
            FlowError::Validation(_) => FlowStage::ValidatingInput,
            FlowError::Model(ModelError::MalformedResponse { .. })
            | FlowError::Model(ModelError::InvalidOutput(_)) => FlowStage::ValidatingOutput,
            FlowError::Model(_) => FlowStage::AwaitingModel,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }

    /// The input validation failure, if that is what stopped the flow
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            FlowError::Validation(err) => Some(err),
            FlowError::Model(_) => None,
        }
    }
}
