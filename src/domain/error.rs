//! Domain error types.

/// Why a single raw row could not become a [`Trade`](crate::domain::trade::Trade).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("unreadable row: {reason}")]
    Unreadable { reason: String },
}

impl RecordError {
    pub fn invalid(field: &'static str, value: &str, reason: impl ToString) -> Self {
        RecordError::InvalidField {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Top-level error type for flowtrader.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("malformed record at {source_name}:{line}: {reason}")]
    MalformedRecord {
        source_name: String,
        line: usize,
        reason: RecordError,
    },

    #[error("group {key:?} has no trades")]
    EmptyGroup { key: String },

    #[error("group {key:?} has zero total volume")]
    ZeroWeight { key: String },

    #[error("group {key:?}: {quantity} overflows")]
    AggregateOverflow { key: String, quantity: &'static str },

    #[error("data directory not found: {path}")]
    MissingDataDirectory { path: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Process exit status for this failure class.
    pub fn exit_status(&self) -> u8 {
        match self {
            FlowError::Io(_) | FlowError::Export { .. } => 1,
            FlowError::ConfigParse { .. }
            | FlowError::ConfigMissing { .. }
            | FlowError::ConfigInvalid { .. } => 2,
            FlowError::MalformedRecord { .. } => 3,
            FlowError::MissingDataDirectory { .. } => 4,
            FlowError::EmptyGroup { .. }
            | FlowError::ZeroWeight { .. }
            | FlowError::AggregateOverflow { .. } => 5,
        }
    }
}

impl From<&FlowError> for std::process::ExitCode {
    fn from(err: &FlowError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
