// Error model shared by every layer of the intranet.
//
// Domain objects validate on construction and mutation and report through
// IntranetError; the HTTP façade turns the fault kind into a status code.

use thiserror::Error;

pub type IntranetResult<T> = Result<T, IntranetError>;

#[derive(Debug, Error)]
pub enum IntranetError {
    /// A required argument was missing or blank
    #[error("{0} cannot be null or empty")]
    ArgumentNull(&'static str),

    /// A value was present but outside its legal domain
    #[error("illegal value for {field}: {reason}")]
    IllegalValue { field: &'static str, reason: String },

    /// A business rule rejected the operation
    #[error("{0}")]
    Business(String),

    /// Internal failure that the caller cannot fix
    #[error("system failure: {0}")]
    System(String),

    /// The backing store failed
    #[error("repository failure: {0}")]
    Repository(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
}

/// Fault family, one per exception type the façade distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Validation,
    Business,
    System,
    Repository,
    NotFound,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Validation => "ValidationFault",
            FaultKind::Business => "BusinessFault",
            FaultKind::System => "SystemFault",
            FaultKind::Repository => "RepositoryFault",
            FaultKind::NotFound => "NotFoundFault",
        }
    }
}

impl IntranetError {
    pub fn illegal(field: &'static str, reason: impl Into<String>) -> Self {
        IntranetError::IllegalValue {
            field,
            reason: reason.into(),
        }
    }

    pub fn business(message: impl Into<String>) -> Self {
        IntranetError::Business(message.into())
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        IntranetError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn fault(&self) -> FaultKind {
        match self {
            IntranetError::ArgumentNull(_) | IntranetError::IllegalValue { .. } => {
                FaultKind::Validation
            }
            IntranetError::Business(_) => FaultKind::Business,
            IntranetError::System(_) => FaultKind::System,
            IntranetError::Repository(_) => FaultKind::Repository,
            IntranetError::NotFound { .. } => FaultKind::NotFound,
        }
    }
}

impl From<rusqlite::Error> for IntranetError {
    fn from(err: rusqlite::Error) -> Self {
        IntranetError::Repository(err.to_string())
    }
}

impl From<serde_json::Error> for IntranetError {
    fn from(err: serde_json::Error) -> Self {
        IntranetError::System(format!("serialization: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_mapping() {
        assert_eq!(IntranetError::ArgumentNull("navn").fault(), FaultKind::Validation);
        assert_eq!(IntranetError::illegal("måned", "13").fault(), FaultKind::Validation);
        assert_eq!(IntranetError::business("limit").fault(), FaultKind::Business);
        assert_eq!(IntranetError::not_found("Konto", "1010").fault(), FaultKind::NotFound);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            IntranetError::ArgumentNull("navn").to_string(),
            "navn cannot be null or empty"
        );
        assert_eq!(
            IntranetError::not_found("Konto", "DANKORT").to_string(),
            "Konto not found: DANKORT"
        );
    }

    #[test]
    fn test_sqlite_error_becomes_repository_fault() {
        let err: IntranetError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.fault(), FaultKind::Repository);
    }
}
