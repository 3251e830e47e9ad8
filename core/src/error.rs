//! Error taxonomy of the catalog.
//!
//! Every fault a catalog operation can report, whether it was raised locally
//! by a catalog service or reconstructed from an RPC reply by a client. The
//! message carried by each variant is what callers ultimately see, so the
//! gateway forwards it rather than inventing its own.

use crate::record::EntityKind;
use thiserror::Error;

/// Errors returned by catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No record with the requested id exists.
    #[error("{0}")]
    NotFound(String),

    /// A record with the same id already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// The request is missing a required field or carries a blank one.
    #[error("{0}")]
    Validation(String),

    /// The service failed while serving the request (storage, encoding).
    #[error("{0}")]
    Internal(String),

    /// The service could not be reached, or replied with something unreadable.
    #[error("{0}")]
    Transport(String),
}

impl CatalogError {
    /// A record of `kind` with `id` does not exist.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound(format!("{} with id {id} not found", kind.label()))
    }

    /// A record of `kind` with `id` already exists.
    #[must_use]
    pub fn already_exists(kind: EntityKind, id: &str) -> Self {
        Self::AlreadyExists(format!("{} with id {id} already exists", kind.label()))
    }

    /// A required field is absent or blank.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("missing required field: {field}"))
    }

    /// Stable machine readable code, used on the RPC wire and in REST errors.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Validation(_) => "INVALID_ARGUMENT",
            Self::Internal(_) => "INTERNAL",
            Self::Transport(_) => "UNAVAILABLE",
        }
    }

    /// Rebuild an error from its wire code and message.
    ///
    /// Unknown codes are treated as internal faults.
    #[must_use]
    pub fn from_code(code: &str, message: String) -> Self {
        match code {
            "NOT_FOUND" => Self::NotFound(message),
            "ALREADY_EXISTS" => Self::AlreadyExists(message),
            "INVALID_ARGUMENT" => Self::Validation(message),
            "UNAVAILABLE" => Self::Transport(message),
            _ => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_kind_and_id() {
        let err = CatalogError::already_exists(EntityKind::Movie, "42");
        assert_eq!(err.to_string(), "Movie with id 42 already exists");
        let err = CatalogError::not_found(EntityKind::TvShow, "9");
        assert_eq!(err.to_string(), "TV show with id 9 not found");
    }

    #[test]
    fn codes_round_trip() {
        for err in [
            CatalogError::NotFound("a".into()),
            CatalogError::AlreadyExists("b".into()),
            CatalogError::Validation("c".into()),
            CatalogError::Internal("d".into()),
            CatalogError::Transport("e".into()),
        ] {
            let rebuilt = CatalogError::from_code(err.code(), err.to_string());
            assert_eq!(rebuilt, err);
        }
        assert_eq!(
            CatalogError::from_code("TEAPOT", "x".into()),
            CatalogError::Internal("x".into())
        );
    }
}
