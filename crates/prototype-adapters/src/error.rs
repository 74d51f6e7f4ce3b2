//! Adapter error types.

use std::path::PathBuf;

use thiserror::Error;

use prototype_core::application::CloneError;
use prototype_core::domain::DomainError;
use prototype_core::error::PrototypeError;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid time layout {layout:?}")]
    InvalidLayout { layout: String },

    #[error("cannot represent {value} as JSON: {reason}")]
    Json { value: String, reason: String },

    #[error(transparent)]
    Model(#[from] DomainError),

    #[error(transparent)]
    Clone(#[from] CloneError),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl From<AdapterError> for PrototypeError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::Model(e) => PrototypeError::Domain(e),
            AdapterError::Clone(e) => PrototypeError::Clone(e),
            other => PrototypeError::Configuration {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prototype_core::error::ErrorCategory;

    #[test]
    fn configuration_failures_map_to_configuration() {
        let e: PrototypeError = AdapterError::InvalidLayout {
            layout: "%Q".into(),
        }
        .into();
        assert_eq!(e.category(), ErrorCategory::Configuration);
        assert!(e.to_string().contains("%Q"));
    }

    #[test]
    fn engine_failures_keep_their_layer() {
        let e: PrototypeError = AdapterError::Clone(CloneError::InvalidTarget {
            reason: "nil pointer".into(),
        })
        .into();
        assert!(matches!(e, PrototypeError::Clone(_)));
    }
}
