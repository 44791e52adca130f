//! Error type shared by every step operation.

/// Errors raised while encoding, emitting, or reading step data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API was misused: a required collaborator is missing or a
    /// command name is empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required input was not supplied (or was blank).
    #[error("Input required and not supplied: {name}")]
    MissingRequiredInput { name: String },

    /// A value could not be turned into command text.
    #[error("failed to convert value to command text: {0}")]
    Conversion(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Writing to the output stream failed.
    #[error("failed to write to output stream: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a serializer failure.
    pub fn conversion<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Conversion(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::conversion(err)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_names_the_input() {
        let err = Error::MissingRequiredInput {
            name: "token".to_string(),
        };
        assert_eq!(err.to_string(), "Input required and not supplied: token");
    }

    #[test]
    fn test_conversion_keeps_source() {
        let json_err = serde_json::from_str::<u8>("nope").unwrap_err();
        let err = Error::from(json_err);

        assert!(matches!(err, Error::Conversion(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
