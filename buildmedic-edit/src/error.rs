//! Error types for buildmedic-edit.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {message}")]
    Json { path: Utf8PathBuf, message: String },

    /// A pointer segment traverses a value that is not an object.
    #[error("{pointer} in {path}: '{segment}' is not an object")]
    NotAnObject {
        path: Utf8PathBuf,
        pointer: String,
        segment: String,
    },

    #[error("invalid JSON pointer '{0}'")]
    BadPointer(String),
}

pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::EditError;

    #[test]
    fn not_an_object_names_the_segment() {
        let err = EditError::NotAnObject {
            path: "app.json".into(),
            pointer: "/expo/extra".to_string(),
            segment: "expo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "/expo/extra in app.json: 'expo' is not an object"
        );
    }
}
