//! Upload file-name derivation and validation.
//!
//! File names arrive from clients and become object-store keys verbatim, so
//! they are treated as untrusted input on the server side.

use thiserror::Error;

use crate::chunk::CHUNK_KEY_MARKER;

/// Errors that can occur while validating an upload file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("file name is empty")]
    Empty,

    #[error("file name contains a path separator")]
    PathSeparator,

    #[error("file name contains a '..' segment")]
    ParentTraversal,

    #[error("file name contains the reserved '{CHUNK_KEY_MARKER}' marker")]
    ReservedMarker,

    #[error("file name contains a control character")]
    ControlCharacter,
}

/// Result type for file-name validation.
pub type FileNameResult<T> = Result<T, FileNameError>;

/// Validate a client-supplied upload file name.
///
/// Rejects anything that could escape the bucket namespace or collide with a
/// chunk key. The derived names produced by [`timestamped_file_name`] always
/// pass as long as the original name does.
pub fn validate_file_name(name: &str) -> FileNameResult<()> {
    if name.trim().is_empty() {
        return Err(FileNameError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FileNameError::PathSeparator);
    }
    if name.contains("..") {
        return Err(FileNameError::ParentTraversal);
    }
    if name.contains(CHUNK_KEY_MARKER) {
        return Err(FileNameError::ReservedMarker);
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(FileNameError::ControlCharacter);
    }
    Ok(())
}

/// Derive the upload file name from the original name.
///
/// Generated once at split time and reused unchanged for every chunk request
/// and for the reassembly request. The millisecond prefix keeps a restarted
/// upload from colliding with chunks left behind by an aborted one.
pub fn timestamped_file_name(original: &str) -> String {
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_file_name("1700000000000-video.mp4").is_ok());
        assert!(validate_file_name("clip (final).mov").is_ok());
        assert!(validate_file_name("a").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(validate_file_name(""), Err(FileNameError::Empty));
        assert_eq!(validate_file_name("   "), Err(FileNameError::Empty));
        assert_eq!(validate_file_name("a/b.mp4"), Err(FileNameError::PathSeparator));
        assert_eq!(validate_file_name("a\\b.mp4"), Err(FileNameError::PathSeparator));
        assert_eq!(validate_file_name("../etc/passwd"), Err(FileNameError::PathSeparator));
        assert_eq!(validate_file_name("..secret"), Err(FileNameError::ParentTraversal));
        assert_eq!(
            validate_file_name("video.chunk.0"),
            Err(FileNameError::ReservedMarker)
        );
        assert_eq!(validate_file_name("a\nb"), Err(FileNameError::ControlCharacter));
    }

    #[test]
    fn test_timestamped_name_is_valid() {
        let name = timestamped_file_name("my video.mp4");
        assert!(validate_file_name(&name).is_ok());
        assert!(name.ends_with("-my video.mp4"));
        let millis: i64 = name.split('-').next().unwrap().parse().unwrap();
        assert!(millis > 1_600_000_000_000);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(FileNameError::Empty.to_string(), "file name is empty");
        assert_eq!(
            FileNameError::ReservedMarker.to_string(),
            "file name contains the reserved '.chunk.' marker"
        );
    }
}
