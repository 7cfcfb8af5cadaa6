//! Unified error handling for the waymark library.
//!
//! Parsing problems inside a waypoint sequence are never errors: they are
//! resolved by omission or pass-through. This type covers the operations that
//! can genuinely fail (export I/O, payload decoding, caller misuse).

use thiserror::Error;

/// Unified error type for waymark operations.
#[derive(Debug, Error)]
pub enum WaymarkError {
    /// A wall-clock string that is not `HH:MM` or `HH:MM:SS`
    #[error("Invalid time '{value}', expected HH:MM or HH:MM:SS")]
    InvalidTime { value: String },

    /// Waypoint index outside the sequence
    #[error("Waypoint index {index} out of range for {len} waypoints")]
    IndexOutOfRange { index: usize, len: usize },

    /// KMZ export could not be completed
    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Session document could not be decoded or encoded
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type alias for waymark operations.
pub type Result<T> = std::result::Result<T, WaymarkError>;

/// Extension trait for converting Option to WaymarkError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an index-out-of-range error.
    fn ok_or_index(self, index: usize, len: usize) -> Result<T>;

    /// Convert Option to Result with an invalid-time error.
    fn ok_or_invalid_time(self, value: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_index(self, index: usize, len: usize) -> Result<T> {
        self.ok_or(WaymarkError::IndexOutOfRange { index, len })
    }

    fn ok_or_invalid_time(self, value: &str) -> Result<T> {
        self.ok_or_else(|| WaymarkError::InvalidTime {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WaymarkError::IndexOutOfRange { index: 7, len: 3 };
        assert!(err.to_string().contains("index 7"));
        assert!(err.to_string().contains("3 waypoints"));

        let err = WaymarkError::InvalidTime {
            value: "8h30".to_string(),
        };
        assert!(err.to_string().contains("8h30"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<u32> = None;
        assert!(matches!(
            none.ok_or_index(4, 2),
            Err(WaymarkError::IndexOutOfRange { index: 4, len: 2 })
        ));
        assert_eq!(Some(5).ok_or_invalid_time("x").unwrap(), 5);
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: WaymarkError = io.into();
        assert!(matches!(err, WaymarkError::Io(_)));
    }
}
