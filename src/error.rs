use std::path::PathBuf;
use std::time::Duration;

/// Failure to fetch or decode a source image.
///
/// Raised at the sampler boundary. The scheduler logs and drops it; the
/// displayed grid and any running transition are left untouched.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch {source_id}: {reason}")]
    Fetch { source_id: String, reason: String },

    #[error("{source_id} returned HTTP status {status}")]
    Status { source_id: String, status: u16 },

    #[error("failed to read {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to decode image from {source_id}: {error}")]
    Decode {
        source_id: String,
        #[source]
        error: image::ImageError,
    },

    #[error("{source_id} decoded to an empty image")]
    EmptyImage { source_id: String },

    #[error("loading {source_id} timed out after {}ms", .timeout.as_millis())]
    Timeout { source_id: String, timeout: Duration },
}

/// Configuration rejected at start-up. Always fatal.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("image catalog must contain at least one source")]
    EmptyCatalog,

    #[error("grid dimensions must be positive, got {rows} rows x {cols} cols")]
    ZeroDimension { rows: usize, cols: usize },

    #[error("{0} must be > 0")]
    ZeroInterval(&'static str),

    #[error("batch_fraction must be in (0, 1], got {0}")]
    BatchFraction(f64),

    #[error("invalid image source '{raw}': {reason}")]
    InvalidSource { raw: String, reason: String },

    #[error("failed to read config {}: {error}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to parse yaml in {} at {location}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        location: String,
        message: String,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("target grid is {actual_rows}x{actual_cols}, display grid is {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_source() {
        let error = LoadError::Status {
            source_id: "https://example.com/a.png".to_owned(),
            status: 404,
        };
        assert_eq!(
            error.to_string(),
            "https://example.com/a.png returned HTTP status 404"
        );

        let timeout = LoadError::Timeout {
            source_id: "slow.png".to_owned(),
            timeout: Duration::from_millis(1500),
        };
        assert!(timeout.to_string().contains("1500ms"));
    }

    #[test]
    fn config_errors_are_descriptive() {
        assert!(ConfigError::ZeroDimension { rows: 0, cols: 4 }
            .to_string()
            .contains("0 rows x 4 cols"));
        assert_eq!(
            ConfigError::ZeroInterval("tick_interval_ms").to_string(),
            "tick_interval_ms must be > 0"
        );
    }
}
