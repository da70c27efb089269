use std::path::PathBuf;
use std::time::Duration;

/// Errors produced while loading datasets or building charts
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] simd_json::Error),

    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("stage `{stage}` timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("stage `{stage}` needs {needs}, which an earlier stage did not provide")]
    MissingDependency {
        stage: &'static str,
        needs: &'static str,
    },
}

impl AtlasError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
