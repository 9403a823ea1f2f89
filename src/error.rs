use thiserror::Error;

/// Failures surfaced by the wizard. Each kind is stored and cleared independently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Analysis(String),

    #[error("{0}")]
    Generation(String),
}

/// A room record that cannot be turned into drawable geometry.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("room {room}: no usable geometry ({detail})")]
    Missing { room: String, detail: String },

    #[error("room {room}: invalid geometry ({detail})")]
    Invalid { room: String, detail: String },

    #[error("room record #{index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the analysis service boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Worker(String),
}

/// The staged blueprint could not be turned into a preview image.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF renderer unavailable ({0})")]
    PdfUnavailable(String),

    #[error("PDF render failed: {0}")]
    Pdf(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
