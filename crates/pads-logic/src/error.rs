use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("file is empty")]
    EmptyFile,

    #[error("not a PADS Logic export, unrecognized header: {0}")]
    InvalidHeader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
