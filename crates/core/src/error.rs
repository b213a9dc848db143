#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown job category: {0}")]
    UnknownCategory(String),

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
}
