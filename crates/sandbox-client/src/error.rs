#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client init failed: {0}")]
    Init(String),

    #[error("submit failed: {0}")]
    Submit(String),

    #[error("poll failed: {0}")]
    Poll(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
