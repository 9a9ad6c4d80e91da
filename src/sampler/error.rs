use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("sampler worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
