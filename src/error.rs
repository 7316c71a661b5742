use crate::db::StoreError;

/// Failures while bringing the server up or down.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("rocket: {0}")]
    Rocket(#[from] rocket::Error),

    #[error("cors configuration: {0}")]
    Cors(#[from] rocket_cors::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
