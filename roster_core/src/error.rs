use sea_orm::DbErr;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures while bringing up a [`crate::RosterCore`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration")]
    Config(#[from] ConfigError),

    #[error("data store unavailable")]
    Database(#[from] DbErr),
}
