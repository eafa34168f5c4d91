use sea_orm::DatabaseConnection;

pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod models;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    config::RosterConfig,
    error::StartupError,
    service::{
        accounts::AccountsService, groups::GroupsService, projects::ProjectsService,
        resources::ResourcesService, stats::StatsService, students::StudentsService,
        tasks::TasksService,
    },
};

/// Main runtime handle for roster: configuration, the database connection
/// and one service per aggregate, all sharing that connection.
#[derive(Clone)]
pub struct RosterCore {
    pub config: RosterConfig,
    pub db: DatabaseConnection,

    pub accounts: AccountsService,
    pub students: StudentsService,
    pub groups: GroupsService,
    pub projects: ProjectsService,
    pub tasks: TasksService,
    pub resources: ResourcesService,
    pub stats: StatsService,
}

impl RosterCore {
    /// Connect to the configured database and bring its schema up to date.
    pub async fn start(config: RosterConfig) -> Result<Self, StartupError> {
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        Ok(Self::with_connection(config, db))
    }

    /// Build the services over an already migrated connection.
    pub fn with_connection(config: RosterConfig, db: DatabaseConnection) -> Self {
        Self {
            accounts: AccountsService::new(db.clone()),
            students: StudentsService::new(db.clone()),
            groups: GroupsService::new(db.clone()),
            projects: ProjectsService::new(db.clone()),
            tasks: TasksService::new(db.clone()),
            resources: ResourcesService::new(db.clone()),
            stats: StatsService::new(db.clone()),
            config,
            db,
        }
    }

    pub async fn shutdown(self) -> Result<(), StartupError> {
        self.db.close().await?;
        Ok(())
    }
}

pub mod prelude {
    pub use super::config;
    pub use super::entity;
    pub use super::error;
    pub use super::ids;
    pub use super::models;
    pub use super::service;

    pub use super::RosterCore;
}
