use roster_core::RosterCore;

/// Shared handler state. Cloning is cheap: the services share one pooled
/// database connection.
#[derive(Clone)]
pub struct AppState {
    pub core: RosterCore,
}

impl AppState {
    pub fn new(core: RosterCore) -> Self {
        Self { core }
    }
}
