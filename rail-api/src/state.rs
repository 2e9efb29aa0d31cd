use std::sync::Arc;
use tokio::sync::broadcast;

use rail_core::{RailwayService, UserService};
use rail_shared::RailEvent;
use rail_store::{DbClient, SqliteSeatRepository, SqliteTrainRepository, SqliteUserRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub railway: RailwayService,
    pub users: UserService,
    pub events: broadcast::Sender<RailEvent>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wires the SQLite repositories behind the domain services.
    pub fn new(db: &DbClient, auth: AuthConfig, event_capacity: usize) -> Self {
        let railway = RailwayService::new(
            Arc::new(SqliteTrainRepository::new(db.pool.clone())),
            Arc::new(SqliteSeatRepository::new(db.pool.clone())),
        );
        let users = UserService::new(Arc::new(SqliteUserRepository::new(db.pool.clone())));
        let (events, _) = broadcast::channel(event_capacity.max(1));

        Self { railway, users, events, auth }
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub fn publish(&self, event: RailEvent) {
        let _ = self.events.send(event);
    }
}
