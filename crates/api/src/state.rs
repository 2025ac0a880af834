use std::sync::Arc;

use squadhq_events::EventBus;
use squadhq_workflows::{InviteService, PositionService, SquadService};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: squadhq_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
    /// Squad lifecycle workflow.
    pub squads: Arc<SquadService>,
    /// Invite workflow.
    pub invites: Arc<InviteService>,
    /// Position and application workflow.
    pub positions: Arc<PositionService>,
}
