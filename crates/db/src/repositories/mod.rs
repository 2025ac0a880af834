//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept any `SqliteExecutor` as the first argument, so the same
//! method runs against the pool or inside a caller-owned transaction.

pub mod application_repo;
pub mod invite_repo;
pub mod member_repo;
pub mod notification_repo;
pub mod position_repo;
pub mod squad_repo;

pub use application_repo::ApplicationRepo;
pub use invite_repo::InviteRepo;
pub use member_repo::MemberRepo;
pub use notification_repo::NotificationRepo;
pub use position_repo::PositionRepo;
pub use squad_repo::SquadRepo;
