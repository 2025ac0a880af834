//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/patch DTOs for the write paths
//!
//! Entities with a time window also expose computed effective-status
//! helpers; read paths use those instead of mutating the row, so
//! persisted status is only ever written by an explicit transition or
//! the expiry sweep.

pub mod invite;
pub mod notification;
pub mod position;
pub mod squad;
pub mod status;
