//! HTTP handlers, one module per resource.

pub mod application;
pub mod invite;
pub mod notification;
pub mod position;
pub mod squad;
