//! Background jobs spawned by the server binary.

pub mod expiry;
