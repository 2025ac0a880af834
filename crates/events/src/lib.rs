//! In-process platform events and the notification sink.
//!
//! The workflows never wait on delivery: they hand a [`NewNotification`]
//! to the [`Notifier`] after their transaction commits, and the notifier
//! persists it and fans out a [`PlatformEvent`] for any in-process
//! subscriber (future transports poll the `notifications` table).
//!
//! [`NewNotification`]: squadhq_db::models::notification::NewNotification

pub mod bus;
pub mod notifier;

pub use bus::{EventBus, PlatformEvent};
pub use notifier::Notifier;
