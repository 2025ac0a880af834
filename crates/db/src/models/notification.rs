//! Notification entity model and insert DTO.

use serde::Serialize;
use sqlx::FromRow;
use squadhq_core::types::{DbId, Timestamp};

/// A row from the `notifications` table. Immutable after insert except
/// for `is_read` / `read_at`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub squad_id: Option<DbId>,
    pub position_id: Option<DbId>,
    pub application_id: Option<DbId>,
    pub created_at: Timestamp,
    pub read_at: Option<Timestamp>,
}

/// The kinds of notification the recruitment workflows emit. Stored as
/// the dot-separated name, which doubles as the platform event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    InviteReceived,
    InviteAccepted,
    InviteDeclined,
    ApplicationReceived,
    ApplicationApproved,
    ApplicationRejected,
    ApplicationExpired,
    PositionClosed,
    MemberRemoved,
    CaptaincyTransferred,
    SquadDismantled,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InviteReceived => "invite.received",
            Self::InviteAccepted => "invite.accepted",
            Self::InviteDeclined => "invite.declined",
            Self::ApplicationReceived => "application.received",
            Self::ApplicationApproved => "application.approved",
            Self::ApplicationRejected => "application.rejected",
            Self::ApplicationExpired => "application.expired",
            Self::PositionClosed => "position.closed",
            Self::MemberRemoved => "member.removed",
            Self::CaptaincyTransferred => "captaincy.transferred",
            Self::SquadDismantled => "squad.dismantled",
        }
    }
}

/// Insert DTO handed to the notification sink.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub squad_id: Option<DbId>,
    pub position_id: Option<DbId>,
    pub application_id: Option<DbId>,
}

impl NewNotification {
    /// Start a notification with empty back-references.
    pub fn new(
        user_id: DbId,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            squad_id: None,
            position_id: None,
            application_id: None,
        }
    }

    pub fn with_squad(mut self, squad_id: DbId) -> Self {
        self.squad_id = Some(squad_id);
        self
    }

    pub fn with_position(mut self, position_id: DbId) -> Self {
        self.position_id = Some(position_id);
        self
    }

    pub fn with_application(mut self, application_id: DbId) -> Self {
        self.application_id = Some(application_id);
        self
    }
}
