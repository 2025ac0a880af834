//! Status and role enums mapping to INTEGER lookup tables.
//!
//! Each enum variant's discriminant matches the seed data (1-based) in
//! the corresponding lookup table. Status enums carry their transition
//! tables; every transition site matches exhaustively, so adding a
//! variant forces a review of each one.

/// Lookup-table id type.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database lookup id.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a lookup id back to a variant.
            pub fn from_id(id: StatusId) -> Option<Self> {
                $(
                    if id == $val {
                        return Some(Self::$variant);
                    }
                )+
                None
            }

            /// The seed-data name for this variant.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Role a member fills within a squad.
    SquadRole {
        Trader = 1 => "trader",
        Analyst = 2 => "analyst",
        Scout = 3 => "scout",
        Support = 4 => "support",
    }
}

define_status_enum! {
    /// Invite lifecycle status. `Pending` is the only non-terminal state.
    InviteStatus {
        Pending = 1 => "pending",
        Accepted = 2 => "accepted",
        Declined = 3 => "declined",
        Expired = 4 => "expired",
        Cancelled = 5 => "cancelled",
    }
}

impl InviteStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Accepted | Self::Declined | Self::Expired | Self::Cancelled
            ),
            Self::Accepted | Self::Declined | Self::Expired | Self::Cancelled => false,
        }
    }
}

define_status_enum! {
    /// Application lifecycle status. `Pending` is the only non-terminal state.
    ApplicationStatus {
        Pending = 1 => "pending",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
        Withdrawn = 4 => "withdrawn",
        Expired = 5 => "expired",
    }
}

impl ApplicationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::Approved | Self::Rejected | Self::Withdrawn | Self::Expired
            ),
            Self::Approved | Self::Rejected | Self::Withdrawn | Self::Expired => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_match_seed_data() {
        assert_eq!(SquadRole::Trader.id(), 1);
        assert_eq!(SquadRole::Analyst.id(), 2);
        assert_eq!(SquadRole::Scout.id(), 3);
        assert_eq!(SquadRole::Support.id(), 4);
    }

    #[test]
    fn invite_status_ids_match_seed_data() {
        assert_eq!(InviteStatus::Pending.id(), 1);
        assert_eq!(InviteStatus::Accepted.id(), 2);
        assert_eq!(InviteStatus::Declined.id(), 3);
        assert_eq!(InviteStatus::Expired.id(), 4);
        assert_eq!(InviteStatus::Cancelled.id(), 5);
    }

    #[test]
    fn application_status_ids_match_seed_data() {
        assert_eq!(ApplicationStatus::Pending.id(), 1);
        assert_eq!(ApplicationStatus::Approved.id(), 2);
        assert_eq!(ApplicationStatus::Rejected.id(), 3);
        assert_eq!(ApplicationStatus::Withdrawn.id(), 4);
        assert_eq!(ApplicationStatus::Expired.id(), 5);
    }

    #[test]
    fn from_id_round_trips() {
        for id in 1..=5 {
            assert_eq!(InviteStatus::from_id(id).unwrap().id(), id);
            assert_eq!(ApplicationStatus::from_id(id).unwrap().id(), id);
        }
        assert_eq!(InviteStatus::from_id(0), None);
        assert_eq!(ApplicationStatus::from_id(6), None);
    }

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!InviteStatus::Pending.is_terminal());
        assert!(InviteStatus::Accepted.is_terminal());
        assert!(InviteStatus::Cancelled.is_terminal());

        assert!(!ApplicationStatus::Pending.is_terminal());
        assert!(ApplicationStatus::Withdrawn.is_terminal());
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        assert!(InviteStatus::Pending.can_transition_to(InviteStatus::Accepted));
        assert!(!InviteStatus::Accepted.can_transition_to(InviteStatus::Declined));
        assert!(!InviteStatus::Expired.can_transition_to(InviteStatus::Pending));

        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Approved));
        assert!(!ApplicationStatus::Approved.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Rejected.can_transition_to(ApplicationStatus::Pending));
    }
}
