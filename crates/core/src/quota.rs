//! Squad-creation quota.
//!
//! The quota is a step function of the user's external reputation score.
//! A missing score always yields the base quota of one squad.

use serde::Serialize;

/// How many squads a user may have created, given their current count.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SquadQuota {
    pub can_create: bool,
    pub current_count: i64,
    pub max_allowed: i64,
}

/// Maximum number of squads a user may create for a given score.
pub fn max_squads_for_score(score: Option<i64>) -> i64 {
    match score {
        None => 1,
        Some(s) if s >= 2000 => 5,
        Some(s) if s >= 1800 => 3,
        Some(s) if s >= 1500 => 2,
        Some(_) => 1,
    }
}

/// Build the quota payload for a user.
pub fn squad_quota(score: Option<i64>, current_count: i64) -> SquadQuota {
    let max_allowed = max_squads_for_score(score);
    SquadQuota {
        can_create: current_count < max_allowed,
        current_count,
        max_allowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_score_gets_base_quota() {
        assert_eq!(max_squads_for_score(None), 1);
    }

    #[test]
    fn quota_steps_are_inclusive() {
        assert_eq!(max_squads_for_score(Some(1499)), 1);
        assert_eq!(max_squads_for_score(Some(1500)), 2);
        assert_eq!(max_squads_for_score(Some(1799)), 2);
        assert_eq!(max_squads_for_score(Some(1800)), 3);
        assert_eq!(max_squads_for_score(Some(1999)), 3);
        assert_eq!(max_squads_for_score(Some(2000)), 5);
    }

    #[test]
    fn can_create_compares_against_current_count() {
        let quota = squad_quota(Some(1500), 1);
        assert!(quota.can_create);
        assert_eq!(quota.max_allowed, 2);

        let quota = squad_quota(Some(1500), 2);
        assert!(!quota.can_create);

        let quota = squad_quota(None, 1);
        assert!(!quota.can_create);
    }
}
