//! Eligibility evaluation for position applications.
//!
//! [`evaluate`] is a pure function over facts the workflow layer has
//! already gathered (membership and duplicate-application state from the
//! store, score and vouch state from the external collaborators). It is
//! invoked when an application is submitted AND again when it is
//! approved, because score or membership can change in between; approval
//! fails closed if eligibility has regressed.

use serde::Serialize;

use crate::error::EligibilityFailure;

/// What a position demands of a candidate.
#[derive(Debug, Clone, Copy)]
pub struct PositionRequirements {
    /// Inclusive minimum score; 0 means no minimum.
    pub min_score: i64,
    pub requires_mutual_vouch: bool,
}

/// Facts about a candidate at evaluation time.
///
/// `score` is the external reputation score; `None` (missing or the
/// lookup failed) is treated as 0. `has_mutual_vouch` must already carry
/// the fail-closed fallback: false when the vouch source was unreachable.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSnapshot {
    pub is_member: bool,
    pub has_active_application: bool,
    pub score: Option<i64>,
    pub has_mutual_vouch: bool,
}

/// Outcome of an eligibility evaluation, one independent boolean per
/// requirement plus the inputs needed for a precise failure message.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EligibilityResult {
    pub is_already_member: bool,
    pub has_existing_application: bool,
    pub meets_score_requirement: bool,
    pub meets_vouch_requirement: bool,
    pub eligible: bool,
    required_score: i64,
    effective_score: i64,
}

impl EligibilityResult {
    /// The most specific failure, or `None` when eligible.
    ///
    /// Ordering matters for user-facing messages: membership and
    /// duplicate-application problems are reported before score or vouch
    /// shortfalls.
    pub fn deny_reason(&self) -> Option<EligibilityFailure> {
        if self.is_already_member {
            Some(EligibilityFailure::AlreadyMember)
        } else if self.has_existing_application {
            Some(EligibilityFailure::DuplicateApplication)
        } else if !self.meets_score_requirement {
            Some(EligibilityFailure::ScoreBelowTier {
                required: self.required_score,
                actual: self.effective_score,
            })
        } else if !self.meets_vouch_requirement {
            Some(EligibilityFailure::VouchNotConfirmed)
        } else {
            None
        }
    }

    /// Fail with the most specific reason unless eligible.
    pub fn check(&self) -> Result<(), EligibilityFailure> {
        match self.deny_reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// Evaluate a candidate against a position's requirements. Read-only.
pub fn evaluate(
    requirements: &PositionRequirements,
    candidate: &CandidateSnapshot,
) -> EligibilityResult {
    let effective_score = candidate.score.unwrap_or(0);
    let meets_score_requirement = effective_score >= requirements.min_score;
    let meets_vouch_requirement =
        !requirements.requires_mutual_vouch || candidate.has_mutual_vouch;

    EligibilityResult {
        is_already_member: candidate.is_member,
        has_existing_application: candidate.has_active_application,
        meets_score_requirement,
        meets_vouch_requirement,
        eligible: !candidate.is_member
            && !candidate.has_active_application
            && meets_score_requirement
            && meets_vouch_requirement,
        required_score: requirements.min_score,
        effective_score,
    }
}
