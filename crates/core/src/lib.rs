//! Pure domain logic for the squad recruitment core.
//!
//! No I/O lives here: eligibility evaluation, score tiers, squad size
//! rules, the creation quota, the error taxonomy, and the collaborator
//! ports the workflow layer injects implementations for.

pub mod eligibility;
pub mod error;
pub mod external;
pub mod limits;
pub mod quota;
pub mod tiers;
pub mod types;
