//! Minimum-score tiers for open positions.
//!
//! Tier ids match the seed data (1-based) in the `score_tiers` lookup
//! table. "Meets tier" is `score >= threshold`, inclusive; a missing
//! score is treated as 0 everywhere.

/// A fixed minimum-score threshold a position can require.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoreTier {
    /// No minimum.
    Open = 1,
    Tier1400 = 2,
    Tier1500 = 3,
    Tier1600 = 4,
    Tier1700 = 5,
    Tier1800 = 6,
    Tier1900 = 7,
    Tier2000 = 8,
}

impl ScoreTier {
    /// Return the lookup-table id.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Resolve a lookup-table id back to a tier.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Open),
            2 => Some(Self::Tier1400),
            3 => Some(Self::Tier1500),
            4 => Some(Self::Tier1600),
            5 => Some(Self::Tier1700),
            6 => Some(Self::Tier1800),
            7 => Some(Self::Tier1900),
            8 => Some(Self::Tier2000),
            _ => None,
        }
    }

    /// The inclusive score threshold for this tier.
    pub fn minimum_score(self) -> i64 {
        match self {
            Self::Open => 0,
            Self::Tier1400 => 1400,
            Self::Tier1500 => 1500,
            Self::Tier1600 => 1600,
            Self::Tier1700 => 1700,
            Self::Tier1800 => 1800,
            Self::Tier1900 => 1900,
            Self::Tier2000 => 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ids_match_seed_data() {
        assert_eq!(ScoreTier::Open.id(), 1);
        assert_eq!(ScoreTier::Tier1400.id(), 2);
        assert_eq!(ScoreTier::Tier2000.id(), 8);
    }

    #[test]
    fn from_id_round_trips() {
        for id in 1..=8 {
            let tier = ScoreTier::from_id(id).expect("valid tier id");
            assert_eq!(tier.id(), id);
        }
        assert_eq!(ScoreTier::from_id(0), None);
        assert_eq!(ScoreTier::from_id(9), None);
    }

    #[test]
    fn thresholds_are_inclusive_bounds() {
        assert_eq!(ScoreTier::Open.minimum_score(), 0);
        assert_eq!(ScoreTier::Tier1400.minimum_score(), 1400);
        assert_eq!(ScoreTier::Tier2000.minimum_score(), 2000);
    }
}
