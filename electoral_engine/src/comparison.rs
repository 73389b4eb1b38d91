use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{info, warn};

use crate::config::*;
use crate::dataset::Dataset;

/// Which of the two compared candidates won a unit (or the whole comparison).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Winner {
    Tie,
    First,
    Second,
}

impl Winner {
    fn from_votes(a: u64, b: u64) -> Winner {
        match a.cmp(&b) {
            Ordering::Greater => Winner::First,
            Ordering::Less => Winner::Second,
            Ordering::Equal => Winner::Tie,
        }
    }

    /// 1 for the first candidate, 2 for the second, 0 for a tie.
    pub fn tag(&self) -> u8 {
        match self {
            Winner::Tie => 0,
            Winner::First => 1,
            Winner::Second => 2,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnitComparison {
    pub unit: String,
    pub votes_a: u64,
    pub votes_b: u64,
    pub winner: Winner,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ComparisonResult {
    pub candidate_a: Option<Candidate>,
    pub candidate_b: Option<Candidate>,
    pub dimension: GeographyDimension,
    pub units: Vec<UnitComparison>,
    pub total_a: u64,
    pub total_b: u64,
    pub overall_winner: Winner,
    /// Ties count for neither side.
    pub units_won_a: usize,
    pub units_won_b: usize,
    pub ties: usize,
}

/// Compares two candidates unit by unit along a geographic dimension.
///
/// Every unit where either candidate has a record is listed, in unit order; a
/// candidate without a record in the unit counts zero votes there. An unknown
/// candidate counts zero everywhere.
pub fn compare(
    data: &Dataset,
    number_a: &str,
    number_b: &str,
    dimension: GeographyDimension,
) -> ComparisonResult {
    let candidate_a = data.candidate(number_a).cloned();
    let candidate_b = data.candidate(number_b).cloned();
    if candidate_a.is_none() {
        warn!("compare: unknown candidate {:?}", number_a);
    }
    if candidate_b.is_none() {
        warn!("compare: unknown candidate {:?}", number_b);
    }

    let mut units: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    if let Some(a) = &candidate_a {
        for r in data.records_of(&a.number) {
            units.entry(dimension.unit_of(r)).or_default().0 += r.votes;
        }
    }
    if let Some(b) = &candidate_b {
        for r in data.records_of(&b.number) {
            units.entry(dimension.unit_of(r)).or_default().1 += r.votes;
        }
    }

    let units: Vec<UnitComparison> = units
        .into_iter()
        .map(|(unit, (votes_a, votes_b))| UnitComparison {
            unit,
            votes_a,
            votes_b,
            winner: Winner::from_votes(votes_a, votes_b),
        })
        .collect();
    let total_a: u64 = units.iter().map(|u| u.votes_a).sum();
    let total_b: u64 = units.iter().map(|u| u.votes_b).sum();
    let count = |w: Winner| units.iter().filter(|u| u.winner == w).count();
    let (units_won_a, units_won_b, ties) = (
        count(Winner::First),
        count(Winner::Second),
        count(Winner::Tie),
    );

    info!(
        "compare: {:?} vs {:?} by {}: {:?} units, {:?} - {:?}",
        number_a,
        number_b,
        dimension.label(),
        units.len(),
        total_a,
        total_b
    );
    ComparisonResult {
        candidate_a,
        candidate_b,
        dimension,
        overall_winner: Winner::from_votes(total_a, total_b),
        units,
        total_a,
        total_b,
        units_won_a,
        units_won_b,
        ties,
    }
}
