// ********* Input data structures ***********

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::Display;

/// The number under which a candidate runs.
///
/// Numbers are kept as text because official numbers carry leading zeros ("050").
/// Purely numeric numbers are ordered by value, so "9" comes before "10" and
/// "050" before "100". Numbers with other characters are ordered as text,
/// after all the numeric ones.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CandidateNumber(pub String);

impl CandidateNumber {
    pub fn new(number: &str) -> CandidateNumber {
        CandidateNumber(number.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_digit())
    }
}

impl Ord for CandidateNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_numeric(), other.is_numeric()) {
            (true, true) => {
                let a = self.0.trim_start_matches('0');
                let b = other.0.trim_start_matches('0');
                a.len()
                    .cmp(&b.len())
                    .then_with(|| a.cmp(b))
                    .then_with(|| self.0.cmp(&other.0))
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CandidateNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for CandidateNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CandidateNumber {
    fn from(s: &str) -> Self {
        CandidateNumber::new(s)
    }
}

/// The votes received by one candidate in one section of one zone.
///
/// There is at most one record per (candidate number, zone, section).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub candidate_number: CandidateNumber,
    pub candidate_name: String,
    pub party: String,
    pub position: String,
    pub zone: String,
    pub section: String,
    pub votes: u64,
    pub city: String,
    /// Not every source reports neighborhoods. Records without one are
    /// grouped under their city when tallying by neighborhood.
    pub neighborhood: Option<String>,
}

// ******** Derived data structures *********

/// A candidate, rolled up from its vote records.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub number: CandidateNumber,
    pub name: String,
    pub party: String,
    pub position: String,
    pub total_votes: u64,
    /// 1-based rank among the candidates for the same position.
    pub rank: u32,
}

/// The geographic dimensions along which votes can be grouped.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum GeographyDimension {
    Zone,
    /// A section is only unique within its zone, so the unit is the pair.
    Section,
    /// Neighborhood names repeat across cities, so the unit is `city/neighborhood`.
    /// Records without a neighborhood are grouped under their city alone.
    Neighborhood,
    City,
}

impl GeographyDimension {
    /// The name of the unit a record belongs to along this dimension.
    pub fn unit_of(&self, record: &VoteRecord) -> String {
        match self {
            GeographyDimension::Zone => record.zone.clone(),
            GeographyDimension::Section => format!("{}/{}", record.zone, record.section),
            GeographyDimension::Neighborhood => match record.neighborhood.as_deref() {
                Some(n) if !n.is_empty() => format!("{}/{}", record.city, n),
                _ => record.city.clone(),
            },
            GeographyDimension::City => record.city.clone(),
        }
    }

    pub fn parse(s: &str) -> Option<GeographyDimension> {
        match s.trim().to_lowercase().as_str() {
            "zone" => Some(GeographyDimension::Zone),
            "section" => Some(GeographyDimension::Section),
            "neighborhood" | "neighbourhood" => Some(GeographyDimension::Neighborhood),
            "city" => Some(GeographyDimension::City),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GeographyDimension::Zone => "zone",
            GeographyDimension::Section => "section",
            GeographyDimension::Neighborhood => "neighborhood",
            GeographyDimension::City => "city",
        }
    }
}

/// Errors that prevent a dataset or a scenario catalog from being built.
///
/// Queries never fail: unknown identifiers give empty results instead.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum EngineErrors {
    DuplicateRecord {
        candidate: String,
        zone: String,
        section: String,
    },
    InconsistentCandidate {
        candidate: String,
    },
    InvalidScenarioCatalog {
        scenario: String,
        reason: String,
    },
    InvalidSettings {
        reason: String,
    },
}

impl Error for EngineErrors {}

impl Display for EngineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrors::DuplicateRecord {
                candidate,
                zone,
                section,
            } => write!(
                f,
                "Duplicate vote record for candidate {} in zone {} section {}",
                candidate, zone, section
            ),
            EngineErrors::InconsistentCandidate { candidate } => write!(
                f,
                "Candidate {} appears with different name, party or position",
                candidate
            ),
            EngineErrors::InvalidScenarioCatalog { scenario, reason } => {
                write!(f, "Invalid scenario {}: {}", scenario, reason)
            }
            EngineErrors::InvalidSettings { reason } => write!(f, "Invalid settings: {}", reason),
        }
    }
}

// ********* Configuration **********

/// Tunable constants of the insight and projection computations.
#[derive(PartialEq, Debug, Clone)]
pub struct EngineSettings {
    /// A zone is a stronghold when it brings more than this share (in percent)
    /// of a candidate's votes.
    pub stronghold_threshold_pct: f64,
    /// The change applied to a city multiplier by one adjustment.
    pub adjustment_step: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    /// The rank whose holder sets the qualification target of a projection.
    pub goal_rank: u32,
    /// A candidate is "close" to the next rank when the missing votes are
    /// within this share (in percent) of its own total.
    pub near_rank_margin_pct: f64,
    /// Above this share (in percent) coming from a single zone, the votes are
    /// considered too concentrated.
    pub high_concentration_pct: f64,
}

impl EngineSettings {
    pub const DEFAULT_SETTINGS: EngineSettings = EngineSettings {
        stronghold_threshold_pct: 20.0,
        adjustment_step: 0.05,
        min_multiplier: 0.5,
        max_multiplier: 1.5,
        goal_rank: 5,
        near_rank_margin_pct: 5.0,
        high_concentration_pct: 50.0,
    };

    /// Checks that the multiplier bounds surround 1.0, the step is positive and
    /// the goal rank starts at 1.
    pub fn validate(&self) -> Result<(), EngineErrors> {
        let invalid = |reason: String| Err(EngineErrors::InvalidSettings { reason });
        let bounded = self.min_multiplier > 0.0
            && self.min_multiplier <= 1.0
            && self.max_multiplier >= 1.0
            && self.max_multiplier.is_finite();
        if !bounded {
            return invalid(format!(
                "multiplier bounds must surround 1.0, got {} - {}",
                self.min_multiplier, self.max_multiplier
            ));
        }
        if !(self.adjustment_step > 0.0 && self.adjustment_step.is_finite()) {
            return invalid(format!(
                "the adjustment step must be positive, got {}",
                self.adjustment_step
            ));
        }
        if self.goal_rank == 0 {
            return invalid("the goal rank starts at 1".to_string());
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings::DEFAULT_SETTINGS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_candidate_numbers_order_by_value() {
        let mut numbers: Vec<CandidateNumber> = ["100", "050", "9", "10", "A1"]
            .iter()
            .map(|s| CandidateNumber::new(s))
            .collect();
        numbers.sort();
        let sorted: Vec<&str> = numbers.iter().map(|n| n.as_str()).collect();
        assert_eq!(sorted, vec!["9", "10", "050", "100", "A1"]);
    }

    #[test]
    fn settings_validation() {
        assert_eq!(EngineSettings::DEFAULT_SETTINGS.validate(), Ok(()));
        let inverted = EngineSettings {
            min_multiplier: 1.5,
            max_multiplier: 0.5,
            ..EngineSettings::DEFAULT_SETTINGS
        };
        assert!(matches!(
            inverted.validate(),
            Err(EngineErrors::InvalidSettings { .. })
        ));
        let no_step = EngineSettings {
            adjustment_step: 0.0,
            ..EngineSettings::DEFAULT_SETTINGS
        };
        assert!(no_step.validate().is_err());
        let no_goal = EngineSettings {
            goal_rank: 0,
            ..EngineSettings::DEFAULT_SETTINGS
        };
        assert_eq!(
            no_goal.validate().unwrap_err().to_string(),
            "Invalid settings: the goal rank starts at 1"
        );
    }

    #[test]
    fn neighborhood_falls_back_to_city() {
        let r = VoteRecord {
            candidate_number: "10".into(),
            candidate_name: "Ana".to_string(),
            party: "P1".to_string(),
            position: "Mayor".to_string(),
            zone: "1".to_string(),
            section: "7".to_string(),
            votes: 3,
            city: "Springfield".to_string(),
            neighborhood: None,
        };
        assert_eq!(GeographyDimension::Neighborhood.unit_of(&r), "Springfield");
        assert_eq!(GeographyDimension::Section.unit_of(&r), "1/7");
        let named = VoteRecord {
            neighborhood: Some("Springfield".to_string()),
            ..r
        };
        assert_eq!(
            GeographyDimension::Neighborhood.unit_of(&named),
            "Springfield/Springfield"
        );
        assert_eq!(GeographyDimension::parse("City"), Some(GeographyDimension::City));
        assert_eq!(GeographyDimension::parse("state"), None);
    }
}
