//! Seams towards the services the engine relies on but does not implement:
//! where the vote records come from, and the assistant that comments on a
//! projection.

use std::error::Error;
use std::fmt::Display;

use crate::dataset::Dataset;
use crate::projection::ProjectionResult;

/// A recoverable failure of an external collaborator.
///
/// It is reported to the caller and never affects a dataset or a session.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CollaboratorFailure {
    pub collaborator: String,
    pub message: String,
}

impl CollaboratorFailure {
    pub fn new(collaborator: &str, message: impl Into<String>) -> CollaboratorFailure {
        CollaboratorFailure {
            collaborator: collaborator.to_string(),
            message: message.into(),
        }
    }
}

impl Error for CollaboratorFailure {}

impl Display for CollaboratorFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.collaborator, self.message)
    }
}

/// Provides the vote records, for one position or for all of them.
pub trait DatasetProvider {
    fn fetch(&self, position: Option<&str>) -> Result<Dataset, CollaboratorFailure>;
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CityContext {
    pub city: String,
    pub current_votes: u64,
    pub projected_votes: u64,
    pub multiplier: f64,
}

/// What the assistant is told about a projection.
#[derive(PartialEq, Debug, Clone)]
pub struct AssistantContext {
    pub candidate_number: String,
    pub candidate_name: String,
    pub party: String,
    pub position: String,
    pub scenario_name: String,
    pub current_votes: u64,
    pub projected_votes: u64,
    pub current_ranking: u32,
    pub projected_ranking: u32,
    pub goal_votes: u64,
    pub goal_progress: f64,
    pub cities: Vec<CityContext>,
    pub dataset_fingerprint: String,
}

impl AssistantContext {
    pub fn from_projection(
        projection: &ProjectionResult,
        scenario_name: &str,
        dataset_fingerprint: &str,
    ) -> AssistantContext {
        let c = &projection.candidate;
        AssistantContext {
            candidate_number: c.number.to_string(),
            candidate_name: c.name.clone(),
            party: c.party.clone(),
            position: c.position.clone(),
            scenario_name: scenario_name.to_string(),
            current_votes: projection.current_total_votes,
            projected_votes: projection.projected_total_votes,
            current_ranking: projection.current_ranking,
            projected_ranking: projection.projected_ranking,
            goal_votes: projection.goal_votes,
            goal_progress: projection.goal_progress,
            cities: projection
                .cities
                .iter()
                .map(|cp| CityContext {
                    city: cp.city.clone(),
                    current_votes: cp.current_votes,
                    projected_votes: cp.projected_votes,
                    multiplier: cp.multiplier,
                })
                .collect(),
            dataset_fingerprint: dataset_fingerprint.to_string(),
        }
    }
}

/// Comments on a projection in free text.
///
/// The answer is opaque to the engine. A failure is reported and nothing else.
pub trait AnalysisAssistant {
    fn analyze(
        &self,
        context: &AssistantContext,
        history: &[ConversationTurn],
    ) -> Result<String, CollaboratorFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::municipal;
    use crate::projection::recompute;
    use crate::EngineSettings;
    use std::collections::BTreeMap;

    struct Unreachable;

    impl AnalysisAssistant for Unreachable {
        fn analyze(
            &self,
            _context: &AssistantContext,
            _history: &[ConversationTurn],
        ) -> Result<String, CollaboratorFailure> {
            Err(CollaboratorFailure::new("assistant", "connection refused"))
        }
    }

    struct Fixture;

    impl DatasetProvider for Fixture {
        fn fetch(&self, position: Option<&str>) -> Result<Dataset, CollaboratorFailure> {
            match position {
                Some("Governor") => Err(CollaboratorFailure::new("fixture", "no such position")),
                _ => Ok(municipal()),
            }
        }
    }

    #[test]
    fn context_mirrors_the_projection() {
        let ds = municipal();
        let adj: BTreeMap<String, f64> = [("Riverside".to_string(), 1.2)].into_iter().collect();
        let p = recompute(&ds, "100", &adj, &EngineSettings::DEFAULT_SETTINGS).unwrap();
        let ctx = AssistantContext::from_projection(&p, "Custom adjustments", ds.fingerprint());
        assert_eq!(ctx.candidate_name, "Bruno");
        assert_eq!(ctx.party, "PB");
        assert_eq!(ctx.current_votes, 500);
        assert_eq!(ctx.projected_votes, 530);
        assert_eq!(ctx.cities.len(), 2);
        assert_eq!(ctx.cities[1].multiplier, 1.2);
    }

    #[test]
    fn failures_are_values() {
        let ds = Fixture.fetch(None).unwrap();
        let p = recompute(&ds, "050", &BTreeMap::new(), &EngineSettings::DEFAULT_SETTINGS).unwrap();
        let ctx = AssistantContext::from_projection(&p, "Baseline", ds.fingerprint());
        let turn = ConversationTurn {
            role: TurnRole::User,
            text: "How safe is the lead?".to_string(),
        };
        let err = Unreachable.analyze(&ctx, &[turn]).unwrap_err();
        assert_eq!(err.to_string(), "assistant failed: connection refused");
        assert!(Fixture.fetch(Some("Governor")).is_err());
    }
}
