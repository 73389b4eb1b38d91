//! What-if projections of a candidate's votes under per-city multipliers.
//!
//! [`recompute`] is a pure function of the dataset, the candidate and the
//! multipliers. [`SimulationSession`] holds the interactive state of one
//! simulation: the selected candidate, the multipliers being edited and whether
//! they still come from a named scenario.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::collaborators::AssistantContext;
use crate::config::*;
use crate::dataset::{standing_order, Dataset};
use crate::insights::goal_threshold;
use crate::scenarios::{clamp_multiplier, Scenario, ScenarioCatalog};

#[derive(PartialEq, Debug, Clone)]
pub struct CityProjection {
    pub city: String,
    pub current_votes: u64,
    /// The multiplier actually applied, after clamping.
    pub multiplier: f64,
    pub projected_votes: u64,
    pub difference: i64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ProjectionResult {
    pub candidate: Candidate,
    pub cities: Vec<CityProjection>,
    pub current_total_votes: u64,
    pub projected_total_votes: u64,
    pub vote_difference: i64,
    pub current_ranking: u32,
    pub projected_ranking: u32,
    /// Positive when the candidate climbs.
    pub ranking_change: i64,
    pub goal_votes: u64,
    /// Not capped: above 100 once the goal is passed.
    pub goal_progress: f64,
    pub votes_to_goal: u64,
}

/// The rank the candidate would hold with the given votes, all other
/// candidates of the position keeping their recorded totals.
fn standing_with(standings: &[Candidate], number: &CandidateNumber, votes: u64) -> u32 {
    let ahead = standings
        .iter()
        .filter(|c| c.number != *number)
        .filter(|c| standing_order(c.total_votes, &c.number, votes, number).is_lt())
        .count();
    (ahead + 1) as u32
}

/// Projects the votes of one candidate.
///
/// Each city's votes are multiplied by its (clamped) multiplier and rounded;
/// cities absent from `adjustments` keep a multiplier of 1.0. Only this
/// candidate's total moves: the goal is the current total of the candidate
/// holding the goal rank. Returns nothing for an unknown candidate.
pub fn recompute(
    data: &Dataset,
    number: &str,
    adjustments: &BTreeMap<String, f64>,
    settings: &EngineSettings,
) -> Option<ProjectionResult> {
    let candidate = match data.candidate(number) {
        Some(c) => c.clone(),
        None => {
            warn!("recompute: unknown candidate {:?}", number);
            return None;
        }
    };

    let mut city_votes: BTreeMap<&String, u64> = BTreeMap::new();
    for r in data.records_of(&candidate.number) {
        *city_votes.entry(&r.city).or_insert(0) += r.votes;
    }

    let cities: Vec<CityProjection> = city_votes
        .into_iter()
        .map(|(city, current)| {
            let multiplier = clamp_multiplier(adjustments.get(city).cloned().unwrap_or(1.0), settings);
            let projected = (current as f64 * multiplier).round() as u64;
            CityProjection {
                city: city.clone(),
                current_votes: current,
                multiplier,
                projected_votes: projected,
                difference: projected as i64 - current as i64,
            }
        })
        .collect();

    let current_total_votes: u64 = cities.iter().map(|c| c.current_votes).sum();
    let projected_total_votes: u64 = cities.iter().map(|c| c.projected_votes).sum();

    let standings = data.candidates(Some(candidate.position.as_str()));
    let current_ranking = standing_with(&standings, &candidate.number, current_total_votes);
    let projected_ranking = standing_with(&standings, &candidate.number, projected_total_votes);
    let goal_votes = goal_threshold(&standings, settings.goal_rank);
    let goal_progress = if goal_votes == 0 {
        100.0
    } else {
        projected_total_votes as f64 * 100.0 / goal_votes as f64
    };

    let res = ProjectionResult {
        candidate,
        cities,
        current_total_votes,
        projected_total_votes,
        vote_difference: projected_total_votes as i64 - current_total_votes as i64,
        current_ranking,
        projected_ranking,
        ranking_change: current_ranking as i64 - projected_ranking as i64,
        goal_votes,
        goal_progress,
        votes_to_goal: goal_votes.saturating_sub(projected_total_votes),
    };
    debug!(
        "recompute: {:?}: {:?} -> {:?} votes, rank {:?} -> {:?}, goal {:?} ({:.1}%)",
        number,
        res.current_total_votes,
        res.projected_total_votes,
        res.current_ranking,
        res.projected_ranking,
        res.goal_votes,
        res.goal_progress
    );
    Some(res)
}

/// Where the multipliers of a session come from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AdjustmentMode {
    /// Exactly the multipliers of the scenario with this id.
    NamedScenario(String),
    CustomAdjustments,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionState {
    Idle,
    CandidateSelected,
    ScenarioApplied,
    Adjusting,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AdjustDirection {
    Increase,
    Decrease,
}

/// The state of one interactive simulation.
///
/// A session belongs to a single user; simulations for other candidates use their
/// own sessions. The dataset is held as a shared snapshot: refreshing it swaps the
/// snapshot without affecting projections computed from the previous one.
pub struct SimulationSession {
    dataset: Arc<Dataset>,
    catalog: ScenarioCatalog,
    settings: EngineSettings,
    state: SessionState,
    candidate: Option<CandidateNumber>,
    adjustments: BTreeMap<String, f64>,
    mode: AdjustmentMode,
}

fn round_multiplier(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

impl SimulationSession {
    pub fn new(
        dataset: Arc<Dataset>,
        catalog: ScenarioCatalog,
        settings: EngineSettings,
    ) -> SimulationSession {
        SimulationSession {
            dataset,
            catalog,
            settings,
            state: SessionState::Idle,
            candidate: None,
            adjustments: BTreeMap::new(),
            mode: AdjustmentMode::CustomAdjustments,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn candidate(&self) -> Option<&CandidateNumber> {
        self.candidate.as_ref()
    }

    pub fn adjustments(&self) -> &BTreeMap<String, f64> {
        &self.adjustments
    }

    pub fn mode(&self) -> &AdjustmentMode {
        &self.mode
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    pub fn load_scenarios(&self) -> &[Scenario] {
        self.catalog.scenarios()
    }

    /// The display name of the multipliers in use.
    pub fn scenario_name(&self) -> String {
        match &self.mode {
            AdjustmentMode::NamedScenario(id) => self
                .catalog
                .get(id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.clone()),
            AdjustmentMode::CustomAdjustments => "Custom adjustments".to_string(),
        }
    }

    fn clear(&mut self) {
        self.adjustments.clear();
        self.mode = AdjustmentMode::CustomAdjustments;
    }

    /// Starts a new simulation for a candidate, dropping any previous multipliers.
    ///
    /// An unknown candidate leaves the session idle.
    pub fn select_candidate(&mut self, number: &str) -> bool {
        self.clear();
        match self.dataset.candidate(number) {
            Some(c) => {
                info!("select_candidate: {} ({})", c.number, c.name);
                self.candidate = Some(c.number.clone());
                self.state = SessionState::CandidateSelected;
                true
            }
            None => {
                warn!("select_candidate: unknown candidate {:?}", number);
                self.candidate = None;
                self.state = SessionState::Idle;
                false
            }
        }
    }

    /// Adopts the multipliers of a scenario for the candidate.
    ///
    /// Selecting another candidate than the current one restarts the simulation
    /// first. Nothing changes when the scenario or the candidate is unknown.
    pub fn apply_scenario(&mut self, number: &str, scenario_id: &str) -> bool {
        let scenario = match self.catalog.get(scenario_id) {
            Some(s) => s.clone(),
            None => {
                warn!("apply_scenario: unknown scenario {:?}", scenario_id);
                return false;
            }
        };
        if self.dataset.candidate(number).is_none() {
            warn!("apply_scenario: unknown candidate {:?}", number);
            return false;
        }
        let same_candidate = self.candidate.as_ref() == Some(&CandidateNumber::new(number));
        if !same_candidate && !self.select_candidate(number) {
            return false;
        }
        info!("apply_scenario: {} for {}", scenario.id, number);
        self.adjustments = scenario.adjustments;
        self.mode = AdjustmentMode::NamedScenario(scenario.id);
        self.state = SessionState::ScenarioApplied;
        true
    }

    /// Moves the multiplier of a city by one step, within the bounds.
    ///
    /// Returns the new multiplier, or nothing when no candidate is selected.
    pub fn adjust_city(&mut self, city: &str, direction: AdjustDirection) -> Option<f64> {
        let current = self.adjustments.get(city).cloned().unwrap_or(1.0);
        let step = match direction {
            AdjustDirection::Increase => self.settings.adjustment_step,
            AdjustDirection::Decrease => -self.settings.adjustment_step,
        };
        self.set_city_multiplier(city, current + step)
    }

    /// Sets the multiplier of a city, clamped to the bounds.
    pub fn set_city_multiplier(&mut self, city: &str, value: f64) -> Option<f64> {
        self.candidate.as_ref()?;
        let m = round_multiplier(clamp_multiplier(value, &self.settings));
        self.adjustments.insert(city.to_string(), m);
        self.mode = AdjustmentMode::CustomAdjustments;
        self.state = SessionState::Adjusting;
        debug!("set_city_multiplier: {} -> {}", city, m);
        Some(m)
    }

    /// Drops every multiplier, keeping the selected candidate.
    pub fn reset_adjustments(&mut self) {
        self.clear();
        if self.candidate.is_some() {
            self.state = SessionState::CandidateSelected;
        }
    }

    /// Replaces the dataset snapshot. The multipliers are dropped since the
    /// cities may have changed; the candidate is kept if it still exists.
    pub fn refresh_dataset(&mut self, dataset: Arc<Dataset>) {
        info!(
            "refresh_dataset: {} -> {}",
            self.dataset.fingerprint(),
            dataset.fingerprint()
        );
        self.dataset = dataset;
        match self.candidate.clone() {
            Some(c) => {
                self.select_candidate(c.as_str());
            }
            None => self.clear(),
        }
    }

    /// Projects the selected candidate with the current multipliers.
    pub fn recompute(&self) -> Option<ProjectionResult> {
        let snapshot = Arc::clone(&self.dataset);
        let number = self.candidate.as_ref()?;
        recompute(&snapshot, number.as_str(), &self.adjustments, &self.settings)
    }

    /// The context handed to the analysis assistant for the current projection.
    pub fn assistant_context(&self) -> Option<AssistantContext> {
        let projection = self.recompute()?;
        Some(AssistantContext::from_projection(
            &projection,
            self.scenario_name().as_str(),
            self.dataset.fingerprint(),
        ))
    }
}
