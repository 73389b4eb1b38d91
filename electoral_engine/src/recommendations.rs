//! Recommendations derived from a candidate's metrics.
//!
//! The rules form a fixed table evaluated in order. Each rule that applies
//! contributes one recommendation rendered from its template, so the same metrics
//! always produce the same list.

use log::debug;

use crate::config::*;
use crate::dataset::Dataset;
use crate::insights::{performance_metrics, zone_distribution, PerformanceMetrics, ZoneShare};

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RecommendationCategory {
    Defend,
    Focus,
    Qualify,
    Diversify,
    Expand,
}

impl RecommendationCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationCategory::Defend => "defend",
            RecommendationCategory::Focus => "focus",
            RecommendationCategory::Qualify => "qualify",
            RecommendationCategory::Diversify => "diversify",
            RecommendationCategory::Expand => "expand",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Recommendation {
    pub rule: &'static str,
    pub category: RecommendationCategory,
    pub text: String,
}

/// What the rules look at.
pub struct RecommendationInput<'a> {
    pub metrics: &'a PerformanceMetrics,
    pub zones: &'a [ZoneShare],
    pub settings: &'a EngineSettings,
}

impl<'a> RecommendationInput<'a> {
    fn name(&self) -> &str {
        self.metrics.candidate.name.as_str()
    }

    fn total(&self) -> u64 {
        self.metrics.candidate.total_votes
    }

    fn rank(&self) -> u32 {
        self.metrics.candidate.rank
    }

    fn strongholds(&self) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|z| z.is_stronghold)
            .map(|z| z.zone.as_str())
            .collect()
    }
}

struct RecommendationRule {
    id: &'static str,
    category: RecommendationCategory,
    applies: fn(&RecommendationInput) -> bool,
    render: fn(&RecommendationInput) -> String,
}

const RULES: [RecommendationRule; 8] = [
    RecommendationRule {
        id: "no-votes",
        category: RecommendationCategory::Focus,
        applies: |i| i.total() == 0,
        render: |i| {
            format!(
                "{} has no recorded votes yet: start from the sections where the party is strongest.",
                i.name()
            )
        },
    },
    RecommendationRule {
        id: "defend-lead",
        category: RecommendationCategory::Defend,
        applies: |i| i.total() > 0 && i.rank() == 1,
        render: |i| {
            format!(
                "{} leads {} by {} votes: consolidate turnout in zone {}.",
                i.name(),
                i.metrics.candidate.position,
                i.metrics.lead_over_next.unwrap_or(i.total()),
                i.metrics.strongest_zone.clone().unwrap_or_default()
            )
        },
    },
    RecommendationRule {
        id: "close-gap",
        category: RecommendationCategory::Focus,
        applies: |i| {
            i.total() > 0
                && i.rank() > 1
                && (i.metrics.votes_needed_for_next_rank as f64)
                    <= i.total() as f64 * i.settings.near_rank_margin_pct / 100.0
        },
        render: |i| {
            format!(
                "Only {} votes separate {} from rank {}: target the closest sections first.",
                i.metrics.votes_needed_for_next_rank,
                i.name(),
                i.rank() - 1
            )
        },
    },
    RecommendationRule {
        id: "enter-top",
        category: RecommendationCategory::Qualify,
        applies: |i| i.rank() > i.settings.goal_rank,
        render: |i| {
            format!(
                "{} is ranked {}: {} more votes are needed to reach the rank-{} threshold of {} votes.",
                i.name(),
                i.rank(),
                i.metrics.votes_to_goal,
                i.settings.goal_rank,
                i.metrics.goal_votes
            )
        },
    },
    RecommendationRule {
        id: "hold-top",
        category: RecommendationCategory::Qualify,
        applies: |i| i.total() > 0 && i.rank() > 1 && i.rank() <= i.settings.goal_rank,
        render: |i| {
            format!(
                "{} is inside the top {} with {} votes against a threshold of {}: protect the margin.",
                i.name(),
                i.settings.goal_rank,
                i.total(),
                i.metrics.goal_votes
            )
        },
    },
    RecommendationRule {
        id: "diversify",
        category: RecommendationCategory::Diversify,
        applies: |i| i.metrics.vote_concentration_index > i.settings.high_concentration_pct,
        render: |i| {
            format!(
                "{:.1}% of the votes come from zone {}: broaden the campaign to other zones.",
                i.metrics.vote_concentration_index,
                i.metrics.strongest_zone.clone().unwrap_or_default()
            )
        },
    },
    RecommendationRule {
        id: "build-stronghold",
        category: RecommendationCategory::Expand,
        applies: |i| i.total() > 0 && i.strongholds().is_empty(),
        render: |i| {
            format!(
                "No zone brings more than {}% of the votes: choose priority zones to build a stronghold.",
                i.settings.stronghold_threshold_pct
            )
        },
    },
    RecommendationRule {
        id: "expand-strongholds",
        category: RecommendationCategory::Expand,
        applies: |i| !i.strongholds().is_empty(),
        render: |i| {
            format!(
                "Zones {} are strongholds: use them as a base to reach neighbouring sections.",
                i.strongholds().join(", ")
            )
        },
    },
];

/// Evaluates the rule table against precomputed metrics.
pub fn evaluate_rules(input: &RecommendationInput) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter(|rule| (rule.applies)(input))
        .map(|rule| Recommendation {
            rule: rule.id,
            category: rule.category,
            text: (rule.render)(input),
        })
        .collect()
}

pub fn recommendations(
    data: &Dataset,
    number: &str,
    settings: &EngineSettings,
) -> Vec<Recommendation> {
    let metrics = match performance_metrics(data, number, settings) {
        Some(m) => m,
        None => return vec![],
    };
    let zones = zone_distribution(data, number, settings);
    let input = RecommendationInput {
        metrics: &metrics,
        zones: &zones,
        settings,
    };
    let res = evaluate_rules(&input);
    debug!(
        "recommendations: candidate {:?}: {:?}",
        number,
        res.iter().map(|r| r.rule).collect::<Vec<_>>()
    );
    res
}
