// JSON rendering of the query results. Keys are camelCase.

use electoral_engine::aggregation::{GeographyTally, PartyTally, SectionTally, Summary, TopCandidate};
use electoral_engine::comparison::ComparisonResult;
use electoral_engine::insights::{CompetitorStanding, LeaderInsights, PerformanceMetrics, SectionVotes, ZoneShare};
use electoral_engine::projection::AdjustmentMode;
use electoral_engine::recommendations::Recommendation;
use serde_json::Map as JSMap;

use crate::app::*;

pub fn output_settings_to_json(os: &OutputSettings) -> JSValue {
    json!({
        "electionName": os.election_name,
        "electionDate": os.election_date,
        "jurisdiction": os.jurisdiction,
        "outputDirectory": os.output_directory,
    })
}

pub fn dataset_to_json(ds: &Dataset) -> JSValue {
    json!({
        "fingerprint": ds.fingerprint(),
        "records": ds.records().len(),
        "candidates": ds.candidates(None).len(),
        "positions": ds.positions(),
        "cities": ds.cities(),
    })
}

fn candidate_to_json(c: &Candidate) -> JSValue {
    json!({
        "number": c.number.as_str(),
        "name": c.name,
        "party": c.party,
        "position": c.position,
        "totalVotes": c.total_votes,
        "rank": c.rank,
    })
}

fn top_candidate_to_json(tc: &Option<TopCandidate>) -> JSValue {
    match tc {
        Some(t) => json!({
            "number": t.number.as_str(),
            "name": t.name,
            "party": t.party,
            "votes": t.votes,
        }),
        None => JSValue::Null,
    }
}

fn section_votes_to_json(sv: &Option<SectionVotes>) -> JSValue {
    match sv {
        Some(s) => json!({"zone": s.zone, "section": s.section, "totalVotes": s.total_votes}),
        None => JSValue::Null,
    }
}

pub fn summary_to_json(s: &Summary) -> JSValue {
    let by_position: Vec<JSValue> = s
        .by_position
        .iter()
        .map(|p| {
            json!({
                "position": p.position,
                "totalVotes": p.total_votes,
                "candidatesCount": p.candidates_count,
                "percentage": p.percentage,
            })
        })
        .collect();
    json!({
        "totalVotes": s.total_votes,
        "zonesCount": s.zones_count,
        "sectionsCount": s.sections_count,
        "byPosition": by_position,
    })
}

pub fn parties_to_json(parties: &[PartyTally]) -> JSValue {
    JSValue::Array(
        parties
            .iter()
            .map(|p| {
                json!({
                    "party": p.party,
                    "partyName": p.party_name,
                    "totalVotes": p.total_votes,
                    "candidatesCount": p.candidates_count,
                    "percentage": p.percentage,
                })
            })
            .collect(),
    )
}

pub fn ranking_to_json(ds: &Dataset, ranking: &[Candidate]) -> JSValue {
    JSValue::Array(
        ranking
            .iter()
            .map(|c| {
                let mut js = candidate_to_json(c);
                js["partyName"] = json!(ds.party_name(&c.party));
                js
            })
            .collect(),
    )
}

pub fn sections_to_json(sections: &[SectionTally]) -> JSValue {
    JSValue::Array(
        sections
            .iter()
            .map(|s| {
                json!({
                    "zone": s.zone,
                    "section": s.section,
                    "totalVotes": s.total_votes,
                    "candidatesCount": s.candidates_count,
                    "topCandidate": top_candidate_to_json(&s.top_candidate),
                })
            })
            .collect(),
    )
}

pub fn geography_to_json(dimension: GeographyDimension, units: &[GeographyTally]) -> JSValue {
    let units: Vec<JSValue> = units
        .iter()
        .map(|u| {
            json!({
                "unit": u.unit,
                "totalVotes": u.total_votes,
                "percentage": u.percentage,
                "zonesCount": u.zones_count,
                "sectionsCount": u.sections_count,
                "topCandidate": top_candidate_to_json(&u.top_candidate),
            })
        })
        .collect();
    json!({"dimension": dimension.label(), "units": units})
}

pub fn leaders_to_json(li: &LeaderInsights) -> JSValue {
    let by_zone: Vec<JSValue> = li
        .leaders_by_zone
        .iter()
        .map(|z| {
            json!({
                "zone": z.zone,
                "totalVotes": z.total_votes,
                "leader": top_candidate_to_json(&z.leader),
            })
        })
        .collect();
    json!({
        "totalVotes": li.total_votes,
        "topCandidate": li.top_candidate.as_ref().map(candidate_to_json),
        "runnerUp": li.runner_up.as_ref().map(candidate_to_json),
        "voteDifference": li.vote_difference,
        "percentageDifference": li.percentage_difference,
        "concentrationRate": li.concentration_rate,
        "topSection": section_votes_to_json(&li.top_section),
        "lowSection": section_votes_to_json(&li.low_section),
        "leadersByZone": by_zone,
    })
}

pub fn metrics_to_json(m: &PerformanceMetrics) -> JSValue {
    let c = &m.candidate;
    json!({
        "number": c.number.as_str(),
        "name": c.name,
        "party": c.party,
        "position": c.position,
        "totalVotes": c.total_votes,
        "rank": c.rank,
        "positionCandidates": m.position_candidates,
        "shareOfPosition": m.share_of_position,
        "zonesWithVotes": m.zones_with_votes,
        "sectionsWithVotes": m.sections_with_votes,
        "avgVotesPerZone": m.avg_votes_per_zone,
        "avgVotesPerSection": m.avg_votes_per_section,
        "voteConcentrationIndex": m.vote_concentration_index,
        "strongestZone": m.strongest_zone,
        "partyRank": m.party_rank,
        "partyCandidates": m.party_candidates,
        "votesNeededForNextRank": m.votes_needed_for_next_rank,
        "leadOverNext": m.lead_over_next,
        "goalVotes": m.goal_votes,
        "votesToGoal": m.votes_to_goal,
    })
}

pub fn zones_to_json(zones: &[ZoneShare]) -> JSValue {
    JSValue::Array(
        zones
            .iter()
            .map(|z| {
                json!({
                    "zone": z.zone,
                    "votes": z.votes,
                    "percentage": z.percentage,
                    "isStronghold": z.is_stronghold,
                })
            })
            .collect(),
    )
}

pub fn competitors_to_json(standings: &[CompetitorStanding]) -> JSValue {
    JSValue::Array(
        standings
            .iter()
            .map(|s| {
                json!({
                    "number": s.number.as_str(),
                    "name": s.name,
                    "party": s.party,
                    "votes": s.votes,
                    "difference": s.difference,
                    "status": s.status.label(),
                })
            })
            .collect(),
    )
}

pub fn recommendations_to_json(recs: &[Recommendation]) -> JSValue {
    JSValue::Array(
        recs.iter()
            .map(|r| {
                json!({
                    "rule": r.rule,
                    "category": r.category.label(),
                    "text": r.text,
                })
            })
            .collect(),
    )
}

pub fn comparison_to_json(cr: &ComparisonResult) -> JSValue {
    let units: Vec<JSValue> = cr
        .units
        .iter()
        .map(|u| {
            json!({
                "unit": u.unit,
                "votesA": u.votes_a,
                "votesB": u.votes_b,
                "winner": u.winner.tag(),
            })
        })
        .collect();
    json!({
        "candidateA": cr.candidate_a.as_ref().map(candidate_to_json),
        "candidateB": cr.candidate_b.as_ref().map(candidate_to_json),
        "dimension": cr.dimension.label(),
        "units": units,
        "totalA": cr.total_a,
        "totalB": cr.total_b,
        "overallWinner": cr.overall_winner.tag(),
        "unitsWonA": cr.units_won_a,
        "unitsWonB": cr.units_won_b,
        "ties": cr.ties,
    })
}

pub fn scenarios_to_json(scenarios: &[Scenario]) -> JSValue {
    JSValue::Array(
        scenarios
            .iter()
            .map(|s| {
                let mut adjustments: JSMap<String, JSValue> = JSMap::new();
                for (city, m) in s.adjustments.iter() {
                    adjustments.insert(city.clone(), json!(m));
                }
                json!({
                    "id": s.id,
                    "name": s.name,
                    "description": s.description,
                    "outlook": s.outlook.label(),
                    "adjustments": adjustments,
                })
            })
            .collect(),
    )
}

pub fn mode_label(mode: &AdjustmentMode) -> &'static str {
    match mode {
        AdjustmentMode::NamedScenario(_) => "namedScenario",
        AdjustmentMode::CustomAdjustments => "customAdjustments",
    }
}

pub fn projection_to_json(p: &ProjectionResult, mode: &AdjustmentMode, scenario_name: &str) -> JSValue {
    let cities: Vec<JSValue> = p
        .cities
        .iter()
        .map(|c| {
            json!({
                "city": c.city,
                "currentVotes": c.current_votes,
                "multiplier": c.multiplier,
                "projectedVotes": c.projected_votes,
                "difference": c.difference,
            })
        })
        .collect();
    json!({
        "candidate": candidate_to_json(&p.candidate),
        "mode": mode_label(mode),
        "scenarioName": scenario_name,
        "cities": cities,
        "currentTotalVotes": p.current_total_votes,
        "projectedTotalVotes": p.projected_total_votes,
        "voteDifference": p.vote_difference,
        "currentRanking": p.current_ranking,
        "projectedRanking": p.projected_ranking,
        "rankingChange": p.ranking_change,
        "goalVotes": p.goal_votes,
        "goalProgress": p.goal_progress,
        "votesToGoal": p.votes_to_goal,
    })
}

/// The message sent to the assistant: the projection context and the conversation so far.
pub fn assistant_request_to_json(ctx: &AssistantContext, history: &[ConversationTurn]) -> JSValue {
    let cities: Vec<JSValue> = ctx
        .cities
        .iter()
        .map(|c| {
            json!({
                "city": c.city,
                "currentVotes": c.current_votes,
                "projectedVotes": c.projected_votes,
                "multiplier": c.multiplier,
            })
        })
        .collect();
    let history: Vec<JSValue> = history
        .iter()
        .map(|t| json!({"role": t.role.label(), "text": t.text}))
        .collect();
    json!({
        "context": {
            "candidateNumber": ctx.candidate_number,
            "candidateName": ctx.candidate_name,
            "party": ctx.party,
            "position": ctx.position,
            "scenarioName": ctx.scenario_name,
            "currentVotes": ctx.current_votes,
            "projectedVotes": ctx.projected_votes,
            "currentRanking": ctx.current_ranking,
            "projectedRanking": ctx.projected_ranking,
            "goalVotes": ctx.goal_votes,
            "goalProgress": ctx.goal_progress,
            "cities": cities,
            "datasetFingerprint": ctx.dataset_fingerprint,
        },
        "history": history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use electoral_engine::comparison::compare;

    #[test]
    fn comparison_keys() {
        let mut builder = electoral_engine::builder::DatasetBuilder::new();
        for (number, votes) in [("10", 5), ("20", 5)] {
            builder
                .add_record(VoteRecord {
                    candidate_number: number.into(),
                    candidate_name: format!("C{}", number),
                    party: "P".to_string(),
                    position: "Mayor".to_string(),
                    zone: "1".to_string(),
                    section: "1".to_string(),
                    votes,
                    city: "Springfield".to_string(),
                    neighborhood: None,
                })
                .unwrap();
        }
        let ds = builder.build().unwrap();
        let js = comparison_to_json(&compare(&ds, "10", "20", GeographyDimension::City));
        assert_eq!(js["overallWinner"], json!(0));
        assert_eq!(js["ties"], json!(1));
        assert_eq!(js["units"][0]["votesA"], json!(5));
        assert_eq!(js["candidateB"]["name"], json!("C20"));
    }

    #[test]
    fn mode_labels() {
        assert_eq!(mode_label(&AdjustmentMode::CustomAdjustments), "customAdjustments");
        assert_eq!(
            mode_label(&AdjustmentMode::NamedScenario("baseline".to_string())),
            "namedScenario"
        );
    }
}
