use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

use crate::aggregation::{percentage, round1, to_top_candidate, TopCandidate};
use crate::config::*;
use crate::dataset::{candidate_order, Dataset};

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionVotes {
    pub zone: String,
    pub section: String,
    pub total_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ZoneLeader {
    pub zone: String,
    pub total_votes: u64,
    /// Nobody leads a zone without votes.
    pub leader: Option<TopCandidate>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct LeaderInsights {
    pub total_votes: u64,
    pub top_candidate: Option<Candidate>,
    pub runner_up: Option<Candidate>,
    pub vote_difference: u64,
    /// The vote difference as a share of the filtered total, one decimal.
    pub percentage_difference: f64,
    /// Share of the filtered total going to the three best placed candidates.
    pub concentration_rate: f64,
    pub top_section: Option<SectionVotes>,
    pub low_section: Option<SectionVotes>,
    pub leaders_by_zone: Vec<ZoneLeader>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PerformanceMetrics {
    pub candidate: Candidate,
    pub position_candidates: usize,
    pub share_of_position: f64,
    pub zones_with_votes: usize,
    pub sections_with_votes: usize,
    pub avg_votes_per_zone: f64,
    pub avg_votes_per_section: f64,
    /// Share of the candidate's votes coming from its strongest zone.
    pub vote_concentration_index: f64,
    pub strongest_zone: Option<String>,
    pub party_rank: u32,
    pub party_candidates: usize,
    pub votes_needed_for_next_rank: u64,
    /// The margin over the next lower ranked candidate, if any.
    pub lead_over_next: Option<u64>,
    pub goal_votes: u64,
    pub votes_to_goal: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ZoneShare {
    pub zone: String,
    pub votes: u64,
    pub percentage: f64,
    pub is_stronghold: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CompetitorStatus {
    /// The competitor is the candidate itself.
    Itself,
    /// The candidate is placed ahead of the competitor.
    Ahead,
    Behind,
}

impl CompetitorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CompetitorStatus::Itself => "self",
            CompetitorStatus::Ahead => "ahead",
            CompetitorStatus::Behind => "behind",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CompetitorStanding {
    pub number: CandidateNumber,
    pub name: String,
    pub party: String,
    pub votes: u64,
    /// The candidate's votes minus the competitor's.
    pub difference: i64,
    pub status: CompetitorStatus,
}

/// The votes needed to hold the goal rank: those of its current holder, or of
/// the last candidate when fewer candidates run.
pub(crate) fn goal_threshold(standings: &[Candidate], goal_rank: u32) -> u64 {
    let idx = (goal_rank.max(1) as usize) - 1;
    standings
        .get(idx)
        .or_else(|| standings.last())
        .map(|c| c.total_votes)
        .unwrap_or(0)
}

pub fn leader_insights(data: &Dataset, position: Option<&str>) -> LeaderInsights {
    let standings = data.candidates(position);
    let total_votes: u64 = standings.iter().map(|c| c.total_votes).sum();
    let top_candidate = standings.first().cloned();
    let runner_up = standings.get(1).cloned();
    let vote_difference = match (&top_candidate, &runner_up) {
        (Some(t), Some(r)) => t.total_votes - r.total_votes,
        (Some(t), None) => t.total_votes,
        _ => 0,
    };
    let top3: u64 = standings.iter().take(3).map(|c| c.total_votes).sum();

    let mut sections: BTreeMap<(&String, &String), u64> = BTreeMap::new();
    let mut zones: BTreeMap<&String, BTreeMap<CandidateNumber, u64>> = BTreeMap::new();
    for r in data.records_for(position) {
        *sections.entry((&r.zone, &r.section)).or_insert(0) += r.votes;
        *zones
            .entry(&r.zone)
            .or_default()
            .entry(r.candidate_number.clone())
            .or_insert(0) += r.votes;
    }

    // Sections are visited in (zone, section) order: the first extreme wins ties.
    let mut top_section: Option<SectionVotes> = None;
    let mut low_section: Option<SectionVotes> = None;
    for ((z, s), votes) in sections.iter() {
        let sv = SectionVotes {
            zone: (*z).clone(),
            section: (*s).clone(),
            total_votes: *votes,
        };
        if top_section.as_ref().map_or(true, |t| *votes > t.total_votes) {
            top_section = Some(sv.clone());
        }
        if low_section.as_ref().map_or(true, |l| *votes < l.total_votes) {
            low_section = Some(sv);
        }
    }

    let leaders_by_zone: Vec<ZoneLeader> = zones
        .iter()
        .map(|(zone, tally)| ZoneLeader {
            zone: (*zone).clone(),
            total_votes: tally.values().sum(),
            leader: to_top_candidate(data, tally),
        })
        .collect();

    info!(
        "leader_insights: position {:?}: {:?} candidates, {:?} zones",
        position,
        standings.len(),
        leaders_by_zone.len()
    );
    LeaderInsights {
        total_votes,
        top_candidate,
        runner_up,
        vote_difference,
        percentage_difference: round1(percentage(vote_difference, total_votes)),
        concentration_rate: round1(percentage(top3, total_votes)),
        top_section,
        low_section,
        leaders_by_zone,
    }
}

pub fn performance_metrics(
    data: &Dataset,
    number: &str,
    settings: &EngineSettings,
) -> Option<PerformanceMetrics> {
    let candidate = match data.candidate(number) {
        Some(c) => c.clone(),
        None => {
            warn!("performance_metrics: unknown candidate {:?}", number);
            return None;
        }
    };

    let mut zones: BTreeMap<&String, u64> = BTreeMap::new();
    let mut sections: BTreeSet<(&String, &String)> = BTreeSet::new();
    for r in data.records_of(&candidate.number) {
        *zones.entry(&r.zone).or_insert(0) += r.votes;
        if r.votes > 0 {
            sections.insert((&r.zone, &r.section));
        }
    }
    let zones_with_votes = zones.values().filter(|v| **v > 0).count();
    let total = candidate.total_votes;
    let avg = |count: usize| {
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    };

    let mut strongest: Option<(&String, u64)> = None;
    for (zone, votes) in zones.iter() {
        if *votes > 0 && strongest.map_or(true, |(_, best)| *votes > best) {
            strongest = Some((*zone, *votes));
        }
    }

    let standings = data.candidates(Some(candidate.position.as_str()));
    let position_total: u64 = standings.iter().map(|c| c.total_votes).sum();
    let idx = standings
        .iter()
        .position(|c| c.number == candidate.number)
        .unwrap_or(0);
    let votes_needed_for_next_rank = match idx.checked_sub(1).and_then(|i| standings.get(i)) {
        Some(above) => (above.total_votes + 1).saturating_sub(total),
        None => 0,
    };
    let lead_over_next = standings
        .get(idx + 1)
        .map(|below| total - below.total_votes);

    let mut same_party: Vec<&Candidate> = standings
        .iter()
        .filter(|c| c.party == candidate.party)
        .collect();
    same_party.sort_by(|a, b| candidate_order(a, b));
    let party_rank = same_party
        .iter()
        .position(|c| c.number == candidate.number)
        .map(|i| (i + 1) as u32)
        .unwrap_or(1);

    let goal_votes = goal_threshold(&standings, settings.goal_rank);

    let res = PerformanceMetrics {
        position_candidates: standings.len(),
        share_of_position: percentage(total, position_total),
        zones_with_votes,
        sections_with_votes: sections.len(),
        avg_votes_per_zone: avg(zones_with_votes),
        avg_votes_per_section: avg(sections.len()),
        vote_concentration_index: strongest.map_or(0.0, |(_, v)| percentage(v, total)),
        strongest_zone: strongest.map(|(z, _)| z.clone()),
        party_rank,
        party_candidates: same_party.len(),
        votes_needed_for_next_rank,
        lead_over_next,
        goal_votes,
        votes_to_goal: goal_votes.saturating_sub(total),
        candidate,
    };
    debug!("performance_metrics: {:?}", res);
    Some(res)
}

/// The candidate's votes per zone, largest first.
pub fn zone_distribution(data: &Dataset, number: &str, settings: &EngineSettings) -> Vec<ZoneShare> {
    let candidate = match data.candidate(number) {
        Some(c) => c,
        None => return vec![],
    };
    let mut zones: BTreeMap<&String, u64> = BTreeMap::new();
    for r in data.records_of(&candidate.number) {
        *zones.entry(&r.zone).or_insert(0) += r.votes;
    }
    let mut res: Vec<ZoneShare> = zones
        .into_iter()
        .map(|(zone, votes)| {
            let pct = percentage(votes, candidate.total_votes);
            ZoneShare {
                zone: zone.clone(),
                votes,
                percentage: pct,
                is_stronghold: pct > settings.stronghold_threshold_pct,
            }
        })
        .collect();
    res.sort_by(|a, b| b.votes.cmp(&a.votes));
    res
}

/// Places the candidate against each known competitor, in the order given.
pub fn competitor_comparison(
    data: &Dataset,
    number: &str,
    competitors: &[String],
) -> Vec<CompetitorStanding> {
    let candidate = match data.candidate(number) {
        Some(c) => c,
        None => return vec![],
    };
    let mut res: Vec<CompetitorStanding> = Vec::new();
    for cnum in competitors {
        let other = match data.candidate(cnum) {
            Some(o) => o,
            None => {
                warn!("competitor_comparison: skipping unknown competitor {:?}", cnum);
                continue;
            }
        };
        let status = if other.number == candidate.number {
            CompetitorStatus::Itself
        } else if candidate_order(candidate, other).is_lt() {
            CompetitorStatus::Ahead
        } else {
            CompetitorStatus::Behind
        };
        res.push(CompetitorStanding {
            number: other.number.clone(),
            name: other.name.clone(),
            party: other.party.clone(),
            votes: other.total_votes,
            difference: candidate.total_votes as i64 - other.total_votes as i64,
            status,
        });
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::municipal;

    const S: EngineSettings = EngineSettings::DEFAULT_SETTINGS;

    #[test]
    fn leader_insights_for_councilors() {
        let ds = municipal();
        let li = leader_insights(&ds, Some("Councilor"));
        assert_eq!(li.total_votes, 2290);
        assert_eq!(li.top_candidate.unwrap().name, "Ana");
        assert_eq!(li.runner_up.unwrap().name, "Bruno");
        assert_eq!(li.vote_difference, 100);
        assert_eq!(li.percentage_difference, 4.4);
        assert_eq!(li.concentration_rate, 69.9);
        assert_eq!(
            li.top_section,
            Some(SectionVotes {
                zone: "2".to_string(),
                section: "4".to_string(),
                total_votes: 650
            })
        );
        assert_eq!(li.low_section.unwrap().section, "2");
        let leaders: Vec<(String, String)> = li
            .leaders_by_zone
            .iter()
            .map(|z| (z.zone.clone(), z.leader.clone().unwrap().name))
            .collect();
        assert_eq!(
            leaders,
            vec![
                ("1".to_string(), "Ana".to_string()),
                ("2".to_string(), "Bruno".to_string())
            ]
        );
    }

    #[test]
    fn leader_insights_on_empty_scope() {
        let ds = municipal();
        let li = leader_insights(&ds, Some("Governor"));
        assert_eq!(li.total_votes, 0);
        assert!(li.top_candidate.is_none());
        assert_eq!(li.percentage_difference, 0.0);
        assert!(li.top_section.is_none());
        assert!(li.leaders_by_zone.is_empty());
    }

    #[test]
    fn metrics_for_the_leader() {
        let ds = municipal();
        let m = performance_metrics(&ds, "050", &S).unwrap();
        assert_eq!(m.candidate.rank, 1);
        assert_eq!(m.zones_with_votes, 2);
        assert_eq!(m.sections_with_votes, 3);
        assert_eq!(m.avg_votes_per_zone, 300.0);
        assert_eq!(m.avg_votes_per_section, 200.0);
        assert!((m.vote_concentration_index - 500.0 / 6.0).abs() < 1e-9);
        assert_eq!(m.strongest_zone.as_deref(), Some("1"));
        assert_eq!(m.party_rank, 1);
        assert_eq!(m.party_candidates, 3);
        assert_eq!(m.votes_needed_for_next_rank, 0);
        assert_eq!(m.lead_over_next, Some(100));
        assert_eq!(m.goal_votes, 250);
        assert_eq!(m.votes_to_goal, 0);
    }

    #[test]
    fn metrics_for_trailing_candidates() {
        let ds = municipal();
        // Tied with Bruno but placed after him: one vote is enough.
        let carla = performance_metrics(&ds, "120", &S).unwrap();
        assert_eq!(carla.candidate.rank, 3);
        assert_eq!(carla.votes_needed_for_next_rank, 1);
        assert_eq!(carla.party_rank, 2);

        let gil = performance_metrics(&ds, "310", &S).unwrap();
        assert_eq!(gil.votes_needed_for_next_rank, 61);
        assert_eq!(gil.party_rank, 3);
        assert_eq!(gil.votes_to_goal, 210);
        assert_eq!(gil.lead_over_next, None);

        // A section with zero votes does not count.
        let elisa = performance_metrics(&ds, "210", &S).unwrap();
        assert_eq!(elisa.sections_with_votes, 1);
        assert_eq!(elisa.zones_with_votes, 1);
        assert_eq!(elisa.avg_votes_per_zone, 250.0);

        assert!(performance_metrics(&ds, "999", &S).is_none());
    }

    #[test]
    fn zone_distribution_marks_strongholds() {
        let ds = municipal();
        let zones = zone_distribution(&ds, "050", &S);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone, "1");
        assert_eq!(zones[0].votes, 500);
        assert!(zones[0].is_stronghold);
        assert!(!zones[1].is_stronghold);

        let loose = EngineSettings {
            stronghold_threshold_pct: 10.0,
            ..EngineSettings::DEFAULT_SETTINGS
        };
        assert!(zone_distribution(&ds, "050", &loose)[1].is_stronghold);
        assert!(zone_distribution(&ds, "999", &S).is_empty());
    }

    #[test]
    fn competitors_are_labelled() {
        let ds = municipal();
        let res = competitor_comparison(
            &ds,
            "100",
            &[
                "050".to_string(),
                "100".to_string(),
                "120".to_string(),
                "999".to_string(),
            ],
        );
        let rows: Vec<(&str, i64, &str)> = res
            .iter()
            .map(|c| (c.number.as_str(), c.difference, c.status.label()))
            .collect();
        assert_eq!(
            rows,
            vec![("050", -100, "behind"), ("100", 0, "self"), ("120", 0, "ahead")]
        );
        assert!(competitor_comparison(&ds, "999", &["050".to_string()]).is_empty());
    }

    #[test]
    fn goal_threshold_with_few_candidates() {
        let ds = municipal();
        let mayors = ds.candidates(Some("Mayor"));
        assert_eq!(goal_threshold(&mayors, 5), 700);
        assert_eq!(goal_threshold(&[], 5), 0);
    }
}
