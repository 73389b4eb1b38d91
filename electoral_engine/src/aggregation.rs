//! Tallies of the recorded votes along positions, parties and geography.
//!
//! Every function here is a pure read over a [`Dataset`]. A filter that matches
//! nothing yields zeroed or empty results.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::*;
use crate::dataset::{candidate_order, matches_position, top_of, Dataset};

#[derive(PartialEq, Debug, Clone)]
pub struct PositionSummary {
    pub position: String,
    pub total_votes: u64,
    pub candidates_count: usize,
    pub percentage: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Summary {
    pub total_votes: u64,
    pub zones_count: usize,
    /// Sections are counted as distinct (zone, section) pairs.
    pub sections_count: usize,
    pub by_position: Vec<PositionSummary>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PartyTally {
    pub party: String,
    pub party_name: String,
    pub total_votes: u64,
    pub candidates_count: usize,
    pub percentage: f64,
}

/// The candidate with the most votes within some unit.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TopCandidate {
    pub number: CandidateNumber,
    pub name: String,
    pub party: String,
    pub votes: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SectionTally {
    pub zone: String,
    pub section: String,
    pub total_votes: u64,
    pub candidates_count: usize,
    pub top_candidate: Option<TopCandidate>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GeographyTally {
    pub unit: String,
    pub total_votes: u64,
    pub percentage: f64,
    pub zones_count: usize,
    pub sections_count: usize,
    pub top_candidate: Option<TopCandidate>,
}

pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub(crate) fn to_top_candidate(
    data: &Dataset,
    tally: &BTreeMap<CandidateNumber, u64>,
) -> Option<TopCandidate> {
    let (number, votes) = top_of(tally)?;
    let c = data.candidate(number.as_str())?;
    Some(TopCandidate {
        number: c.number.clone(),
        name: c.name.clone(),
        party: c.party.clone(),
        votes,
    })
}

pub fn summarize(data: &Dataset, position: Option<&str>) -> Summary {
    let mut total_votes: u64 = 0;
    let mut zones: BTreeSet<&String> = BTreeSet::new();
    let mut sections: BTreeSet<(&String, &String)> = BTreeSet::new();
    let mut positions: BTreeMap<&String, (u64, BTreeSet<&CandidateNumber>)> = BTreeMap::new();
    for r in data.records_for(position) {
        total_votes += r.votes;
        zones.insert(&r.zone);
        sections.insert((&r.zone, &r.section));
        let e = positions.entry(&r.position).or_default();
        e.0 += r.votes;
        e.1.insert(&r.candidate_number);
    }

    let by_position = positions
        .into_iter()
        .map(|(p, (votes, cands))| PositionSummary {
            position: p.clone(),
            total_votes: votes,
            candidates_count: cands.len(),
            percentage: percentage(votes, total_votes),
        })
        .collect();

    info!(
        "summarize: position {:?}: {:?} votes in {:?} zones, {:?} sections",
        position,
        total_votes,
        zones.len(),
        sections.len()
    );
    Summary {
        total_votes,
        zones_count: zones.len(),
        sections_count: sections.len(),
        by_position,
    }
}

/// The votes per party, largest first. Percentages are relative to the
/// filtered total.
pub fn by_party(data: &Dataset, position: Option<&str>) -> Vec<PartyTally> {
    let mut parties: BTreeMap<&String, (u64, BTreeSet<&CandidateNumber>)> = BTreeMap::new();
    let mut total: u64 = 0;
    for r in data.records_for(position) {
        let e = parties.entry(&r.party).or_default();
        e.0 += r.votes;
        e.1.insert(&r.candidate_number);
        total += r.votes;
    }
    let mut res: Vec<PartyTally> = parties
        .into_iter()
        .map(|(party, (votes, cands))| PartyTally {
            party: party.clone(),
            party_name: data.party_name(party),
            total_votes: votes,
            candidates_count: cands.len(),
            percentage: percentage(votes, total),
        })
        .collect();
    // Stable sort: equal totals keep the alphabetical order of the party codes.
    res.sort_by(|a, b| b.total_votes.cmp(&a.total_votes));
    debug!("by_party: position {:?}: {:?} parties", position, res.len());
    res
}

/// The candidates by decreasing votes, ties going to the lower number.
///
/// The rank of each returned candidate is its 1-based place in this list.
pub fn ranking(data: &Dataset, position: Option<&str>, limit: Option<usize>) -> Vec<Candidate> {
    let mut cands = data.candidates(position);
    cands.sort_by(candidate_order);
    let mut res: Vec<Candidate> = Vec::new();
    for (idx, mut c) in cands.into_iter().enumerate() {
        if limit.map_or(false, |l| idx >= l) {
            break;
        }
        c.rank = (idx + 1) as u32;
        res.push(c);
    }
    res
}

/// One row per (zone, section), ordered by zone then section.
pub fn by_section(data: &Dataset, zone: Option<&str>, position: Option<&str>) -> Vec<SectionTally> {
    let mut sections: BTreeMap<(&String, &String), BTreeMap<CandidateNumber, u64>> = BTreeMap::new();
    for r in data
        .records_for(position)
        .filter(|r| zone.map_or(true, |z| r.zone == z))
    {
        let tally = sections.entry((&r.zone, &r.section)).or_default();
        *tally.entry(r.candidate_number.clone()).or_insert(0) += r.votes;
    }
    sections
        .into_iter()
        .map(|((z, s), tally)| SectionTally {
            zone: z.clone(),
            section: s.clone(),
            total_votes: tally.values().sum(),
            candidates_count: tally.len(),
            top_candidate: to_top_candidate(data, &tally),
        })
        .collect()
}

/// The votes per geographic unit, largest first (ties by unit name).
pub fn by_geography(
    data: &Dataset,
    dimension: GeographyDimension,
    position: Option<&str>,
) -> Vec<GeographyTally> {
    #[derive(Default)]
    struct Acc<'a> {
        tally: BTreeMap<CandidateNumber, u64>,
        zones: BTreeSet<&'a String>,
        sections: BTreeSet<(&'a String, &'a String)>,
    }

    let mut units: BTreeMap<String, Acc> = BTreeMap::new();
    let mut total: u64 = 0;
    for r in data.records().iter().filter(|r| matches_position(r, position)) {
        let acc = units.entry(dimension.unit_of(r)).or_default();
        *acc.tally.entry(r.candidate_number.clone()).or_insert(0) += r.votes;
        acc.zones.insert(&r.zone);
        acc.sections.insert((&r.zone, &r.section));
        total += r.votes;
    }

    let mut res: Vec<GeographyTally> = units
        .into_iter()
        .map(|(unit, acc)| {
            let votes: u64 = acc.tally.values().sum();
            GeographyTally {
                unit,
                total_votes: votes,
                percentage: percentage(votes, total),
                zones_count: acc.zones.len(),
                sections_count: acc.sections.len(),
                top_candidate: to_top_candidate(data, &acc.tally),
            }
        })
        .collect();
    res.sort_by(|a, b| b.total_votes.cmp(&a.total_votes));
    debug!(
        "by_geography: {} / {:?}: {:?} units",
        dimension.label(),
        position,
        res.len()
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DatasetBuilder;
    use crate::dataset::fixtures::{municipal, record};

    #[test]
    fn summary_counts_zones_and_sections() {
        let ds = municipal();
        let s = summarize(&ds, None);
        assert_eq!(s.total_votes, 3690);
        assert_eq!(s.zones_count, 2);
        assert_eq!(s.sections_count, 4);
        assert_eq!(s.by_position.len(), 2);
        assert_eq!(s.by_position[0].position, "Councilor");
        assert_eq!(s.by_position[0].total_votes, 2290);
        assert_eq!(s.by_position[0].candidates_count, 7);
        assert_eq!(s.by_position[1].total_votes, 1400);

        let m = summarize(&ds, Some("Mayor"));
        assert_eq!(m.total_votes, 1400);
        assert_eq!(m.sections_count, 2);
        assert_eq!(m.by_position[0].percentage, 100.0);
    }

    #[test]
    fn unmatched_filter_gives_zero_summary() {
        let ds = municipal();
        let s = summarize(&ds, Some("Governor"));
        assert_eq!(
            s,
            Summary {
                total_votes: 0,
                zones_count: 0,
                sections_count: 0,
                by_position: vec![]
            }
        );
        assert!(by_party(&ds, Some("Governor")).is_empty());
        assert!(ranking(&ds, Some("Governor"), None).is_empty());
    }

    #[test]
    fn party_totals_add_up_to_summary() {
        let ds = municipal();
        for p in [None, Some("Councilor"), Some("Mayor")] {
            let parties = by_party(&ds, p);
            let sum: u64 = parties.iter().map(|pt| pt.total_votes).sum();
            assert_eq!(sum, summarize(&ds, p).total_votes);
        }
        let parties = by_party(&ds, Some("Councilor"));
        let rows: Vec<(&str, u64, usize)> = parties
            .iter()
            .map(|p| (p.party.as_str(), p.total_votes, p.candidates_count))
            .collect();
        assert_eq!(rows, vec![("PA", 1140, 3), ("PB", 750, 2), ("PC", 400, 2)]);
        assert_eq!(parties[0].party_name, "Party of the Avenues");
        assert_eq!(parties[2].party_name, "PC");
        assert!((parties[0].percentage - 1140.0 / 2290.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn ranking_breaks_ties_by_number() {
        let mut builder = DatasetBuilder::new();
        builder
            .add_record(record("100", "Zed", "PB", "Mayor", "1", "1", 500, "A", None))
            .unwrap();
        builder
            .add_record(record("050", "Amy", "PA", "Mayor", "1", "1", 500, "A", None))
            .unwrap();
        let ds = builder.build().unwrap();
        let r = ranking(&ds, None, None);
        assert_eq!(r[0].number.as_str(), "050");
        assert_eq!(r[0].rank, 1);
        assert_eq!(r[1].number.as_str(), "100");
        assert_eq!(r[1].rank, 2);
    }

    #[test]
    fn ranking_is_stable_and_limited() {
        let ds = municipal();
        let first = ranking(&ds, Some("Councilor"), Some(3));
        assert_eq!(first, ranking(&ds, Some("Councilor"), Some(3)));
        let numbers: Vec<&str> = first.iter().map(|c| c.number.as_str()).collect();
        assert_eq!(numbers, vec!["050", "100", "120"]);

        // Without a position the ranks run across the whole list.
        let all = ranking(&ds, None, None);
        assert_eq!(all.len(), 9);
        assert_eq!(all[0].number.as_str(), "11");
        assert_eq!(all[1].number.as_str(), "22");
        assert_eq!(all[1].rank, 2);
        assert_eq!(all[2].number.as_str(), "050");
    }

    #[test]
    fn sections_pick_lowest_number_on_tied_top() {
        let ds = municipal();
        let rows = by_section(&ds, Some("2"), Some("Councilor"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].section, "3");
        assert_eq!(rows[0].total_votes, 590);
        assert_eq!(rows[0].top_candidate.as_ref().unwrap().name, "Bruno");
        // Carla (120) and Elisa (210) both have 250 votes in section 4.
        assert_eq!(rows[1].total_votes, 650);
        assert_eq!(rows[1].candidates_count, 4);
        assert_eq!(rows[1].top_candidate.as_ref().unwrap().name, "Carla");

        let all = by_section(&ds, None, None);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].top_candidate.as_ref().unwrap().name, "Helena");
        assert!(by_section(&ds, Some("99"), None).is_empty());
    }

    #[test]
    fn geography_by_city_and_neighborhood() {
        let ds = municipal();
        let cities = by_geography(&ds, GeographyDimension::City, Some("Councilor"));
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].unit, "Hillcrest");
        assert_eq!(cities[0].total_votes, 1240);
        assert_eq!(cities[0].zones_count, 1);
        assert_eq!(cities[0].sections_count, 2);
        assert_eq!(cities[0].top_candidate.as_ref().unwrap().name, "Bruno");
        assert_eq!(cities[1].unit, "Riverside");
        assert_eq!(cities[1].total_votes, 1050);
        assert_eq!(cities[1].top_candidate.as_ref().unwrap().name, "Ana");
        let pct: f64 = cities.iter().map(|c| c.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-9);

        let hoods = by_geography(&ds, GeographyDimension::Neighborhood, Some("Councilor"));
        let units: Vec<(&str, u64)> = hoods.iter().map(|h| (h.unit.as_str(), h.total_votes)).collect();
        assert_eq!(
            units,
            vec![
                ("Hillcrest", 650),
                ("Riverside/Centro", 600),
                ("Hillcrest/Alto", 590),
                ("Riverside/Porto", 450)
            ]
        );
    }

    #[test]
    fn same_neighborhood_name_in_two_cities() {
        let mut builder = DatasetBuilder::new();
        builder
            .add_records(vec![
                record("10", "Ana", "PA", "Mayor", "1", "1", 100, "Northport", Some("Centro")),
                record("10", "Ana", "PA", "Mayor", "2", "1", 200, "Southport", Some("Centro")),
            ])
            .unwrap();
        let ds = builder.build().unwrap();
        let hoods = by_geography(&ds, GeographyDimension::Neighborhood, None);
        let units: Vec<(&str, u64, usize)> = hoods
            .iter()
            .map(|h| (h.unit.as_str(), h.total_votes, h.zones_count))
            .collect();
        assert_eq!(
            units,
            vec![("Southport/Centro", 200, 1), ("Northport/Centro", 100, 1)]
        );
    }

    #[test]
    fn geography_by_zone() {
        let ds = municipal();
        let zones = by_geography(&ds, GeographyDimension::Zone, Some("Mayor"));
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].unit, "1");
        assert_eq!(zones[0].total_votes, 750);
        assert_eq!(zones[0].sections_count, 1);
        assert_eq!(zones[0].top_candidate.as_ref().unwrap().name, "Helena");
        assert_eq!(zones[1].unit, "2");
        assert_eq!(zones[1].total_votes, 650);
        assert_eq!(zones[1].top_candidate.as_ref().unwrap().name, "Igor");
    }

    #[test]
    fn section_without_votes_has_no_top_candidate() {
        let mut builder = DatasetBuilder::new();
        builder
            .add_records(vec![
                record("10", "Ana", "PA", "Mayor", "1", "1", 0, "Northport", None),
                record("20", "Bia", "PB", "Mayor", "1", "1", 0, "Northport", None),
                record("10", "Ana", "PA", "Mayor", "1", "2", 5, "Northport", None),
            ])
            .unwrap();
        let ds = builder.build().unwrap();
        let rows = by_section(&ds, None, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_votes, 0);
        assert_eq!(rows[0].candidates_count, 2);
        assert!(rows[0].top_candidate.is_none());
        assert_eq!(rows[1].top_candidate.as_ref().unwrap().name, "Ana");
        let cities = by_geography(&ds, GeographyDimension::City, None);
        assert_eq!(cities[0].top_candidate.as_ref().unwrap().votes, 5);
    }
}
