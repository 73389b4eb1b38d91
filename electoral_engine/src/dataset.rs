use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::*;

/// The immutable store of vote records for one session.
///
/// Candidates are rolled up once at construction. A refreshed dataset is a new
/// value: callers share it behind an `Arc` and swap the `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<VoteRecord>,
    candidates: BTreeMap<CandidateNumber, Candidate>,
    parties: BTreeMap<String, String>,
    fingerprint: String,
}

/// Orders two standings: more votes first, then the lower candidate number.
pub(crate) fn standing_order(
    votes_a: u64,
    number_a: &CandidateNumber,
    votes_b: u64,
    number_b: &CandidateNumber,
) -> Ordering {
    votes_b.cmp(&votes_a).then_with(|| number_a.cmp(number_b))
}

pub(crate) fn candidate_order(a: &Candidate, b: &Candidate) -> Ordering {
    standing_order(a.total_votes, &a.number, b.total_votes, &b.number)
}

/// The candidate with the most votes in a tally. Ties go to the lowest number.
/// Returns nothing when the tally holds no votes at all.
pub(crate) fn top_of(tally: &BTreeMap<CandidateNumber, u64>) -> Option<(&CandidateNumber, u64)> {
    let mut best: Option<(&CandidateNumber, u64)> = None;
    // BTreeMap iterates by ascending number: only a strictly larger count replaces.
    for (number, votes) in tally.iter() {
        match best {
            Some((_, best_votes)) if *votes <= best_votes => {}
            _ => best = Some((number, *votes)),
        }
    }
    best.filter(|(_, votes)| *votes > 0)
}

pub(crate) fn matches_position(record: &VoteRecord, position: Option<&str>) -> bool {
    position.map_or(true, |p| record.position == p)
}

impl Dataset {
    pub(crate) fn from_checked_records(
        records: Vec<VoteRecord>,
        parties: BTreeMap<String, String>,
    ) -> Dataset {
        let mut candidates: BTreeMap<CandidateNumber, Candidate> = BTreeMap::new();
        for r in records.iter() {
            let c = candidates
                .entry(r.candidate_number.clone())
                .or_insert_with(|| Candidate {
                    number: r.candidate_number.clone(),
                    name: r.candidate_name.clone(),
                    party: r.party.clone(),
                    position: r.position.clone(),
                    total_votes: 0,
                    rank: 0,
                });
            c.total_votes += r.votes;
        }

        // Ranks are assigned within each position.
        let mut by_position: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
        for c in candidates.values() {
            by_position
                .entry(c.position.clone())
                .or_default()
                .push(c.clone());
        }
        for (position, mut cands) in by_position {
            cands.sort_by(candidate_order);
            for (idx, c) in cands.iter().enumerate() {
                if let Some(stored) = candidates.get_mut(&c.number) {
                    stored.rank = (idx + 1) as u32;
                }
            }
            debug!("from_checked_records: position {:?}: {:?} candidates", position, cands.len());
        }

        let fingerprint = compute_fingerprint(&records);
        info!(
            "Dataset: {:?} records, {:?} candidates, fingerprint {}",
            records.len(),
            candidates.len(),
            fingerprint
        );
        Dataset {
            records,
            candidates,
            parties,
            fingerprint,
        }
    }

    pub fn records(&self) -> &[VoteRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records for one position, or all of them.
    pub fn records_for(&self, position: Option<&str>) -> impl Iterator<Item = &VoteRecord> + '_ {
        let position = position.map(|p| p.to_string());
        self.records
            .iter()
            .filter(move |r| matches_position(r, position.as_deref()))
    }

    pub fn records_of(&self, number: &CandidateNumber) -> impl Iterator<Item = &VoteRecord> + '_ {
        let number = number.clone();
        self.records
            .iter()
            .filter(move |r| r.candidate_number == number)
    }

    pub fn candidate(&self, number: &str) -> Option<&Candidate> {
        self.candidates.get(&CandidateNumber::new(number))
    }

    /// The candidates for one position (or all of them), in ranking order.
    pub fn candidates(&self, position: Option<&str>) -> Vec<Candidate> {
        let mut res: Vec<Candidate> = self
            .candidates
            .values()
            .filter(|c| position.map_or(true, |p| c.position == p))
            .cloned()
            .collect();
        res.sort_by(candidate_order);
        res
    }

    pub fn positions(&self) -> Vec<String> {
        let s: BTreeSet<&String> = self.records.iter().map(|r| &r.position).collect();
        s.into_iter().cloned().collect()
    }

    pub fn cities(&self) -> Vec<String> {
        let s: BTreeSet<&String> = self.records.iter().map(|r| &r.city).collect();
        s.into_iter().cloned().collect()
    }

    /// The full name of a party, or its code when it is not registered.
    pub fn party_name(&self, code: &str) -> String {
        self.parties
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// A SHA-256 digest of the records, identifying this snapshot of the data.
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.as_str()
    }
}

fn compute_fingerprint(records: &[VoteRecord]) -> String {
    let mut lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "{}|{}|{}|{}|{}|{}|{}|{}|{}",
                r.candidate_number,
                r.zone,
                r.section,
                r.votes,
                r.candidate_name,
                r.party,
                r.position,
                r.city,
                r.neighborhood.clone().unwrap_or_default()
            )
        })
        .collect();
    lines.sort();
    sha256::digest(lines.join("\n"))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::builder::DatasetBuilder;
    use crate::config::*;
    use crate::dataset::Dataset;

    /// Sends the library logs to the test output. Set `RUST_LOG=debug` to see them.
    pub fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        number: &str,
        name: &str,
        party: &str,
        position: &str,
        zone: &str,
        section: &str,
        votes: u64,
        city: &str,
        neighborhood: Option<&str>,
    ) -> VoteRecord {
        VoteRecord {
            candidate_number: number.into(),
            candidate_name: name.to_string(),
            party: party.to_string(),
            position: position.to_string(),
            zone: zone.to_string(),
            section: section.to_string(),
            votes,
            city: city.to_string(),
            neighborhood: neighborhood.map(|s| s.to_string()),
        }
    }

    /// Two cities, two zones, four sections.
    ///
    /// Councilor (2290 votes): 050 Ana 600, 100 Bruno 500, 120 Carla 500,
    /// 200 Davi 300, 210 Elisa 250, 300 Fabio 100, 310 Gil 40.
    /// Mayor (1400 votes): 11 Helena 700, 22 Igor 700.
    pub fn municipal() -> Dataset {
        init_logs();
        let c = "Councilor";
        let m = "Mayor";
        let rs = "Riverside";
        let hc = "Hillcrest";
        let records = vec![
            record("050", "Ana", "PA", c, "1", "1", 300, rs, Some("Centro")),
            record("050", "Ana", "PA", c, "1", "2", 200, rs, Some("Porto")),
            record("050", "Ana", "PA", c, "2", "3", 100, hc, Some("Alto")),
            record("100", "Bruno", "PB", c, "1", "1", 150, rs, Some("Centro")),
            record("100", "Bruno", "PB", c, "2", "3", 250, hc, Some("Alto")),
            record("100", "Bruno", "PB", c, "2", "4", 100, hc, None),
            record("120", "Carla", "PA", c, "1", "2", 250, rs, Some("Porto")),
            record("120", "Carla", "PA", c, "2", "4", 250, hc, None),
            record("200", "Davi", "PC", c, "1", "1", 100, rs, Some("Centro")),
            record("200", "Davi", "PC", c, "2", "3", 200, hc, Some("Alto")),
            record("210", "Elisa", "PB", c, "1", "2", 0, rs, Some("Porto")),
            record("210", "Elisa", "PB", c, "2", "4", 250, hc, None),
            record("300", "Fabio", "PC", c, "1", "1", 50, rs, Some("Centro")),
            record("300", "Fabio", "PC", c, "2", "4", 50, hc, None),
            record("310", "Gil", "PA", c, "2", "3", 40, hc, Some("Alto")),
            record("11", "Helena", "PA", m, "1", "1", 400, rs, Some("Centro")),
            record("11", "Helena", "PA", m, "2", "3", 300, hc, Some("Alto")),
            record("22", "Igor", "PB", m, "1", "1", 350, rs, Some("Centro")),
            record("22", "Igor", "PB", m, "2", "3", 350, hc, Some("Alto")),
        ];
        let mut builder = DatasetBuilder::new().parties(&[
            ("PA".to_string(), "Party of the Avenues".to_string()),
            ("PB".to_string(), "Bridge Party".to_string()),
        ]);
        builder.add_records(records).unwrap();
        builder.build().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{init_logs, municipal};
    use super::*;

    #[test]
    fn logs_can_be_set_up_by_every_test() {
        init_logs();
        init_logs();
        log::debug!("logs_can_be_set_up_by_every_test");
        assert_eq!(municipal().records().len(), 19);
    }

    #[test]
    fn candidates_are_ranked_within_their_position() {
        let ds = municipal();
        let ranks: Vec<(String, u32, u64)> = ds
            .candidates(Some("Councilor"))
            .iter()
            .map(|c| (c.number.to_string(), c.rank, c.total_votes))
            .collect();
        assert_eq!(
            ranks,
            vec![
                ("050".to_string(), 1, 600),
                ("100".to_string(), 2, 500),
                ("120".to_string(), 3, 500),
                ("200".to_string(), 4, 300),
                ("210".to_string(), 5, 250),
                ("300".to_string(), 6, 100),
                ("310".to_string(), 7, 40),
            ]
        );
        assert_eq!(ds.candidate("11").unwrap().rank, 1);
        assert_eq!(ds.candidate("22").unwrap().rank, 2);
    }

    #[test]
    fn metadata_accessors() {
        let ds = municipal();
        assert_eq!(ds.positions(), vec!["Councilor", "Mayor"]);
        assert_eq!(ds.cities(), vec!["Hillcrest", "Riverside"]);
        assert_eq!(ds.party_name("PB"), "Bridge Party");
        assert_eq!(ds.party_name("PC"), "PC");
        assert!(ds.candidate("999").is_none());
        assert_eq!(ds.records_for(Some("Mayor")).count(), 4);
        assert_eq!(ds.records_for(Some("Governor")).count(), 0);
    }

    #[test]
    fn fingerprint_ignores_record_order() {
        let ds = municipal();
        let mut reversed: Vec<VoteRecord> = ds.records().to_vec();
        reversed.reverse();
        let ds2 = Dataset::from_checked_records(reversed, BTreeMap::new());
        assert_eq!(ds.fingerprint(), ds2.fingerprint());
        assert_eq!(ds.fingerprint().len(), 64);
    }

    #[test]
    fn top_of_prefers_lowest_number_on_ties() {
        let mut tally: BTreeMap<CandidateNumber, u64> = BTreeMap::new();
        tally.insert("210".into(), 250);
        tally.insert("120".into(), 250);
        tally.insert("300".into(), 50);
        assert_eq!(top_of(&tally), Some((&CandidateNumber::new("120"), 250)));
        let empty: BTreeMap<CandidateNumber, u64> = BTreeMap::new();
        assert_eq!(top_of(&empty), None);
    }
}
