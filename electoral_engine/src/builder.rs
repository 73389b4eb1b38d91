use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

pub use crate::config::*;
use crate::dataset::Dataset;

/// A builder for assembling a dataset out of vote records.
///
/// The builder checks that every (candidate, zone, section) is recorded only once
/// and that a candidate number always comes with the same name, party and position.
///
/// ```
/// use electoral_engine::builder::DatasetBuilder;
/// use electoral_engine::VoteRecord;
/// # use electoral_engine::EngineErrors;
///
/// let mut builder = DatasetBuilder::new()
///     .parties(&[("PA".to_string(), "Party A".to_string())]);
///
/// builder.add_record(VoteRecord {
///     candidate_number: "10".into(),
///     candidate_name: "Anna".to_string(),
///     party: "PA".to_string(),
///     position: "Mayor".to_string(),
///     zone: "1".to_string(),
///     section: "12".to_string(),
///     votes: 42,
///     city: "Springfield".to_string(),
///     neighborhood: None,
/// })?;
///
/// let dataset = builder.build()?;
/// assert_eq!(dataset.candidate("10").map(|c| c.total_votes), Some(42));
///
/// # Ok::<(), EngineErrors>(())
/// ```
#[derive(Default)]
pub struct DatasetBuilder {
    pub(crate) _records: Vec<VoteRecord>,
    pub(crate) _parties: BTreeMap<String, String>,
    _keys: HashSet<(CandidateNumber, String, String)>,
    _identities: HashMap<CandidateNumber, (String, String, String)>,
}

impl DatasetBuilder {
    pub fn new() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    /// Registers the full names of the parties, keyed by their code.
    pub fn parties(self, parties: &[(String, String)]) -> DatasetBuilder {
        let mut _parties = self._parties;
        for (code, name) in parties {
            _parties.insert(code.clone(), name.clone());
        }
        DatasetBuilder { _parties, ..self }
    }

    pub fn add_record(&mut self, record: VoteRecord) -> Result<(), EngineErrors> {
        let key = (
            record.candidate_number.clone(),
            record.zone.clone(),
            record.section.clone(),
        );
        if self._keys.contains(&key) {
            return Err(EngineErrors::DuplicateRecord {
                candidate: record.candidate_number.to_string(),
                zone: record.zone,
                section: record.section,
            });
        }

        let identity = (
            record.candidate_name.clone(),
            record.party.clone(),
            record.position.clone(),
        );
        match self._identities.get(&record.candidate_number) {
            Some(known) if *known != identity => {
                return Err(EngineErrors::InconsistentCandidate {
                    candidate: record.candidate_number.to_string(),
                });
            }
            Some(_) => {}
            None => {
                self._identities
                    .insert(record.candidate_number.clone(), identity);
            }
        }

        self._keys.insert(key);
        self._records.push(record);
        Ok(())
    }

    pub fn add_records(&mut self, records: Vec<VoteRecord>) -> Result<(), EngineErrors> {
        for r in records {
            self.add_record(r)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Dataset, EngineErrors> {
        debug!(
            "build: {:?} records, {:?} candidates, {:?} parties",
            self._records.len(),
            self._identities.len(),
            self._parties.len()
        );
        Ok(Dataset::from_checked_records(self._records, self._parties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: &str, name: &str, zone: &str, section: &str, votes: u64) -> VoteRecord {
        VoteRecord {
            candidate_number: number.into(),
            candidate_name: name.to_string(),
            party: "PA".to_string(),
            position: "Mayor".to_string(),
            zone: zone.to_string(),
            section: section.to_string(),
            votes,
            city: "Springfield".to_string(),
            neighborhood: None,
        }
    }

    #[test]
    fn duplicate_records_are_rejected() {
        let mut builder = DatasetBuilder::new();
        builder.add_record(record("10", "Anna", "1", "1", 5)).unwrap();
        let err = builder.add_record(record("10", "Anna", "1", "1", 7));
        assert_eq!(
            err,
            Err(EngineErrors::DuplicateRecord {
                candidate: "10".to_string(),
                zone: "1".to_string(),
                section: "1".to_string()
            })
        );
        // Same section in another zone is a different record.
        builder.add_record(record("10", "Anna", "2", "1", 7)).unwrap();
        let ds = builder.build().unwrap();
        assert_eq!(ds.candidate("10").unwrap().total_votes, 12);
    }

    #[test]
    fn candidate_identity_must_be_stable() {
        let mut builder = DatasetBuilder::new();
        builder.add_record(record("10", "Anna", "1", "1", 5)).unwrap();
        let err = builder.add_record(record("10", "Bob", "1", "2", 5));
        assert_eq!(
            err,
            Err(EngineErrors::InconsistentCandidate {
                candidate: "10".to_string()
            })
        );
    }
}
