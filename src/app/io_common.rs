// Record layout shared by the file readers.

use std::path::Path;

use crate::app::*;

/// The columns of a vote record file, in the order of the CSV header.
pub const COLUMNS: [&str; 9] = [
    "candidateNumber",
    "candidateName",
    "party",
    "position",
    "zone",
    "section",
    "votes",
    "city",
    "neighborhood",
];

/// One row of a vote record file, before validation.
#[derive(PartialEq, Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "candidateNumber")]
    pub candidate_number: String,
    #[serde(rename = "candidateName")]
    pub candidate_name: String,
    pub party: String,
    #[serde(default)]
    pub position: Option<String>,
    pub zone: String,
    pub section: String,
    pub votes: u64,
    pub city: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|x| x.trim().to_string()).filter(|x| !x.is_empty())
}

impl RawRecord {
    /// Validates the row. Records without a position take the one of their source.
    pub fn vote_record(
        self,
        source: &DatasetSource,
        path: &str,
        lineno: u64,
    ) -> AppResult<VoteRecord> {
        let invalid = |reason: &'static str| InvalidRecordSnafu {
            path,
            lineno,
            reason,
        };
        let position = non_empty(self.position)
            .or_else(|| non_empty(source.position.clone()))
            .context(invalid("no position"))?;
        let candidate_number = non_empty(Some(self.candidate_number)).context(invalid("no candidate number"))?;
        let zone = non_empty(Some(self.zone)).context(invalid("no zone"))?;
        let section = non_empty(Some(self.section)).context(invalid("no section"))?;
        let city = non_empty(Some(self.city)).context(invalid("no city"))?;
        Ok(VoteRecord {
            candidate_number: CandidateNumber::new(&candidate_number),
            candidate_name: self.candidate_name.trim().to_string(),
            party: self.party.trim().to_string(),
            position,
            zone,
            section,
            votes: self.votes,
            city,
            neighborhood: non_empty(self.neighborhood),
        })
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(position: Option<&str>) -> DatasetSource {
        DatasetSource {
            provider: "csv".to_string(),
            file_path: "votes.csv".to_string(),
            excel_worksheet_name: None,
            position: position.map(|s| s.to_string()),
        }
    }

    fn raw() -> RawRecord {
        RawRecord {
            candidate_number: " 050 ".to_string(),
            candidate_name: "Ana".to_string(),
            party: "PA".to_string(),
            position: None,
            zone: "1".to_string(),
            section: "2".to_string(),
            votes: 200,
            city: "Riverside".to_string(),
            neighborhood: Some("".to_string()),
        }
    }

    #[test]
    fn position_comes_from_the_source() {
        let r = raw()
            .vote_record(&source(Some("Councilor")), "votes.csv", 2)
            .unwrap();
        assert_eq!(r.position, "Councilor");
        assert_eq!(r.candidate_number.as_str(), "050");
        assert_eq!(r.neighborhood, None);

        let err = raw().vote_record(&source(None), "votes.csv", 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid record at line 2 of votes.csv: no position"
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/data/2024/votes.csv"), "votes.csv");
        assert_eq!(simplify_file_name("votes.json"), "votes.json");
    }
}
