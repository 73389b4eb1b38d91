use crate::app::{io_common::RawRecord, *};

/// A record as found in JSON files: identifiers may be strings or numbers.
#[derive(PartialEq, Debug, Clone, Deserialize)]
struct JsonRecord {
    #[serde(rename = "candidateNumber")]
    candidate_number: JSValue,
    #[serde(rename = "candidateName")]
    candidate_name: String,
    party: String,
    position: Option<String>,
    zone: JSValue,
    section: JSValue,
    votes: u64,
    city: String,
    neighborhood: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonRecords {
    Bare(Vec<JsonRecord>),
    Wrapped { records: Vec<JsonRecord> },
}

/// Reads vote records from a JSON file holding either a list of records or an
/// object with a `records` list.
pub fn read_json_records(path: &str, source: &DatasetSource) -> BAppResult<Vec<VoteRecord>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let parsed: JsonRecords =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let records = match parsed {
        JsonRecords::Bare(l) => l,
        JsonRecords::Wrapped { records } => records,
    };

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, jr) in records.into_iter().enumerate() {
        let lineno = (idx + 1) as u64;
        let text = |v: &JSValue, field: &str| -> AppResult<String> {
            read_js_text(v).context(InvalidRecordSnafu {
                path,
                lineno,
                reason: format!("{} must be a string or an integer", field),
            })
        };
        let raw = RawRecord {
            candidate_number: text(&jr.candidate_number, "candidateNumber")?,
            candidate_name: jr.candidate_name,
            party: jr.party,
            position: jr.position,
            zone: text(&jr.zone, "zone")?,
            section: text(&jr.section, "section")?,
            votes: jr.votes,
            city: jr.city,
            neighborhood: jr.neighborhood,
        };
        res.push(raw.vote_record(source, path, lineno)?);
    }
    info!(
        "read_json_records: {:?}: {:?} records",
        io_common::simplify_file_name(path),
        res.len()
    );
    Ok(res)
}
