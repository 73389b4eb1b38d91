// Primitives for reading CSV files.

use crate::app::{io_common::RawRecord, *};

/// Reads vote records from a CSV file with a header row naming the columns.
pub fn read_csv_records(path: &str, source: &DatasetSource) -> BAppResult<Vec<VoteRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, line_r) in rdr.deserialize::<RawRecord>().enumerate() {
        // Line 1 is the header.
        let lineno = (idx + 2) as u64;
        let raw = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_records: lineno: {:?} row: {:?}", lineno, raw);
        res.push(raw.vote_record(source, path, lineno)?);
    }
    info!(
        "read_csv_records: {:?}: {:?} records",
        io_common::simplify_file_name(path),
        res.len()
    );
    Ok(res)
}
