use std::collections::HashMap;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::app::{
    io_common::{RawRecord, COLUMNS},
    *,
};

/// Reads vote records from an Excel worksheet. The first row holds the column
/// names; the neighborhood and position columns are optional.
pub fn read_excel_records(path: &str, source: &DatasetSource) -> BAppResult<Vec<VoteRecord>> {
    let wrange = get_range(path, source)?;

    let header = wrange.rows().next().context(EmptyExcelSnafu { path })?;
    debug!("read_excel_records: header: {:?}", header);
    let col_indexes = get_col_index(path, header)?;

    let mut res: Vec<VoteRecord> = Vec::new();
    for (idx, row) in wrange.rows().enumerate().skip(1) {
        let lineno = (idx + 1) as u64;
        debug!("read_excel_records: lineno: {:?} row: {:?}", lineno, row);
        if row.iter().all(|c| *c == DataType::Empty) {
            continue;
        }
        let text = |column: &str| -> AppResult<Option<String>> {
            match col_indexes.get(column).and_then(|i| row.get(*i)) {
                None => Ok(None),
                Some(cell) => read_cell_text(cell).context(ExcelWrongCellTypeSnafu {
                    lineno,
                    content: format!("{}: {:?}", column, cell),
                }),
            }
        };
        let votes_cell = col_indexes
            .get("votes")
            .and_then(|i| row.get(*i))
            .unwrap_or(&DataType::Empty);
        let votes = read_cell_count(votes_cell).context(ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("votes: {:?}", votes_cell),
        })?;

        let raw = RawRecord {
            candidate_number: text("candidateNumber")?.unwrap_or_default(),
            candidate_name: text("candidateName")?.unwrap_or_default(),
            party: text("party")?.unwrap_or_default(),
            position: text("position")?,
            zone: text("zone")?.unwrap_or_default(),
            section: text("section")?.unwrap_or_default(),
            votes,
            city: text("city")?.unwrap_or_default(),
            neighborhood: text("neighborhood")?,
        };
        res.push(raw.vote_record(source, path, lineno)?);
    }
    info!(
        "read_excel_records: {:?}: {:?} records",
        io_common::simplify_file_name(path),
        res.len()
    );
    Ok(res)
}

/// The text of a cell. Integral numbers are written without decimals.
/// Returns `Some(None)` for an empty cell and `None` for a cell that cannot be text.
fn read_cell_text(cell: &DataType) -> Option<Option<String>> {
    match cell {
        DataType::Empty => Some(None),
        DataType::String(s) if s.trim().is_empty() => Some(None),
        DataType::String(s) => Some(Some(s.trim().to_string())),
        DataType::Int(i) => Some(Some(i.to_string())),
        DataType::Float(f) if f.fract() == 0.0 => Some(Some(format!("{}", *f as i64))),
        _ => None,
    }
}

fn read_cell_count(cell: &DataType) -> Option<u64> {
    match cell {
        DataType::Int(i) if *i >= 0 => Some(*i as u64),
        DataType::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        DataType::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Maps every known column name of the header to its index.
fn get_col_index(path: &str, header: &[DataType]) -> AppResult<HashMap<&'static str, usize>> {
    let mut res: HashMap<&'static str, usize> = HashMap::new();
    for (idx, cell) in header.iter().enumerate() {
        if let DataType::String(s) = cell {
            if let Some(c) = COLUMNS.iter().find(|c| **c == s.trim()) {
                res.insert(*c, idx);
            }
        }
    }
    for column in COLUMNS.iter() {
        if *column != "position" && *column != "neighborhood" && !res.contains_key(column) {
            return MissingColumnSnafu { column: *column, path }.fail();
        }
    }
    Ok(res)
}

fn get_range(path: &str, source: &DatasetSource) -> BAppResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &source.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(worksheet_name) = &source.excel_worksheet_name {
        workbook.worksheet_range(worksheet_name)
    } else {
        workbook.worksheet_range_at(0)
    };
    let wrange = wrange
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;
    Ok(wrange)
}
