//! Turns SID packet-structure workbooks into structure documents.
//!
//! Every worksheet lists telemetry variables row by row. A row whose
//! `Field Name` contains `SID` opens a new SID group; the variables that
//! follow are collected into one document keyed by variable name, with a
//! `metadata` entry describing the group.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use thiserror::Error;

pub mod cell;
pub mod workbook;

pub use cell::Cell;
pub use workbook::{read_workbook, SheetGrid};

/// A single SID group, ready to be stored.
pub type StructureDocument = Map<String, Value>;

pub const FIELD_NAME: &str = "Field Name";
pub const TYPE: &str = "Type";
pub const VARIABLE_NAME: &str = "Variable Name";
pub const COUNT: &str = "Count";
pub const GAIN: &str = "Gain";
pub const OFFSET: &str = "Offset";
pub const MIN: &str = "Min";
pub const MAX: &str = "Max";
pub const CONCEPT: &str = "Concept";
pub const UNIT: &str = "Unit";

pub const REQUIRED_COLUMNS: [&str; 10] = [
    FIELD_NAME,
    TYPE,
    VARIABLE_NAME,
    COUNT,
    GAIN,
    OFFSET,
    MIN,
    MAX,
    CONCEPT,
    UNIT,
];

const DEFAULT_SID_NAME: &str = "SID1";
const SID_MARKER: &str = "SID";

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Failed to open workbook: {0}")]
    Open(#[from] calamine::XlsxError),
    #[error("Failed to read sheet {sheet}: {source}")]
    Sheet {
        sheet: String,
        source: calamine::XlsxError,
    },
    #[error("Missing required columns in sheet: {sheet} ({})", .missing.join(", "))]
    MissingColumns { sheet: String, missing: Vec<String> },
    #[error("Invalid SID number in '{name}' (sheet: {sheet})")]
    InvalidSidNumber { sheet: String, name: String },
    #[error("Workbook contains no SID entries")]
    Empty,
}

/// Column positions of the required headers within one sheet.
struct ColumnMap {
    positions: HashMap<&'static str, usize>,
}

impl ColumnMap {
    fn from_header(sheet: &str, header: &[Cell]) -> Result<Self, WorkbookError> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            seen.entry(cell.to_key().trim().to_string()).or_insert(idx);
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !seen.contains_key(**col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(WorkbookError::MissingColumns {
                sheet: sheet.to_string(),
                missing,
            });
        }

        let positions = REQUIRED_COLUMNS
            .iter()
            .filter_map(|col| seen.get(*col).map(|idx| (*col, *idx)))
            .collect();
        Ok(Self { positions })
    }

    fn get<'a>(&self, row: &'a [Cell], column: &str) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        self.positions
            .get(column)
            .and_then(|idx| row.get(*idx))
            .unwrap_or(&EMPTY)
    }
}

/// Extracts the numeric part of a SID name such as `SID 12: Housekeeping`.
pub fn sid_number(full_name: &str) -> Option<i64> {
    let head = full_name.split(':').next().unwrap_or_default();
    head.replace(SID_MARKER, "").trim().parse().ok()
}

fn sid_metadata(sheet: &str, full_name: &str) -> Result<Value, WorkbookError> {
    let number = sid_number(full_name).ok_or_else(|| WorkbookError::InvalidSidNumber {
        sheet: sheet.to_string(),
        name: full_name.to_string(),
    })?;
    Ok(json!({
        "info": sheet,
        "full_name": full_name,
        "SID": full_name,
        "SIDNumber": number,
    }))
}

fn collect_sheet(
    sheet: &SheetGrid,
    documents: &mut Vec<StructureDocument>,
) -> Result<(), WorkbookError> {
    let Some((header, rows)) = sheet.rows.split_first() else {
        return Err(WorkbookError::MissingColumns {
            sheet: sheet.name.clone(),
            missing: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    };
    let columns = ColumnMap::from_header(&sheet.name, header)?;

    let mut group = StructureDocument::new();
    let mut first_header = true;
    let mut sid_name = DEFAULT_SID_NAME.to_string();
    let mut last_field_name = Cell::Empty;

    for row in rows {
        let field_name = columns.get(row, FIELD_NAME);
        if let Some(name) = field_name.as_text().filter(|n| n.contains(SID_MARKER)) {
            sid_name = name.to_string();
            if !first_header && !group.is_empty() {
                documents.push(std::mem::take(&mut group));
            }
            first_header = false;
        }

        let variable_name = columns.get(row, VARIABLE_NAME);
        if variable_name.is_empty() || variable_name.as_text() == Some(VARIABLE_NAME) {
            continue;
        }

        let metadata = sid_metadata(&sheet.name, &sid_name)?;
        if !field_name.is_empty() {
            last_field_name = field_name.clone();
        }

        let entry = json!({
            "field_name": field_name.to_json_or(last_field_name.to_json()),
            "type": columns.get(row, TYPE).to_json(),
            "variable_name": variable_name.to_json(),
            "count": columns.get(row, COUNT).to_json(),
            "gain": columns.get(row, GAIN).to_json_or(json!(1)),
            "offset": columns.get(row, OFFSET).to_json_or(json!(0)),
            "min": columns.get(row, MIN).to_json(),
            "max": columns.get(row, MAX).to_json(),
            "concept": columns.get(row, CONCEPT).to_json(),
            "unit": columns.get(row, UNIT).to_json(),
        });

        group.insert("metadata".to_string(), metadata);
        group.insert(variable_name.to_key(), entry);
    }

    if !group.is_empty() {
        documents.push(group);
    }
    Ok(())
}

/// Groups the rows of every sheet into SID documents, preserving sheet order.
pub fn build_structure(sheets: &[SheetGrid]) -> Result<Vec<StructureDocument>, WorkbookError> {
    let mut documents = Vec::new();
    for sheet in sheets {
        collect_sheet(sheet, &mut documents)?;
    }
    Ok(documents)
}

pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<StructureDocument>, WorkbookError> {
    let sheets = read_workbook(bytes)?;
    let documents = build_structure(&sheets)?;
    if documents.is_empty() {
        return Err(WorkbookError::Empty);
    }
    Ok(documents)
}
