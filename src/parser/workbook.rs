use calamine::{open_workbook_from_rs, Reader, Xlsx};
use std::io::Cursor;

use super::cell::Cell;
use super::WorkbookError;

/// One worksheet, header row first.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Decodes every worksheet of an xlsx buffer, in workbook order.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<SheetGrid>, WorkbookError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|source| WorkbookError::Sheet {
                sheet: name.clone(),
                source,
            })?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        sheets.push(SheetGrid { name, rows });
    }

    Ok(sheets)
}

/// Two-sheet workbook shared by the parser and upload tests.
///
/// `Power` opens with `SID 3: Power status` and holds `BAT_V` and `BAT_T`.
/// `BAT_T` inherits its field name and carries a date in `Concept`.
/// `Thermal` has no SID header and holds `HTR_ON`.
#[cfg(test)]
pub(crate) fn sample_workbook() -> Vec<u8> {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut workbook = Workbook::new();

    let power = workbook.add_worksheet().set_name("Power").unwrap();
    for (col, name) in super::REQUIRED_COLUMNS.iter().enumerate() {
        power.write_string(0, col as u16, *name).unwrap();
    }
    power.write_string(1, 0, "SID 3: Power status").unwrap();

    power.write_string(2, 0, "Battery").unwrap();
    power.write_string(2, 1, "uint16").unwrap();
    power.write_string(2, 2, "BAT_V").unwrap();
    power.write_number(2, 3, 1).unwrap();
    power.write_number(2, 4, 0.5).unwrap();
    power.write_number(2, 6, 0).unwrap();
    power.write_number(2, 7, 100).unwrap();
    power.write_string(2, 8, "voltage").unwrap();
    power.write_string(2, 9, "V").unwrap();

    let date = ExcelDateTime::from_ymd(2024, 3, 1).unwrap();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    power.write_string(3, 1, "uint8").unwrap();
    power.write_string(3, 2, "BAT_T").unwrap();
    power.write_number(3, 3, 2).unwrap();
    power.write_number(3, 5, -40).unwrap();
    power
        .write_datetime_with_format(3, 8, &date, &date_format)
        .unwrap();
    power.write_string(3, 9, "degC").unwrap();

    let thermal = workbook.add_worksheet().set_name("Thermal").unwrap();
    for (col, name) in super::REQUIRED_COLUMNS.iter().enumerate() {
        thermal.write_string(0, col as u16, *name).unwrap();
    }
    thermal.write_string(1, 0, "Heater").unwrap();
    thermal.write_string(1, 1, "bool").unwrap();
    thermal.write_string(1, 2, "HTR_ON").unwrap();
    thermal.write_number(1, 3, 1).unwrap();

    workbook.save_to_buffer().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_not_a_workbook() {
        let result = read_workbook(b"definitely not a zip archive");
        assert!(matches!(result, Err(WorkbookError::Open(_))));
    }

    #[test]
    fn test_reads_sheets_in_workbook_order() {
        let sheets = read_workbook(&sample_workbook()).unwrap();

        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Power", "Thermal"]);

        let power = &sheets[0];
        assert_eq!(power.rows.len(), 4);
        assert_eq!(power.rows[0][0], Cell::Text("Field Name".to_string()));
        assert_eq!(power.rows[1][0], Cell::Text("SID 3: Power status".to_string()));
        assert!(power.rows[1][2].is_empty());
        assert_eq!(power.rows[2][3], Cell::Int(1));
        assert_eq!(power.rows[2][4], Cell::Float(0.5));
        assert_eq!(power.rows[3][5], Cell::Int(-40));
    }

    #[test]
    fn test_date_cells_become_iso_text() {
        let sheets = read_workbook(&sample_workbook()).unwrap();
        assert_eq!(
            sheets[0].rows[3][8],
            Cell::Text("2024-03-01T00:00:00".to_string())
        );
    }
}
