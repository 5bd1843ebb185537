//! Reading instrument exports and saved runs, and writing result files.

use crate::{error::LabError, table::Table};
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use std::{
    fs::{self, OpenOptions},
    path::Path,
};

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    /// Picks the reader from the file extension; anything not a workbook is read as text.
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("xls" | "xlsx" | "xlsm" | "xlsb" | "ods") => SourceFormat::Spreadsheet,
            _ => SourceFormat::Delimited,
        }
    }
}

/// Loads a raw instrument export or a saved run from disk.
pub fn load_table(path: &Path) -> Result<Table, LabError> {
    let name = path.display().to_string();
    match SourceFormat::from_file_name(&name) {
        SourceFormat::Spreadsheet => read_spreadsheet(path),
        SourceFormat::Delimited => {
            let bytes = fs::read(path).map_err(|e| LabError::FileIO(name.clone(), e))?;
            read_delimited(&name, &bytes)
        }
    }
}

/// Guesses the field separator from the first few non-empty lines.
///
/// A candidate that appears the same number of times on every sampled line wins; ties
/// go to the candidate with more fields. Falls back to a comma.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let Some(first) = lines.first() else {
        return b',';
    };

    let count = |line: &str, delimiter: u8| line.bytes().filter(|b| *b == delimiter).count();
    let mut best: Option<(bool, usize, u8)> = None;
    for delimiter in DELIMITER_CANDIDATES {
        let on_header = count(first, delimiter);
        if on_header == 0 {
            continue;
        }
        let consistent = lines.iter().all(|line| count(line, delimiter) == on_header);
        let candidate = (consistent, on_header, delimiter);
        if best.map_or(true, |(c, n, _)| (consistent, on_header) > (c, n)) {
            best = Some(candidate);
        }
    }
    best.map_or(b',', |(_, _, delimiter)| delimiter)
}

/// Parses delimited text. Non-UTF-8 bytes are replaced rather than rejected, since
/// instrument exports often carry Latin-1 degree signs.
pub fn read_delimited(name: &str, bytes: &[u8]) -> Result<Table, LabError> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
    if text.trim().is_empty() {
        return Err(LabError::Parse(
            name.to_string(),
            "No columns to parse from file".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LabError::CsvError(name.to_string(), e))?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LabError::CsvError(name.to_string(), e))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(Table::from_records(headers, records))
}

/// Reads the first worksheet; its first row is the header.
pub fn read_spreadsheet(path: &Path) -> Result<Table, LabError> {
    let name = path.display().to_string();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LabError::Spreadsheet(name.clone(), e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LabError::Parse(name.clone(), "workbook has no sheets".to_string()))?
        .map_err(|e| LabError::Spreadsheet(name.clone(), e))?;
    table_from_cells(&name, range.rows())
}

/// Builds a table from worksheet rows, the first of which is the header. Blank rows are
/// skipped.
pub fn table_from_cells<'a, I>(name: &str, mut rows: I) -> Result<Table, LabError>
where
    I: Iterator<Item = &'a [Data]>,
{
    let headers = rows
        .next()
        .ok_or_else(|| LabError::Parse(name.to_string(), "No columns to parse from file".to_string()))?
        .iter()
        .map(cell_to_string)
        .collect::<Vec<_>>();
    let records = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();
    Ok(Table::from_records(headers, records))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => crate::table::format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => excel_datetime_to_string(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Excel stores dates as day serials; a serial below one is a bare time of day.
fn excel_datetime_to_string(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return crate::table::format_number(dt.as_f64());
    }
    match dt.as_datetime() {
        Some(ts) if dt.as_f64() < 1.0 => ts.format("%H:%M:%S").to_string(),
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => crate::table::format_number(dt.as_f64()),
    }
}

/// Writes the table as comma-separated text.
///
/// The file must not already exist; a run file is never overwritten.
pub fn write_csv(table: &Table, path: &Path) -> Result<(), LabError> {
    let name = path.display().to_string();
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| LabError::FileIO(name.clone(), e))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(table.column_names())
        .map_err(|e| LabError::CsvError(name.clone(), e))?;
    for row in 0..table.row_count() {
        let record = table
            .columns()
            .iter()
            .map(|c| c.data.cell_text(row).unwrap_or_default());
        writer
            .write_record(record)
            .map_err(|e| LabError::CsvError(name.clone(), e))?;
    }
    writer
        .flush()
        .map_err(|e| LabError::FileIO(name.clone(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;
    use calamine::ExcelDateTimeType;

    #[test]
    fn sniffs_common_separators() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("single\n1\n"), b',');
    }

    #[test]
    fn consistent_separator_beats_stray_commas() {
        let text = "X_Value;Comment\n0;started, lit\n60;ok\n";
        assert_eq!(sniff_delimiter(text), b';');
    }

    #[test]
    fn reads_semicolon_export_with_bom() {
        let bytes = "\u{feff}X_Value;1-Load Cell (Formula Result)\n0;10\n60;9.5\n".as_bytes();
        let table = read_delimited("raw.txt", bytes).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["X_Value", "1-Load Cell (Formula Result)"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.numeric("X_Value"), Some(&[Some(0.0), Some(60.0)][..]));
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(matches!(
            read_delimited("empty.csv", b"  \n"),
            Err(LabError::Parse(_, _))
        ));
    }

    fn excel_date(serial: f64) -> Data {
        Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false))
    }

    #[test]
    fn spreadsheet_dates_become_timestamps() {
        assert_eq!(cell_to_string(&excel_date(45664.416666666664)), "2025-01-07 10:00:00");
        assert_eq!(cell_to_string(&excel_date(0.5)), "12:00:00");
        assert_eq!(
            cell_to_string(&Data::DateTimeIso("2025-01-07T10:00:00".to_string())),
            "2025-01-07T10:00:00"
        );
    }

    #[test]
    fn worksheet_rows_keep_clock_times() {
        let rows = vec![
            vec![
                Data::String("X_Value".to_string()),
                Data::String("1-Load Cell (Formula Result)".to_string()),
                Data::String("Comment".to_string()),
            ],
            vec![Data::Float(0.0), Data::Float(10.0), excel_date(45664.416666666664)],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![Data::Int(60), Data::Float(9.5), excel_date(45664.41736111111)],
        ];
        let table = table_from_cells("raw.xlsx", rows.iter().map(Vec::as_slice)).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.numeric("X_Value"), Some(&[Some(0.0), Some(60.0)][..]));

        let comment = &table.column("Comment").unwrap().data;
        assert!(matches!(comment, ColumnData::Text(_)));
        assert_eq!(comment.cell_text(0).as_deref(), Some("2025-01-07 10:00:00"));
        assert_eq!(comment.cell_text(1).as_deref(), Some("2025-01-07 10:01:00"));
    }

    #[test]
    fn worksheet_without_rows_is_a_parse_error() {
        let rows: Vec<Vec<Data>> = Vec::new();
        assert!(matches!(
            table_from_cells("empty.xlsx", rows.iter().map(Vec::as_slice)),
            Err(LabError::Parse(_, _))
        ));
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(SourceFormat::from_file_name("run.XLSX"), SourceFormat::Spreadsheet);
        assert_eq!(SourceFormat::from_file_name("run.xls"), SourceFormat::Spreadsheet);
        assert_eq!(SourceFormat::from_file_name("run.txt"), SourceFormat::Delimited);
        assert_eq!(SourceFormat::from_file_name("run"), SourceFormat::Delimited);
    }

    #[test]
    fn written_file_reads_back_and_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = read_delimited("in.csv", b"a,b\n1,x\n,y\n").unwrap();
        write_csv(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a,b\n1,x\n,y\n");
        assert!(matches!(write_csv(&table, &path), Err(LabError::FileIO(_, _))));
    }
}
