//! An in-memory column table with an explicit missing-value marker per cell.
//!
//! Instrument exports carry an open-ended set of channels, so columns are addressed by
//! name. Each column is either numeric or text; a cell that is blank or failed numeric
//! coercion is `None` rather than a sentinel value.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(values) => values.get(row).map_or(true, Option::is_none),
            ColumnData::Text(values) => values.get(row).map_or(true, Option::is_none),
        }
    }

    /// The cell as it is written to a CSV file; missing cells are empty.
    pub fn cell_text(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(values) => values.get(row).copied().flatten().map(format_number),
            ColumnData::Text(values) => values.get(row).cloned().flatten(),
        }
    }

    /// Infers a column type the way a CSV reader does: numeric when every present cell
    /// parses as a number, text otherwise.
    pub fn infer(values: Vec<Option<String>>) -> Self {
        let all_numeric = values
            .iter()
            .flatten()
            .all(|cell| parse_number(cell).is_some());
        if all_numeric {
            ColumnData::Numeric(
                values
                    .iter()
                    .map(|cell| cell.as_deref().and_then(parse_finite_or_missing))
                    .collect(),
            )
        } else {
            ColumnData::Text(values)
        }
    }

    fn into_text(self) -> Vec<Option<String>> {
        match self {
            ColumnData::Numeric(values) => values
                .into_iter()
                .map(|v| v.map(format_number))
                .collect(),
            ColumnData::Text(values) => values,
        }
    }

    fn head(&self, n: usize) -> Self {
        match self {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(values.iter().take(n).copied().collect())
            }
            ColumnData::Text(values) => ColumnData::Text(values.iter().take(n).cloned().collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a header row and raw string records.
    ///
    /// Blank headers become `Unnamed: <index>` and repeated headers get `.1`, `.2`, ...
    /// suffixes so every column stays addressable. Short records are padded with
    /// missing cells.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let names = unique_headers(headers);
        let row_count = records.len();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(row_count); names.len()];
        for record in &records {
            for (idx, column) in cells.iter_mut().enumerate() {
                let cell = record
                    .get(idx)
                    .filter(|value| !value.is_empty())
                    .cloned();
                column.push(cell);
            }
        }
        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column {
                name,
                data: ColumnData::infer(values),
            })
            .collect();
        Self { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column(name).and_then(|c| c.data.as_numeric())
    }

    /// Replaces the column called `name`, or appends it when absent.
    pub fn set_column(&mut self, name: &str, data: ColumnData) {
        if self.columns.is_empty() {
            self.row_count = data.len();
        }
        debug_assert_eq!(data.len(), self.row_count, "column '{}' length", name);
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.data = data,
            None => self.columns.push(Column {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Broadcasts one value (or a blank) down every row.
    pub fn set_constant(&mut self, name: &str, value: Option<f64>) {
        self.set_column(name, ColumnData::Numeric(vec![value; self.row_count]));
    }

    pub fn set_constant_text(&mut self, name: &str, value: &str) {
        self.set_column(
            name,
            ColumnData::Text(vec![Some(value.to_string()); self.row_count]),
        );
    }

    /// Renames every column for which `rename` returns a new name.
    pub fn rename_columns<F>(&mut self, rename: F)
    where
        F: Fn(&str) -> Option<&'static str>,
    {
        for column in &mut self.columns {
            if let Some(new_name) = rename(&column.name) {
                column.name = new_name.to_string();
            }
        }
    }

    pub fn strip_column_names(&mut self) {
        for column in &mut self.columns {
            column.name = column.name.trim().to_string();
        }
    }

    /// Converts a column to numeric, turning unparseable cells into missing ones.
    ///
    /// Returns `false` when the column does not exist.
    pub fn coerce_numeric(&mut self, name: &str) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.name == name) else {
            return false;
        };
        if let ColumnData::Text(values) = &column.data {
            let coerced = values
                .iter()
                .map(|cell| cell.as_deref().and_then(parse_finite_or_missing))
                .collect();
            column.data = ColumnData::Numeric(coerced);
        }
        true
    }

    /// Converts every text column whose cells all parse as numbers; the rest are left as-is.
    pub fn convert_numeric_where_possible(&mut self) {
        for column in &mut self.columns {
            if let ColumnData::Text(values) = &column.data {
                let inferred = ColumnData::infer(values.clone());
                if matches!(inferred, ColumnData::Numeric(_)) {
                    column.data = inferred;
                }
            }
        }
    }

    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.head(n),
                })
                .collect(),
            row_count: self.row_count.min(n),
        }
    }

    /// Stacks tables vertically, keeping row order.
    ///
    /// Columns are matched by name in order of first appearance; rows from a table
    /// lacking a column get missing cells. A column numeric in every table stays numeric.
    pub fn concat(tables: Vec<Table>) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut all_numeric: HashMap<String, bool> = HashMap::new();
        for table in &tables {
            for column in &table.columns {
                let numeric = matches!(column.data, ColumnData::Numeric(_));
                match all_numeric.get_mut(&column.name) {
                    Some(flag) => *flag &= numeric,
                    None => {
                        order.push(column.name.clone());
                        all_numeric.insert(column.name.clone(), numeric);
                    }
                }
            }
        }

        let row_count = tables.iter().map(|t| t.row_count).sum();
        let mut numeric: HashMap<String, Vec<Option<f64>>> = HashMap::new();
        let mut text: HashMap<String, Vec<Option<String>>> = HashMap::new();
        for name in &order {
            if all_numeric[name] {
                numeric.insert(name.clone(), Vec::with_capacity(row_count));
            } else {
                text.insert(name.clone(), Vec::with_capacity(row_count));
            }
        }

        for table in tables {
            let rows = table.row_count;
            let mut present: HashMap<String, ColumnData> = table
                .columns
                .into_iter()
                .map(|c| (c.name, c.data))
                .collect();
            for name in &order {
                let data = present.remove(name);
                if let Some(target) = numeric.get_mut(name) {
                    match data {
                        Some(ColumnData::Numeric(values)) => target.extend(values),
                        _ => target.extend(std::iter::repeat(None).take(rows)),
                    }
                } else if let Some(target) = text.get_mut(name) {
                    match data {
                        Some(data) => target.extend(data.into_text()),
                        None => target.extend(std::iter::repeat(None).take(rows)),
                    }
                }
            }
        }

        let columns = order
            .into_iter()
            .map(|name| {
                let data = match numeric.remove(&name) {
                    Some(values) => ColumnData::Numeric(values),
                    None => ColumnData::Text(text.remove(&name).unwrap_or_default()),
                };
                Column { name, data }
            })
            .collect();
        Self { columns, row_count }
    }
}

fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };
        let name = match seen.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{}.{}", base, count)
            }
            None => base.clone(),
        };
        seen.entry(base).or_insert(0);
        names.push(name);
    }
    names
}

/// Parses a cell as a number. `NaN` and infinities parse successfully.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

fn parse_finite_or_missing(cell: &str) -> Option<f64> {
    parse_number(cell).filter(|v| !v.is_nan())
}

pub fn format_number(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn infers_numeric_and_text_columns() {
        let table = Table::from_records(
            vec!["t".into(), "label".into()],
            records(&[&["0", "a"], &["1.5", ""], &["", "c"]]),
        );
        assert_eq!(table.numeric("t"), Some(&[Some(0.0), Some(1.5), None][..]));
        assert!(matches!(table.column("label").unwrap().data, ColumnData::Text(_)));
        assert!(table.column("label").unwrap().data.is_missing(1));
    }

    #[test]
    fn duplicate_and_blank_headers_are_made_unique() {
        let table = Table::from_records(
            vec!["a".into(), "a".into(), "".into()],
            records(&[&["1", "2", "3"]]),
        );
        assert_eq!(table.column_names(), vec!["a", "a.1", "Unnamed: 2"]);
    }

    #[test]
    fn coerce_turns_bad_cells_into_missing() {
        let mut table = Table::from_records(
            vec!["v".into()],
            records(&[&["1"], &["n/a"], &["3"]]),
        );
        assert!(table.numeric("v").is_none());
        assert!(table.coerce_numeric("v"));
        assert_eq!(table.numeric("v"), Some(&[Some(1.0), None, Some(3.0)][..]));
        assert!(!table.coerce_numeric("absent"));
    }

    #[test]
    fn concat_fills_missing_columns_and_keeps_order() {
        let first = Table::from_records(vec!["x".into()], records(&[&["1"], &["2"]]));
        let second = Table::from_records(
            vec!["x".into(), "y".into()],
            records(&[&["3", "note"]]),
        );
        let combined = Table::concat(vec![first, second]);
        assert_eq!(combined.row_count(), 3);
        assert_eq!(combined.column_names(), vec!["x", "y"]);
        assert_eq!(
            combined.numeric("x"),
            Some(&[Some(1.0), Some(2.0), Some(3.0)][..])
        );
        let y = &combined.column("y").unwrap().data;
        assert!(y.is_missing(0) && y.is_missing(1));
        assert_eq!(y.cell_text(2).as_deref(), Some("note"));
    }

    #[test]
    fn concat_mixed_types_falls_back_to_text() {
        let first = Table::from_records(vec!["x".into()], records(&[&["1"]]));
        let second = Table::from_records(vec!["x".into()], records(&[&["abc"]]));
        let combined = Table::concat(vec![first, second]);
        let x = &combined.column("x").unwrap().data;
        assert_eq!(x.cell_text(0).as_deref(), Some("1"));
        assert_eq!(x.cell_text(1).as_deref(), Some("abc"));
    }

    #[test]
    fn constant_columns_span_every_row() {
        let mut table = Table::from_records(vec!["x".into()], records(&[&["1"], &["2"]]));
        table.set_constant("Fuel mass", Some(2.5));
        table.set_constant("PM EF (g/MJ)", None);
        assert_eq!(table.numeric("Fuel mass"), Some(&[Some(2.5), Some(2.5)][..]));
        assert_eq!(table.numeric("PM EF (g/MJ)"), Some(&[None, None][..]));
    }
}
