use crate::error::{AppError, Result};
use crate::models::Status;
use serde_json::Value;
use std::io::Read;

/// In-memory table of named columns and cell values, written wholesale into a
/// worksheet.
///
/// Cells are JSON values rather than strings: numeric progress values have to
/// reach the sheet as numbers for the status coloring rules to match them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Dataset {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, which must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(AppError::Dataset(format!(
                "Row has {} cells but dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        self.rows.push(row);
        Ok(())
    }

    /// Append a member progress row: the member name followed by one numeric
    /// status cell per remaining column.
    pub fn push_progress_row(&mut self, member: &str, statuses: &[Status]) -> Result<()> {
        let mut row = Vec::with_capacity(statuses.len() + 1);
        row.push(Value::from(member));
        row.extend(statuses.iter().map(|s| Value::from(s.value())));

        self.push_row(row)
    }

    /// Read a dataset from CSV input, using the first record as column names.
    ///
    /// Cells that parse as numbers are kept numeric. Short records are padded
    /// with empty cells.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| AppError::Dataset(format!("Failed to read CSV headers: {}", e)))?;
        let mut dataset = Dataset::new(headers.iter());

        for (idx, record) in csv_reader.records().enumerate() {
            let record = record
                .map_err(|e| AppError::Dataset(format!("Failed to read CSV row {}: {}", idx + 1, e)))?;

            let mut row: Vec<Value> = record.iter().map(parse_cell).collect();
            while row.len() < dataset.columns.len() {
                row.push(Value::from(""));
            }

            dataset.push_row(row)?;
        }

        Ok(dataset)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert to sheet rows, always including the header row first.
    pub(crate) fn to_sheet_rows(&self) -> Vec<Vec<Value>> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.columns.iter().map(|c| Value::from(c.as_str())).collect());
        rows.extend(self.rows.iter().cloned());

        rows
    }
}

fn parse_cell(field: &str) -> Value {
    if let Ok(n) = field.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Value::from(f);
    }

    Value::from(field)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_sheet_rows_with_data() {
        let dataset = test_helpers::mock_progress_dataset();
        let rows = dataset.to_sheet_rows();

        let expected = vec![
            vec![json!("Member"), json!("Task 1"), json!("Task 2")],
            vec![json!("alice"), json!(2), json!(1)],
            vec![json!("bob"), json!(0), json!(0)],
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_to_sheet_rows_empty() {
        let dataset = Dataset::new(["Member", "Task 1"]);
        let rows = dataset.to_sheet_rows();

        let expected = vec![vec![json!("Member"), json!("Task 1")]];
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_push_row_width_mismatch() {
        let mut dataset = Dataset::new(["Member", "Task 1"]);
        let err = dataset.push_row(vec![json!("alice")]).unwrap_err();

        assert!(matches!(err, AppError::Dataset(_)));
    }

    #[test]
    fn test_from_csv_keeps_numbers() {
        let input = "Member,Task 1,Task 2\nalice,2,1\nbob,0,0.5\n";
        let dataset = Dataset::from_csv(input.as_bytes()).unwrap();

        let expected = vec![
            vec![json!("Member"), json!("Task 1"), json!("Task 2")],
            vec![json!("alice"), json!(2), json!(1)],
            vec![json!("bob"), json!(0), json!(0.5)],
        ];
        assert_eq!(dataset.to_sheet_rows(), expected);
    }

    #[test]
    fn test_from_csv_pads_short_rows() {
        let input = "Member,Task 1,Task 2\nalice,2\n";
        let dataset = Dataset::from_csv(input.as_bytes()).unwrap();

        assert_eq!(dataset.row_count(), 1);
        assert_eq!(
            dataset.to_sheet_rows()[1],
            vec![json!("alice"), json!(2), json!("")]
        );
    }
}
