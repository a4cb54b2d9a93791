//! In-memory result table.

use crate::{ResultsError, ResultsResult};

/// Name of the trailing per-row status column in delimited output.
pub const CONVERGED_COLUMN: &str = "converged";

/// One stored row, values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub label: Option<String>,
    pub values: Vec<f64>,
    pub converged: bool,
}

/// Named fields offered to [`ResultTable::append`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub label: Option<String>,
    pub fields: Vec<(String, f64)>,
    pub converged: bool,
}

impl Record {
    pub fn new(fields: Vec<(String, f64)>) -> Self {
        Self {
            label: None,
            fields,
            converged: true,
        }
    }

    pub fn labeled(label: impl Into<String>, fields: Vec<(String, f64)>) -> Self {
        Self {
            label: Some(label.into()),
            fields,
            converged: true,
        }
    }

    /// NaN payload for every column except those given explicitly.
    pub fn failed(columns: &[String], known: &[(String, f64)]) -> Self {
        let fields = columns
            .iter()
            .map(|name| {
                let value = known
                    .iter()
                    .find(|(n, _)| n == name)
                    .map_or(f64::NAN, |(_, v)| *v);
                (name.clone(), value)
            })
            .collect();
        Self {
            label: None,
            fields,
            converged: false,
        }
    }
}

/// Rows sharing one column set, optionally keyed by a text label column.
///
/// The column set is declared up front or taken from the first row; every
/// later row must supply exactly those fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    label_column: Option<String>,
    columns: Vec<String>,
    declared: bool,
    rows: Vec<Row>,
}

impl ResultTable {
    /// Table whose columns are fixed by the first appended row.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            label_column: None,
            columns,
            declared: true,
            rows: Vec::new(),
        }
    }

    /// Require a text label on every row, stored in the named column.
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = Some(name.into());
        self
    }

    pub fn label_column(&self) -> Option<&str> {
        self.label_column.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header of the delimited form: label, data columns, `converged`.
    pub fn header(&self) -> Vec<String> {
        self.label_column
            .iter()
            .cloned()
            .chain(self.columns.iter().cloned())
            .chain([CONVERGED_COLUMN.to_string()])
            .collect()
    }

    /// Validate and store a row. On error the table is left unchanged.
    pub fn append(&mut self, record: Record) -> ResultsResult<()> {
        let mut missing = Vec::new();
        let mut extra = Vec::new();

        match (&self.label_column, &record.label) {
            (Some(name), None) => missing.push(name.clone()),
            (None, Some(label)) => extra.push(format!("label '{label}'")),
            _ => {}
        }

        for (i, (name, _)) in record.fields.iter().enumerate() {
            if record.fields[..i].iter().any(|(n, _)| n == name) {
                extra.push(format!("duplicate {name}"));
            }
        }

        if !self.declared && self.rows.is_empty() {
            if record.fields.is_empty() {
                missing.push("at least one field".to_string());
            }
            if !missing.is_empty() || !extra.is_empty() {
                return Err(ResultsError::SchemaMismatch { missing, extra });
            }
            self.columns = record.fields.iter().map(|(n, _)| n.clone()).collect();
            self.declared = true;
        }

        missing.extend(
            self.columns
                .iter()
                .filter(|c| !record.fields.iter().any(|(n, _)| n == *c))
                .cloned(),
        );
        extra.extend(
            record
                .fields
                .iter()
                .filter(|(n, _)| !self.columns.contains(n))
                .map(|(n, _)| n.clone()),
        );
        if !missing.is_empty() || !extra.is_empty() {
            return Err(ResultsError::SchemaMismatch { missing, extra });
        }

        let values = self
            .columns
            .iter()
            .map(|c| {
                record
                    .fields
                    .iter()
                    .find(|(n, _)| n == c)
                    .map_or(f64::NAN, |(_, v)| *v)
            })
            .collect();
        self.rows.push(Row {
            label: record.label,
            values,
            converged: record.converged,
        });
        Ok(())
    }

    fn column_index(&self, name: &str) -> ResultsResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ResultsError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> ResultsResult<Vec<f64>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Row labels in row order (empty strings for unlabeled rows).
    pub fn labels(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.label.as_deref().unwrap_or(""))
            .collect()
    }

    pub fn converged_flags(&self) -> Vec<bool> {
        self.rows.iter().map(|r| r.converged).collect()
    }

    /// Copy keeping only the first `n` rows.
    pub fn head(&self, n: usize) -> ResultTable {
        ResultTable {
            rows: self.rows.iter().take(n).cloned().collect(),
            ..self.clone()
        }
    }

    /// Copy keeping only the named data columns, in the given order.
    pub fn select_columns(&self, names: &[&str]) -> ResultsResult<ResultTable> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<ResultsResult<Vec<_>>>()?;
        Ok(ResultTable {
            label_column: self.label_column.clone(),
            columns: names.iter().map(|n| n.to_string()).collect(),
            declared: true,
            rows: self
                .rows
                .iter()
                .map(|r| Row {
                    label: r.label.clone(),
                    values: indices.iter().map(|&i| r.values[i]).collect(),
                    converged: r.converged,
                })
                .collect(),
        })
    }

    /// Delimited text: header line, then one line per row, `\n` terminated.
    pub fn to_delimited_text(&self, delimiter: char) -> String {
        let mut out = String::new();
        let header: Vec<String> = self
            .header()
            .iter()
            .map(|h| quote_field(h, delimiter))
            .collect();
        push_line(&mut out, &header, delimiter);

        for row in &self.rows {
            let mut fields = Vec::with_capacity(self.columns.len() + 2);
            if self.label_column.is_some() {
                fields.push(quote_field(row.label.as_deref().unwrap_or(""), delimiter));
            }
            fields.extend(row.values.iter().map(|v| format_value(*v)));
            fields.push(row.converged.to_string());
            push_line(&mut out, &fields, delimiter);
        }
        out
    }
}

fn push_line(out: &mut String, fields: &[String], delimiter: char) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(field);
    }
    out.push('\n');
}

/// Shortest representation that parses back to the same value.
pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v}")
    }
}

pub(crate) fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn first_row_fixes_columns() {
        let mut table = ResultTable::new();
        table
            .append(Record::new(fields(&[("phi", 0.5), ("T", 1500.0)])))
            .unwrap();
        table
            .append(Record::new(fields(&[("T", 2300.0), ("phi", 1.0)])))
            .unwrap();
        assert_eq!(table.columns(), ["phi", "T"]);
        assert_eq!(table.column("T").unwrap(), vec![1500.0, 2300.0]);
        assert_eq!(table.column("phi").unwrap(), vec![0.5, 1.0]);
    }

    #[test]
    fn missing_field_leaves_table_unchanged() {
        let mut table = ResultTable::with_columns(vec!["phi".into(), "T".into()]);
        table
            .append(Record::new(fields(&[("phi", 0.5), ("T", 1500.0)])))
            .unwrap();
        let before = table.clone();

        let err = table
            .append(Record::new(fields(&[("phi", 1.0)])))
            .unwrap_err();
        match err {
            ResultsError::SchemaMismatch { missing, extra } => {
                assert_eq!(missing, vec!["T".to_string()]);
                assert!(extra.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(table, before);

        assert!(
            table
                .append(Record::new(fields(&[("phi", 1.0), ("T", 1.0), ("P", 1.0)])))
                .is_err()
        );
        assert!(
            table
                .append(Record::new(fields(&[("phi", 1.0), ("phi", 1.0), ("T", 1.0)])))
                .is_err()
        );
        assert_eq!(table, before);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let table = ResultTable::with_columns(vec!["phi".into()]);
        assert!(matches!(
            table.column("T"),
            Err(ResultsError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn label_column_is_enforced() {
        let mut table =
            ResultTable::with_columns(vec!["0.5".into()]).with_label_column("reaction");
        assert!(table.append(Record::new(fields(&[("0.5", 0.1)]))).is_err());
        table
            .append(Record::labeled("A + B => C", fields(&[("0.5", 0.1)])))
            .unwrap();
        assert_eq!(table.labels(), vec!["A + B => C"]);
        assert_eq!(table.header(), ["reaction", "0.5", "converged"]);
    }

    #[test]
    fn delimited_text_quotes_and_flags() {
        let mut table = ResultTable::new().with_label_column("reaction");
        table
            .append(Record::labeled("CO, \"fast\"", fields(&[("s", 0.25)])))
            .unwrap();
        let mut failed = Record::failed(&["s".to_string()], &[]);
        failed.label = Some("H2".into());
        table.append(failed).unwrap();

        let text = table.to_delimited_text(',');
        assert_eq!(
            text,
            "reaction,s,converged\n\"CO, \"\"fast\"\"\",0.25,true\nH2,NaN,false\n"
        );
    }

    #[test]
    fn failed_record_keeps_known_fields() {
        let columns = vec!["phi".to_string(), "T".to_string()];
        let record = Record::failed(&columns, &[("phi".to_string(), 3.9)]);
        assert!(!record.converged);
        assert_eq!(record.fields[0], ("phi".to_string(), 3.9));
        assert!(record.fields[1].1.is_nan());
    }

    #[test]
    fn select_and_head() {
        let mut table = ResultTable::new();
        for i in 0..4 {
            let x = i as f64;
            table
                .append(Record::new(fields(&[("a", x), ("b", 2.0 * x), ("c", 3.0 * x)])))
                .unwrap();
        }
        let picked = table.select_columns(&["c", "a"]).unwrap();
        assert_eq!(picked.columns(), ["c", "a"]);
        assert_eq!(picked.column("c").unwrap(), vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(table.head(3).len(), 3);
        assert!(table.select_columns(&["z"]).is_err());
    }
}
