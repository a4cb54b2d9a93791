//! Comma-separated persistence for [`ResultTable`].
//!
//! Header is the label column (if any), the data columns, then
//! `converged`. Floats are written in shortest round-trip form and missing
//! values as `NaN`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::table::{CONVERGED_COLUMN, Record, ResultTable};
use crate::{ResultsError, ResultsResult};

/// Write `table` to `path`. The parent directory must already exist.
pub fn write_csv(table: &ResultTable, path: &Path) -> ResultsResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(table.to_delimited_text(',').as_bytes())?;
    writer.flush()?;
    debug!(path = %path.display(), rows = table.len(), "wrote csv");
    Ok(())
}

/// Read a table previously written by [`write_csv`].
///
/// The first column is treated as the label column when any of its values
/// does not parse as a number.
pub fn read_csv(path: &Path) -> ResultsResult<ResultTable> {
    let text = std::fs::read_to_string(path)?;
    parse_csv(&text)
}

pub(crate) fn parse_csv(text: &str) -> ResultsResult<ResultTable> {
    let records = split_records(text)?;
    let Some((header, body)) = records.split_first() else {
        return Err(ResultsError::Parse {
            line: 1,
            message: "missing header".to_string(),
        });
    };

    let has_converged = header.last().is_some_and(|h| h == CONVERGED_COLUMN);
    let data_end = if has_converged {
        header.len() - 1
    } else {
        header.len()
    };

    for (i, fields) in body.iter().enumerate() {
        if fields.len() != header.len() {
            return Err(ResultsError::Parse {
                line: i + 2,
                message: format!("expected {} fields, found {}", header.len(), fields.len()),
            });
        }
    }

    let labeled = data_end > 0
        && !body.is_empty()
        && body.iter().any(|f| parse_value(&f[0]).is_none());
    let first_data = usize::from(labeled);

    let columns: Vec<String> = header[first_data..data_end].to_vec();
    let mut table = ResultTable::with_columns(columns.clone());
    if labeled {
        table = table.with_label_column(header[0].clone());
    }

    for (i, fields) in body.iter().enumerate() {
        let line = i + 2;
        let mut values = Vec::with_capacity(columns.len());
        for (name, raw) in columns.iter().zip(&fields[first_data..data_end]) {
            let value = parse_value(raw).ok_or_else(|| ResultsError::Parse {
                line,
                message: format!("column '{name}': '{raw}' is not a number"),
            })?;
            values.push((name.clone(), value));
        }
        let converged = if has_converged {
            match fields[data_end].trim() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(ResultsError::Parse {
                        line,
                        message: format!("'{other}' is not a converged flag"),
                    });
                }
            }
        } else {
            true
        };
        table.append(Record {
            label: labeled.then(|| fields[0].clone()),
            fields: values,
            converged,
        })?;
    }
    Ok(table)
}

fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    raw.parse().ok()
}

/// Split text into records of unquoted fields. Quoted fields may contain
/// commas, doubled quotes and line breaks.
fn split_records(text: &str) -> ResultsResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                line += 1;
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(ResultsError::Parse {
            line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    records.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    Ok(records)
}
