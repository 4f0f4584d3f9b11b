//! Training table loader.
//!
//! Reads a header-first CSV with at least the columns in
//! [`REQUIRED_COLUMNS`]; extra columns (title, attendance_rate, notes...)
//! are ignored. Column order is free. Quoted fields with embedded commas
//! and doubled quotes are supported.
//!
//! ```ignore
//! use reward_optimizer::ml_engine::TrainingDataset;
//!
//! let dataset = TrainingDataset::from_path("events.csv")?;
//! engine.fit(dataset.records())?;
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::types::{EventFeatures, EventRecord, CATEGORICAL_COLUMNS, REQUIRED_COLUMNS};

use super::error::{EngineError, EngineResult};

/// Columns written by [`TrainingDataset::write_csv`]: the required set plus
/// the derived attendance rate.
const OUTPUT_COLUMNS: [&str; 11] = [
    "event_type",
    "organizer_type",
    "target_major",
    "target_grade",
    "weekday",
    "brand_score",
    "date_gap",
    "reward_amount",
    "attended_participants",
    "applied_participants",
    "attendance_rate",
];

/// Historical events ready for training.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingDataset {
    records: Vec<EventRecord>,
}

impl TrainingDataset {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `attended / max(applied, 1)` per row.
    pub fn attendance_rates(&self) -> Vec<f64> {
        self.records.iter().map(EventRecord::attendance_rate).collect()
    }

    /// Load a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EngineError::DataValidation(format!("cannot open {}: {e}", path.display()))
        })?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), rows = dataset.len(), "Loaded training events");
        Ok(dataset)
    }

    /// Parse CSV text.
    pub fn from_csv_str(text: &str) -> EngineResult<Self> {
        Self::from_reader(text.as_bytes())
    }

    /// Parse CSV from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> EngineResult<Self> {
        let mut lines = reader.lines().enumerate();

        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line.map_err(read_error)?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => {
                    return Err(EngineError::DataValidation(
                        "training table is empty (no header row)".to_string(),
                    ))
                }
            }
        };
        let columns = ColumnMap::from_header(&header)?;

        let mut records = Vec::new();
        for (idx, line) in lines {
            let line = line.map_err(read_error)?;
            if line.trim().is_empty() {
                continue;
            }
            // 1-based, counting the header
            let line_no = idx + 1;
            records.push(columns.parse_row(&csv_split(&line), line_no)?);
        }

        debug!(rows = records.len(), columns = columns.width, "Parsed training table");
        Ok(Self { records })
    }

    /// Write the dataset as CSV, including a derived `attendance_rate` column.
    pub fn write_csv<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "{}", OUTPUT_COLUMNS.join(","))?;
        for r in &self.records {
            let f = &r.features;
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{:.4}",
                csv_quote(&f.event_type),
                csv_quote(&f.organizer_type),
                csv_quote(&f.target_major),
                csv_quote(&f.target_grade),
                csv_quote(&f.weekday),
                f.brand_score,
                f.date_gap,
                r.reward_amount,
                r.attended_participants,
                r.applied_participants,
                r.attendance_rate(),
            )?;
        }
        Ok(())
    }
}

fn read_error(e: std::io::Error) -> EngineError {
    EngineError::DataValidation(format!("failed to read training table: {e}"))
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Position of each required column in the header.
#[derive(Debug)]
struct ColumnMap {
    index: HashMap<&'static str, usize>,
    width: usize,
}

impl ColumnMap {
    fn from_header(header: &str) -> EngineResult<Self> {
        let names: Vec<String> = csv_split(header)
            .into_iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut index = HashMap::new();
        let mut missing = Vec::new();
        for &col in &REQUIRED_COLUMNS {
            match names.iter().position(|n| n == col) {
                Some(i) => {
                    index.insert(col, i);
                }
                None => missing.push(col),
            }
        }
        if !missing.is_empty() {
            return Err(EngineError::DataValidation(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            index,
            width: names.len(),
        })
    }

    fn cell<'f>(&self, fields: &'f [String], col: &str, line: usize) -> EngineResult<&'f str> {
        let i = self.index.get(col).copied().ok_or_else(|| {
            EngineError::DataValidation(format!("unknown column '{col}'"))
        })?;
        fields.get(i).map(|s| s.trim()).ok_or_else(|| {
            EngineError::DataValidation(format!(
                "line {line}: expected {} fields, found {}",
                self.width,
                fields.len()
            ))
        })
    }

    fn number(&self, fields: &[String], col: &str, line: usize) -> EngineResult<f64> {
        let raw = self.cell(fields, col, line)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(EngineError::DataValidation(format!(
                "line {line}: column '{col}' is not a number: '{raw}'"
            ))),
        }
    }

    fn parse_row(&self, fields: &[String], line: usize) -> EngineResult<EventRecord> {
        let mut categorical: [String; 5] = Default::default();
        for (slot, col) in categorical.iter_mut().zip(CATEGORICAL_COLUMNS) {
            *slot = self.cell(fields, col, line)?.to_string();
        }
        let [event_type, organizer_type, target_major, target_grade, weekday] = categorical;

        let date_gap = self.number(fields, "date_gap", line)?;
        if date_gap < 0.0 || date_gap.fract() != 0.0 || date_gap > f64::from(u32::MAX) {
            return Err(EngineError::DataValidation(format!(
                "line {line}: date_gap must be a whole number of days >= 0, got {date_gap}"
            )));
        }
        let reward_amount = self.number(fields, "reward_amount", line)?;
        if reward_amount < 0.0 {
            return Err(EngineError::DataValidation(format!(
                "line {line}: reward_amount must be >= 0, got {reward_amount}"
            )));
        }
        let attended_participants = self.number(fields, "attended_participants", line)?;
        if attended_participants < 0.0 {
            return Err(EngineError::DataValidation(format!(
                "line {line}: attended_participants must be >= 0, got {attended_participants}"
            )));
        }

        Ok(EventRecord {
            features: EventFeatures {
                event_type,
                organizer_type,
                target_major,
                target_grade,
                weekday,
                brand_score: self.number(fields, "brand_score", line)?,
                date_gap: date_gap as u32,
            },
            reward_amount,
            attended_participants,
            applied_participants: self.number(fields, "applied_participants", line)?,
        })
    }
}

// ============================================================================
// CSV Helpers
// ============================================================================

/// Split a CSV line, honouring double-quoted fields.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn csv_quote(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
