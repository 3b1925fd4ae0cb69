//! Batch paste parser for spreadsheet selections.
//!
//! Users copy rows out of a spreadsheet and paste them as one text block.
//! Cells are tab-separated, but a cell may itself contain line breaks, so a
//! naive line split would cut one row into several. Instead each line is
//! tested with a record-start predicate; lines that do not start a record are
//! glued onto the previous one with `\n`.
//!
//! # Schemas
//!
//! - [`SubmissionSchema::TwoColumn`]: `responsavel \t numero`
//! - [`SubmissionSchema::FourColumn`]: `office \t responsavel \t numero \t classificacao`

use thiserror::Error;
use tracing::debug;

use crate::model::SubmissionRecord;

/// Office code that prefixes every row of the four-column export.
pub const DEFAULT_OFFICE_PREFIX: &str = "MDR";

/// Message shown when nothing in the paste could be used.
pub const FORMAT_HINT: &str = "Insira os dados no formato correto";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Insira os dados no formato correto: nenhum dado informado")]
    EmptyInput,
    #[error("Insira os dados no formato correto: {expected}")]
    NoValidRecords { expected: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionSchema {
    TwoColumn,
    #[default]
    FourColumn,
}

impl SubmissionSchema {
    pub fn min_columns(self) -> usize {
        match self {
            Self::TwoColumn => 2,
            Self::FourColumn => 4,
        }
    }

    /// Human description of the expected paste layout.
    pub fn expected_format(self) -> &'static str {
        match self {
            Self::TwoColumn => "Responsável<TAB>Número do processo",
            Self::FourColumn => "Escritório<TAB>Responsável<TAB>Número do processo<TAB>Classificação",
        }
    }

    fn map_columns(self, cols: &[&str]) -> Option<SubmissionRecord> {
        if cols.len() < self.min_columns() {
            return None;
        }
        let (responsavel, numero, classificacao) = match self {
            Self::TwoColumn => (cols[0], cols[1], None),
            Self::FourColumn => (cols[1], cols[2], Some(cols[3])),
        };
        if numero.is_empty() {
            return None;
        }
        Some(SubmissionRecord {
            responsavel: responsavel.to_string(),
            numero: numero.to_string(),
            classificacao: classificacao
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    pub records: Vec<SubmissionRecord>,
    /// Merged rows dropped for having too few columns.
    pub discarded: usize,
}

type RecordStart = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Parser for pasted submission blocks.
pub struct BatchParser {
    schema: SubmissionSchema,
    record_start: RecordStart,
}

impl Default for BatchParser {
    fn default() -> Self {
        Self::new(SubmissionSchema::default())
    }
}

impl BatchParser {
    /// Parser with the schema's default record-start heuristic.
    pub fn new(schema: SubmissionSchema) -> Self {
        let record_start: RecordStart = match schema {
            SubmissionSchema::TwoColumn => Box::new(|line: &str| line.contains('\t')),
            SubmissionSchema::FourColumn => {
                Box::new(|line: &str| office_row_start(line, DEFAULT_OFFICE_PREFIX))
            }
        };
        Self {
            schema,
            record_start,
        }
    }

    /// Replace the record-start predicate, keeping the merge algorithm.
    pub fn with_record_start<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.record_start = Box::new(predicate);
        self
    }

    /// Four-column parser whose rows begin with `prefix` instead of the default office code.
    pub fn with_office_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(SubmissionSchema::FourColumn)
            .with_record_start(move |line| office_row_start(line, &prefix))
    }

    pub fn schema(&self) -> SubmissionSchema {
        self.schema
    }

    /// Parse a pasted block. Never panics on malformed input.
    pub fn parse(&self, input: &str) -> Result<ParsedBatch, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let rows = self.merge_rows(input);
        let total = rows.len();
        let records: Vec<SubmissionRecord> = rows
            .iter()
            .filter_map(|row| {
                let cleaned = row.replace('"', "");
                let cols: Vec<&str> = cleaned.split('\t').map(str::trim).collect();
                let rec = self.schema.map_columns(&cols);
                if rec.is_none() {
                    debug!(columns = cols.len(), "discarding pasted row");
                }
                rec
            })
            .collect();

        if records.is_empty() {
            return Err(ParseError::NoValidRecords {
                expected: self.schema.expected_format(),
            });
        }

        let discarded = total - records.len();
        debug!(parsed = records.len(), discarded, "parsed pasted batch");
        Ok(ParsedBatch { records, discarded })
    }

    fn merge_rows(&self, input: &str) -> Vec<String> {
        let mut rows: Vec<String> = Vec::new();
        let mut current: Option<String> = None;

        for line in input.lines() {
            if (self.record_start)(line) {
                if let Some(done) = current.take() {
                    rows.push(done);
                }
                current = Some(line.to_string());
                continue;
            }
            match current.as_mut() {
                Some(buf) => {
                    buf.push('\n');
                    buf.push_str(line);
                }
                None if line.trim().is_empty() => {}
                None => current = Some(line.to_string()),
            }
        }
        if let Some(done) = current {
            rows.push(done);
        }
        rows
    }
}

/// Default four-column heuristic: office prefix plus at least three tabs.
pub fn office_row_start(line: &str, prefix: &str) -> bool {
    line.trim_start_matches('"').trim_start().starts_with(prefix)
        && line.matches('\t').count() >= 3
}
