//! Output artifact assembly
//!
//! The artifact keeps every uploaded row: rows passed through unscored come
//! first with an empty score field, followed by the scored rows with their
//! rendered outcome. The narrower on-screen projection ([`ScoreReport`]) is
//! built separately and never persisted.

use std::io;

use serde::Serialize;

use crate::columns::project;
use crate::scoring::ScoreOutcome;
use crate::table::Row;
use crate::Result;

/// Name of the appended score column
pub const SCORE_COLUMN: &str = "creativity_score";

/// File name offered for the downloaded artifact
pub const DOWNLOAD_FILENAME: &str = "output_creativity_score.csv";

/// Full output table written to the artifact store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTable {
    pub header: Row,
    pub rows: Vec<Row>,
}

impl OutputTable {
    pub fn assemble<'a>(
        header: &[String],
        skipped: &[Row],
        scored: impl IntoIterator<Item = (&'a Row, &'a ScoreOutcome)>,
    ) -> Self {
        let mut output_header = header.to_vec();
        output_header.push(SCORE_COLUMN.to_string());

        let mut rows: Vec<Row> = skipped
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.push(String::new());
                row
            })
            .collect();

        rows.extend(scored.into_iter().map(|(row, outcome)| {
            let mut row = row.clone();
            row.push(outcome.to_string());
            row
        }));

        Self {
            header: output_header,
            rows,
        }
    }

    /// Write as CSV (CRLF terminators, quoting only where needed)
    ///
    /// Ragged rows keep their own length.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);

        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

/// One row of the on-screen results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub cells: Vec<String>,
    pub score: String,
}

/// Selected columns + score for the scored rows, for display only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub columns: Vec<String>,
    pub score_column: String,
    pub rows: Vec<ReportRow>,
    pub skipped_rows: usize,
    pub failed_rows: usize,
}

impl ScoreReport {
    pub fn project<'a>(
        columns: &[String],
        indices: &[usize],
        skipped_rows: usize,
        scored: impl IntoIterator<Item = (&'a Row, &'a ScoreOutcome)>,
    ) -> Self {
        let mut failed_rows = 0;
        let rows = scored
            .into_iter()
            .map(|(row, outcome)| {
                if outcome.is_failure() {
                    failed_rows += 1;
                }
                ReportRow {
                    cells: project(row, indices),
                    score: outcome.to_string(),
                }
            })
            .collect();

        Self {
            columns: columns.to_vec(),
            score_column: SCORE_COLUMN.to_string(),
            rows,
            skipped_rows,
            failed_rows,
        }
    }

    pub fn scored_rows(&self) -> usize {
        self.rows.len()
    }
}
