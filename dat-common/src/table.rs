//! Uploaded table parsing and preview windows
//!
//! The first CSV record is the header; every following record is a data row,
//! kept verbatim. Rows may be shorter (or longer) than the header.

use serde::Serialize;

use crate::{Error, Result};

/// Number of data rows shown in a preview
pub const PREVIEW_SIZE: usize = 10;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A single table row: ordered string cells
pub type Row = Vec<String>;

/// Parsed upload: header plus data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedTable {
    pub header: Row,
    pub rows: Vec<Row>,
}

impl UploadedTable {
    /// Parse raw CSV bytes
    ///
    /// No trimming or type coercion is applied to cells. Fails with
    /// [`Error::InputValidation`] when the content holds no records at all
    /// or cannot be read as UTF-8 CSV.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        // Blank lines are rows too; the reader skips them, so they are
        // recovered from the raw bytes in front of each record.
        let mut records = Vec::new();
        let mut record = csv::StringRecord::new();
        loop {
            let start = usize::try_from(reader.position().byte()).unwrap_or(bytes.len());
            let more = reader.read_record(&mut record).map_err(|e| {
                Error::InputValidation(format!(
                    "Could not read CSV record {}: {}",
                    records.len() + 1,
                    e
                ))
            })?;
            let blank = blank_lines_at(bytes, start, !records.is_empty());
            records.extend(std::iter::repeat_with(Row::new).take(blank));
            if !more {
                break;
            }
            records.push(record.iter().map(str::to_string).collect::<Row>());
        }

        let mut records = records.into_iter();
        let header = records
            .next()
            .ok_or_else(|| Error::InputValidation("The uploaded file is empty.".to_string()))?;

        Ok(Self {
            header,
            rows: records.collect(),
        })
    }

    /// Preview window `rows[skip_count .. skip_count + PREVIEW_SIZE]`
    ///
    /// Clamped to the table; empty (never an error) when `skip_count` is past
    /// the last row.
    pub fn preview(&self, skip_count: usize) -> &[Row] {
        let start = skip_count.min(self.rows.len());
        let end = skip_count.saturating_add(PREVIEW_SIZE).min(self.rows.len());
        &self.rows[start..end]
    }

    /// Split rows into (passed through unscored, scored)
    ///
    /// A skip count of 1 stands for the header row, which `rows` already
    /// excludes, so only `skip_count - 1` leading data rows are passed through.
    pub fn scoring_split(&self, skip_count: usize) -> (&[Row], &[Row]) {
        let boundary = skip_count.saturating_sub(1).min(self.rows.len());
        self.rows.split_at(boundary)
    }
}

/// Count empty lines the reader discarded starting at byte `start`
///
/// The skipped run is every `\r`/`\n` byte from `start`; `\r\n` counts once.
/// When the previous record's terminator has not been consumed yet, the
/// run's first terminator belongs to that record.
fn blank_lines_at(bytes: &[u8], start: usize, after_record: bool) -> usize {
    let tail = bytes.get(start..).unwrap_or_default();
    let run = tail
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .count();
    let run_bytes = &tail[..run];

    let mut terminators = 0;
    let mut i = 0;
    while i < run_bytes.len() {
        i += if run_bytes[i..].starts_with(b"\r\n") { 2 } else { 1 };
        terminators += 1;
    }

    let previous = start.checked_sub(1).and_then(|i| bytes.get(i)).copied();
    let owes_terminator = after_record
        && terminators > 0
        && match previous {
            Some(b'\n') => false,
            Some(b'\r') => run_bytes[0] == b'\n',
            _ => true,
        };
    terminators - usize::from(owes_terminator)
}

/// Cell lookup that treats positions beyond the row's length as absent
pub fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index).map(String::as_str)
}

/// Header and preview rows handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePreview {
    pub header: Row,
    pub rows: Vec<Row>,
    pub skip_count: usize,
    pub total_rows: usize,
}

impl TablePreview {
    pub fn new(table: &UploadedTable, skip_count: usize) -> Self {
        Self {
            header: table.header.clone(),
            rows: table.preview(skip_count).to_vec(),
            skip_count,
            total_rows: table.rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn numbered_table(n: usize) -> UploadedTable {
        UploadedTable {
            header: row(&["id"]),
            rows: (0..n).map(|i| vec![i.to_string()]).collect(),
        }
    }

    #[test]
    fn test_parse_header_and_rows() {
        let table = UploadedTable::parse(b"w1,w2,w3\ncat,dog,bird\nx,y,z\n").unwrap();
        assert_eq!(table.header, row(&["w1", "w2", "w3"]));
        assert_eq!(table.rows, vec![row(&["cat", "dog", "bird"]), row(&["x", "y", "z"])]);
    }

    #[test]
    fn test_parse_keeps_cells_verbatim() {
        let table = UploadedTable::parse(b"a,b\n  padded , 42 \n").unwrap();
        assert_eq!(table.rows[0], row(&["  padded ", " 42 "]));
    }

    #[test]
    fn test_parse_ragged_rows() {
        let table = UploadedTable::parse(b"a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.rows[0], row(&["1"]));
        assert_eq!(table.rows[1], row(&["1", "2", "3", "4"]));
        assert_eq!(cell(&table.rows[0], 2), None);
        assert_eq!(cell(&table.rows[1], 2), Some("3"));
    }

    #[test]
    fn test_parse_quoted_fields() {
        let table = UploadedTable::parse(b"name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(table.rows[0], row(&["Smith, J", "said \"hi\""]));
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let table = UploadedTable::parse(b"\xEF\xBB\xBFword1,word2\ncaf\xC3\xA9,na\xC3\xAFve\n").unwrap();
        assert_eq!(table.header[0], "word1");
        assert_eq!(table.rows[0], row(&["café", "naïve"]));
    }

    #[test]
    fn test_parse_keeps_blank_lines_as_empty_rows() {
        let table = UploadedTable::parse(b"word\ncat\n\ndog\n").unwrap();
        assert_eq!(table.rows, vec![row(&["cat"]), Row::new(), row(&["dog"])]);

        let table = UploadedTable::parse(b"word\r\ncat\r\n\r\n\r\ndog\r\n").unwrap();
        assert_eq!(
            table.rows,
            vec![row(&["cat"]), Row::new(), Row::new(), row(&["dog"])]
        );
    }

    #[test]
    fn test_parse_trailing_blank_line_is_a_row() {
        let table = UploadedTable::parse(b"word\ncat\n\n").unwrap();
        assert_eq!(table.rows, vec![row(&["cat"]), Row::new()]);

        let table = UploadedTable::parse(b"word\ncat").unwrap();
        assert_eq!(table.rows, vec![row(&["cat"])]);
    }

    #[test]
    fn test_parse_quoted_newlines_are_not_blank_rows() {
        let table = UploadedTable::parse(b"note,n\n\"line one\n\nline three\",1\nx,2\n").unwrap();
        assert_eq!(
            table.rows,
            vec![row(&["line one\n\nline three", "1"]), row(&["x", "2"])]
        );
    }

    #[test]
    fn test_parse_header_only() {
        let table = UploadedTable::parse(b"only,a,header\n").unwrap();
        assert_eq!(table.header.len(), 3);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_parse_empty_input_fails() {
        let err = UploadedTable::parse(b"").unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn test_parse_invalid_utf8_fails() {
        let err = UploadedTable::parse(b"a,b\n\xFF\xFE,x\n").unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn test_preview_matches_slice_for_all_skip_counts() {
        for n in [0usize, 3, 10, 25] {
            let table = numbered_table(n);
            for k in 0..=n + PREVIEW_SIZE {
                let expected: Vec<Row> = if k >= n {
                    Vec::new()
                } else {
                    table.rows[k..(k + PREVIEW_SIZE).min(n)].to_vec()
                };
                assert_eq!(table.preview(k), expected.as_slice(), "n={} k={}", n, k);
            }
        }
    }

    #[test]
    fn test_preview_huge_skip_count_does_not_overflow() {
        let table = numbered_table(5);
        assert!(table.preview(usize::MAX).is_empty());
    }

    #[test]
    fn test_scoring_split() {
        let table = numbered_table(4);

        let (skipped, scored) = table.scoring_split(0);
        assert!(skipped.is_empty());
        assert_eq!(scored.len(), 4);

        let (skipped, scored) = table.scoring_split(1);
        assert!(skipped.is_empty());
        assert_eq!(scored.len(), 4);

        let (skipped, scored) = table.scoring_split(3);
        assert_eq!(skipped, &table.rows[..2]);
        assert_eq!(scored, &table.rows[2..]);

        let (skipped, scored) = table.scoring_split(50);
        assert_eq!(skipped.len(), 4);
        assert!(scored.is_empty());
    }

    #[test]
    fn test_table_preview_snapshot() {
        let table = numbered_table(12);
        let preview = TablePreview::new(&table, 5);
        assert_eq!(preview.header, row(&["id"]));
        assert_eq!(preview.rows.len(), 7);
        assert_eq!(preview.rows[0], row(&["5"]));
        assert_eq!(preview.skip_count, 5);
        assert_eq!(preview.total_rows, 12);
    }
}
