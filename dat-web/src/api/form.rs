//! Form field parsing
//!
//! `application/x-www-form-urlencoded` bodies are decoded with
//! `url::form_urlencoded` so that repeated `columns` keys are kept in order.

use crate::{ApiError, ApiResult};

pub const DEFAULT_MIN_WORD_COUNT: usize = 7;
pub const MIN_WORD_COUNT_RANGE: (usize, usize) = (1, 20);
pub const SKIP_ROWS_RANGE: (usize, usize) = (0, 100);

/// What the selection form submit asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    /// Re-render the selection page with a new skip count
    Preview,
    /// Score the table
    Compute,
}

/// Decoded `POST /select` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectForm {
    pub columns: Vec<String>,
    pub min_word_count: usize,
    pub skip_rows: Option<usize>,
    pub action: SelectAction,
}

impl SelectForm {
    pub fn parse(body: &[u8]) -> ApiResult<Self> {
        let mut columns = Vec::new();
        let mut min_word_count = None;
        let mut skip_rows = None;
        let mut action = SelectAction::Compute;

        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "columns" => columns.push(value.into_owned()),
                "min_word_count" => min_word_count = Some(value.into_owned()),
                "skip_rows" => skip_rows = Some(value.into_owned()),
                "action" if value == "preview" => action = SelectAction::Preview,
                _ => {}
            }
        }

        let (min, max) = MIN_WORD_COUNT_RANGE;
        let min_word_count = parse_bounded("min_word_count", min_word_count.as_deref(), min, max)?
            .unwrap_or(DEFAULT_MIN_WORD_COUNT);

        let (min, max) = SKIP_ROWS_RANGE;
        let skip_rows = parse_bounded("skip_rows", skip_rows.as_deref(), min, max)?;

        Ok(Self {
            columns,
            min_word_count,
            skip_rows,
            action,
        })
    }
}

/// Parse an optional integer field, clamping it into `min..=max`
///
/// Absent or blank fields give `None`. Anything that is not an integer is a
/// 400.
pub fn parse_bounded(
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> ApiResult<Option<usize>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    let parsed: i64 = value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a whole number.")))?;

    let clamped = parsed.clamp(min as i64, max as i64);
    Ok(Some(clamped as usize))
}
