//! Column selection: preview refresh or score computation

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Html,
};
use dat_common::{ColumnSelection, Error};

use super::cookie::session_token;
use super::form::{SelectAction, SelectForm};
use super::ui::pages;
use crate::{ApiResult, AppState};

/// POST /select
///
/// `action=preview` re-renders the selection page for a new skip count;
/// anything else scores the table and renders the results page.
pub async fn select_columns(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Html<String>> {
    let form = SelectForm::parse(&body)?;
    let token = session_token(&headers);

    match form.action {
        SelectAction::Preview => {
            let token = token.ok_or_else(Error::unknown_session)?;
            let preview = state.sessions.adjust_preview(token, form.skip_rows).await?;
            Ok(Html(pages::selection_page(
                &preview,
                &form.columns,
                form.min_word_count,
            )))
        }
        SelectAction::Compute => {
            let selection = ColumnSelection::new(form.columns, form.min_word_count)?;
            let token = token.ok_or_else(Error::unknown_session)?;
            let report = state
                .sessions
                .compute_scores(token, form.skip_rows, &selection)
                .await?;
            Ok(Html(pages::results_page(&report)))
        }
    }
}
