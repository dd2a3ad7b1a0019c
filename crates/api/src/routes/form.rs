//! HTML Form Routes

use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Response},
};
use feature_engine::PropertyInput;

use crate::pages::{render_page, Outcome};
use crate::SharedState;

/// Render the empty form with default values
pub async fn show_form(State(state): State<SharedState>) -> Html<String> {
    Html(render_page(
        &PropertyInput::default(),
        state.validator.config(),
        None,
    ))
}

/// Handle a form submission: one pipeline pass, then the form again with the result
pub async fn submit_form(
    State(state): State<SharedState>,
    Form(input): Form<PropertyInput>,
) -> Response {
    let limits = state.validator.config();
    match state.predict(&input) {
        Ok(result) => Html(render_page(&input, limits, Some(&Outcome::Prediction(&result))))
            .into_response(),
        Err(e) => (
            e.status(),
            Html(render_page(&input, limits, Some(&Outcome::Errors(e.messages())))),
        )
            .into_response(),
    }
}
