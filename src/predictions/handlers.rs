use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::session::CurrentUser,
    cookies,
    error::AppError,
    flash::{Flash, IncomingFlash},
    predictions::{
        dto::PredictForm,
        services::{load_dashboard, submit_prediction, PredictionError},
        tips::get_tips,
    },
    state::AppState,
    views::{self, Page},
};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/predict", get(predict_page).post(predict))
}

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/api/tips/:category", get(api_tips))
}

#[instrument(skip(state, current, flash), fields(user_id = %current.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
    IncomingFlash(flash): IncomingFlash,
) -> Result<Page, AppError> {
    let summary = load_dashboard(state.store.as_ref(), &current.email).await?;
    Ok(Page::new("Dashboard", views::dashboard_body(&current.name, &summary))
        .user(Some(current.name.as_str()))
        .flash(flash))
}

pub async fn predict_page(current: CurrentUser, IncomingFlash(flash): IncomingFlash) -> Page {
    Page::new("Predict", views::predict_body(&PredictForm::default(), None))
        .user(Some(current.name.as_str()))
        .flash(flash)
}

#[instrument(skip(state, current, form), fields(user_id = %current.id))]
pub async fn predict(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<PredictForm>,
) -> Response {
    let result = submit_prediction(
        state.store.as_ref(),
        state.classifier.as_ref(),
        &current.email,
        &form,
    )
    .await;

    let (outcome, flash) = match result {
        Ok(outcome) => {
            let flash = if outcome.record.is_some() {
                Flash::success("Prediction completed.")
            } else {
                Flash::error("Prediction completed, but it could not be saved to your history.")
            };
            (Some(outcome), flash)
        }
        Err(PredictionError::InvalidMeasurements) => {
            (None, Flash::error(PredictionError::InvalidMeasurements.to_string()))
        }
        Err(e @ PredictionError::Inference(_)) => {
            warn!(error = %e, "classifier failed");
            return cookies::redirect("/predict", [Flash::error(e.to_string()).cookie()]);
        }
    };

    Page::new("Predict", views::predict_body(&form, outcome.as_ref()))
        .user(Some(current.name.as_str()))
        .flash(Some(flash))
        .into_response()
}

pub async fn api_tips(Path(category): Path<String>) -> Json<&'static [&'static str]> {
    Json(get_tips(&category))
}
