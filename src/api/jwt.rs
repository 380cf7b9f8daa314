use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::state::AppState;

pub async fn get_application(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<i64>,
) -> GatewayResult<Json<Value>> {
    let application = state.token_exchange.fetch_application(app_id).await?;
    Ok(Json(application))
}
