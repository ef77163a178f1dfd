//! Revenue statistics API

use crate::api::ApiResponse;
use crate::domain::StringUuid;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::service::StatisticsQuery;
use crate::state::HasServices;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RevenueQuery {
    pub role: Option<String>,
    pub user_id: Option<StringUuid>,
    pub merchant_id: Option<StringUuid>,
}

#[utoipa::path(
    get,
    path = "/api/statistics/revenue",
    tag = "Statistics",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Revenue summary", body = crate::domain::RevenueStatistics),
        (status = 403, description = "Scope not permitted")
    )
)]
pub async fn revenue<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<RevenueQuery>,
) -> Result<impl IntoResponse> {
    let stats = state
        .statistics_service()
        .revenue(
            &auth.principal(),
            StatisticsQuery {
                role: query.role,
                user_id: query.user_id,
                merchant_id: query.merchant_id,
            },
        )
        .await?;
    Ok(ApiResponse::ok(stats))
}
