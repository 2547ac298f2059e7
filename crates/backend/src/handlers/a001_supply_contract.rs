use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use contracts::domain::a001_supply_contract::aggregate::EnrichedContract;

use crate::domain::a001_supply_contract;
use crate::shared::api_error::{ApiError, ApiResult};
use crate::shared::data::db::get_connection;
use crate::usecases::u501_fetch_from_sienge::get_executor;

/// GET /api/contracts
pub async fn list_all() -> ApiResult<Json<Vec<EnrichedContract>>> {
    let contracts =
        a001_supply_contract::service::list_enriched(get_executor(), get_connection()).await?;
    Ok(Json(contracts))
}

/// GET /api/contracts/export
pub async fn export_csv() -> ApiResult<Response> {
    let contracts =
        a001_supply_contract::service::list_enriched(get_executor(), get_connection()).await?;
    let csv = a001_supply_contract::service::export_csv(&contracts).map_err(ApiError::Storage)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"contratos.csv\""),
            ),
        ],
        csv,
    )
        .into_response())
}
