use axum::Json;
use contracts::domain::a002_measurement::aggregate::Measurement;

use crate::domain::a002_measurement;
use crate::usecases::u501_fetch_from_sienge::get_executor;

/// GET /api/measurements
pub async fn list_all() -> Json<Vec<Measurement>> {
    Json(a002_measurement::service::list_all(get_executor()).await)
}
