use contracts::domain::a002_measurement::aggregate::Measurement;

use crate::usecases::u501_fetch_from_sienge::FetchExecutor;

/// Измерения как есть, без обогащения. Недоступность всех endpoint'ов
/// даёт пустой список, а не ошибку.
pub async fn list_all(executor: &FetchExecutor) -> Vec<Measurement> {
    executor.fetch_measurements().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u501_fetch_from_sienge::executor::test_support::{
        executor, MEASUREMENTS_URL,
    };
    use crate::usecases::u501_fetch_from_sienge::pagination::test_support::FakeSource;
    use serde_json::json;

    #[tokio::test]
    async fn test_pass_through() {
        let raw = json!({"contractId": 7, "totalLaborValue": "10", "extra": {"a": 1}});
        let source = FakeSource::default().with_records(MEASUREMENTS_URL, vec![raw.clone()]);

        let list = list_all(&executor(source)).await;
        assert_eq!(list.len(), 1);
        assert_eq!(serde_json::to_value(&list[0]).unwrap(), raw);
    }
}
