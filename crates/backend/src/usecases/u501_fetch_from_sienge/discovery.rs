use serde_json::Value;

use super::pagination::{fetch_all, has_results_array, PageSource};

/// Результат поиска рабочего endpoint'а измерений
#[derive(Debug, Clone, Default)]
pub struct MeasurementDiscovery {
    /// Endpoint, с которого удалось забрать измерения
    pub endpoint: Option<String>,
    pub records: Vec<Value>,
}

/// Перебирает кандидатов по порядку: пробный запрос одной короткой
/// страницы, затем полная загрузка с первого кандидата, который вернул
/// массив `results`. 404, отказ в доступе, сетевые ошибки и сбой полной
/// загрузки переводят к следующему кандидату. Если не подошёл ни один,
/// возвращается пустой список.
pub async fn discover_measurements(
    source: &dyn PageSource,
    candidates: &[String],
    page_size: u32,
    probe_page_size: u32,
) -> MeasurementDiscovery {
    tracing::info!("Probing {} measurement endpoints", candidates.len());

    let probe_query = vec![
        ("limit".to_string(), probe_page_size.to_string()),
        ("offset".to_string(), "0".to_string()),
    ];

    for (idx, endpoint) in candidates.iter().enumerate() {
        let probe = match source.fetch_page(endpoint, &probe_query).await {
            Ok(body) => body,
            Err(e) => {
                tracing::info!(
                    "Measurement probe {}/{} failed for {}: {:#}",
                    idx + 1,
                    candidates.len(),
                    endpoint,
                    e
                );
                continue;
            }
        };

        if !has_results_array(&probe) {
            tracing::info!(
                "Measurement probe {}/{}: {} answered without a results array",
                idx + 1,
                candidates.len(),
                endpoint
            );
            continue;
        }

        match fetch_all(source, endpoint, &[], page_size).await {
            Ok(records) => {
                tracing::info!(
                    "Measurement endpoint found: {} ({} records)",
                    endpoint,
                    records.len()
                );
                return MeasurementDiscovery {
                    endpoint: Some(endpoint.clone()),
                    records,
                };
            }
            Err(e) => {
                tracing::warn!("Full measurement fetch from {} failed: {:#}", endpoint, e);
            }
        }
    }

    tracing::warn!("No measurement endpoint answered; continuing without measurements");
    MeasurementDiscovery::default()
}

#[cfg(test)]
mod tests {
    use super::super::pagination::test_support::FakeSource;
    use super::*;
    use serde_json::json;

    const A: &str = "http://sienge.test/supply-contracts/measurements/all";
    const B: &str = "http://sienge.test/measurements/all";
    const C: &str = "http://sienge.test/contracts/measurements";

    fn candidates() -> Vec<String> {
        vec![A.to_string(), B.to_string(), C.to_string()]
    }

    fn measurements(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"contractId": 1, "totalLaborValue": i}))
            .collect()
    }

    #[tokio::test]
    async fn test_skips_failing_candidates() {
        let source = FakeSource::default()
            .with_failure(A, 404)
            .with_records(B, measurements(25))
            .with_records(C, measurements(3));

        let found = discover_measurements(&source, &candidates(), 10, 10).await;

        assert_eq!(found.endpoint.as_deref(), Some(B));
        assert_eq!(found.records.len(), 25);
        assert_eq!(source.calls_to(C), 0);
    }

    #[tokio::test]
    async fn test_probe_uses_probe_page_size() {
        let source = FakeSource::default().with_records(A, measurements(2));
        discover_measurements(&source, &candidates(), 200, 10).await;

        let calls = source.calls.lock().unwrap();
        let (_, probe) = &calls[0];
        assert!(probe.contains(&("limit".to_string(), "10".to_string())));
        let (_, full) = &calls[1];
        assert!(full.contains(&("limit".to_string(), "200".to_string())));
    }

    #[tokio::test]
    async fn test_body_without_results_is_skipped() {
        let mut source = FakeSource::default().with_records(B, measurements(1));
        source.without_results.push(A.to_string());

        let found = discover_measurements(&source, &candidates(), 10, 10).await;
        assert_eq!(found.endpoint.as_deref(), Some(B));
    }

    #[tokio::test]
    async fn test_failed_full_fetch_moves_on() {
        let mut source = FakeSource::default()
            .with_records(A, measurements(30))
            .with_records(B, measurements(4));
        // проба + одна страница, затем 500
        source.fail_after_pages.insert(A.to_string(), 2);

        let found = discover_measurements(&source, &candidates(), 10, 10).await;
        assert_eq!(found.endpoint.as_deref(), Some(B));
        assert_eq!(found.records.len(), 4);
    }

    #[tokio::test]
    async fn test_nothing_works_is_empty() {
        let source = FakeSource::default()
            .with_failure(A, 403)
            .with_failure(B, 404)
            .with_failure(C, 500);

        let found = discover_measurements(&source, &candidates(), 10, 10).await;
        assert!(found.endpoint.is_none());
        assert!(found.records.is_empty());
    }
}
