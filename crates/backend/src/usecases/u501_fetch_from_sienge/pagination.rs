use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

/// Защита от API, которое игнорирует `offset` и отдаёт одну и ту же страницу
const MAX_PAGES: u64 = 10_000;

/// Источник страниц: один GET с query-параметрами, тело ответа как JSON.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str, query: &[(String, String)]) -> anyhow::Result<Value>;
}

/// Массив `results` из ответа; без массива страница считается пустой.
pub fn page_results(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Есть ли в ответе массив `results` (признак рабочего endpoint'а).
pub fn has_results_array(body: &Value) -> bool {
    body.get("results").map(Value::is_array).unwrap_or(false)
}

fn page_query(extra: &[(String, String)], limit: u32, offset: u64) -> Vec<(String, String)> {
    let mut query = extra.to_vec();
    query.push(("limit".to_string(), limit.to_string()));
    query.push(("offset".to_string(), offset.to_string()));
    query
}

/// Забирает все страницы endpoint'а: `offset` растёт на `page_size`,
/// пока не придёт пустая страница. Ошибка любой страницы прерывает загрузку.
pub async fn fetch_all(
    source: &dyn PageSource,
    url: &str,
    extra_query: &[(String, String)],
    page_size: u32,
) -> anyhow::Result<Vec<Value>> {
    if page_size == 0 {
        anyhow::bail!("page_size must be greater than 0");
    }

    let mut all = Vec::new();
    let mut offset: u64 = 0;

    for page_no in 1..=MAX_PAGES {
        let query = page_query(extra_query, page_size, offset);
        let body = source
            .fetch_page(url, &query)
            .await
            .with_context(|| format!("page {} (offset={}) of {}", page_no, offset, url))?;

        let page = page_results(body);
        tracing::debug!("{}: page {} -> {} records", url, page_no, page.len());
        if page.is_empty() {
            return Ok(all);
        }

        all.extend(page);
        offset += u64::from(page_size);
    }

    anyhow::bail!("pagination of {} did not end after {} pages", url, MAX_PAGES)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory Sienge: по URL хранится полный список записей или код ошибки.
    #[derive(Default)]
    pub struct FakeSource {
        pub records: HashMap<String, Vec<Value>>,
        pub failures: HashMap<String, u16>,
        /// URL'ы, которые отвечают объектом без `results`
        pub without_results: Vec<String>,
        /// Ответ `Err` после N успешных страниц
        pub fail_after_pages: HashMap<String, usize>,
        pub calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl FakeSource {
        pub fn with_records(mut self, url: &str, records: Vec<Value>) -> Self {
            self.records.insert(url.to_string(), records);
            self
        }

        pub fn with_failure(mut self, url: &str, status: u16) -> Self {
            self.failures.insert(url.to_string(), status);
            self
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, _)| u == url)
                .count()
        }
    }

    fn param(query: &[(String, String)], name: &str) -> usize {
        query
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0)
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, url: &str, query: &[(String, String)]) -> anyhow::Result<Value> {
            let previous = self.calls_to(url);
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), query.to_vec()));

            if let Some(status) = self.failures.get(url) {
                anyhow::bail!("HTTP {} from {}", status, url);
            }
            if let Some(limit) = self.fail_after_pages.get(url) {
                if previous >= *limit {
                    anyhow::bail!("HTTP 500 from {}", url);
                }
            }
            if self.without_results.iter().any(|u| u == url) {
                return Ok(serde_json::json!({"message": "not here"}));
            }

            let records = self.records.get(url).cloned().unwrap_or_default();
            let limit = param(query, "limit");
            let offset = param(query, "offset");
            let page: Vec<Value> = records.into_iter().skip(offset).take(limit).collect();
            Ok(serde_json::json!({ "results": page }))
        }
    }
}
