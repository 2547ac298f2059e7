use anyhow::Context;
use contracts::domain::a001_supply_contract::aggregate::SupplyContract;
use contracts::domain::a002_measurement::aggregate::Measurement;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;

use super::discovery::discover_measurements;
use super::pagination::{fetch_all, PageSource};
use super::retry::RetryPolicy;
use super::sienge_api_client::SiengeApiClient;
use crate::shared::config::{Config, SiengeConfig};

static EXECUTOR: OnceCell<FetchExecutor> = OnceCell::new();

/// Executor загрузки контрактов и измерений из Sienge
pub struct FetchExecutor {
    source: Arc<dyn PageSource>,
    config: SiengeConfig,
}

impl FetchExecutor {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = SiengeApiClient::new(&config.sienge, RetryPolicy::from_config(&config.retry))?;
        Ok(Self::with_source(Arc::new(client), config.sienge.clone()))
    }

    pub fn with_source(source: Arc<dyn PageSource>, config: SiengeConfig) -> Self {
        Self { source, config }
    }

    /// Все контракты поставки. Обязательный источник: любая ошибка
    /// возвращается вызывающему.
    pub async fn fetch_contracts(&self) -> anyhow::Result<Vec<SupplyContract>> {
        let extra = vec![
            (
                "contractStartDate".to_string(),
                self.config.contract_start_date.clone(),
            ),
            (
                "contractEndDate".to_string(),
                self.config.contract_end_date.clone(),
            ),
        ];

        let raw = fetch_all(
            self.source.as_ref(),
            &self.config.contracts_url,
            &extra,
            self.config.page_size,
        )
        .await
        .context("fetching supply contracts from Sienge")?;

        let contracts = into_records(raw, SupplyContract::from_value, "contract");
        tracing::info!("Sienge: {} supply contracts", contracts.len());
        Ok(contracts)
    }

    /// Все измерения. Необязательный источник: при недоступности всех
    /// endpoint'ов возвращается пустой список.
    pub async fn fetch_measurements(&self) -> Vec<Measurement> {
        let found = discover_measurements(
            self.source.as_ref(),
            &self.config.measurement_urls,
            self.config.page_size,
            self.config.probe_page_size,
        )
        .await;

        let measurements = into_records(found.records, Measurement::from_value, "measurement");
        tracing::info!(
            "Sienge: {} measurements (endpoint: {})",
            measurements.len(),
            found.endpoint.as_deref().unwrap_or("none")
        );
        measurements
    }
}

/// Оставляет только JSON-объекты; остальное пропускается с debug-логом.
fn into_records<T>(raw: Vec<Value>, convert: fn(Value) -> Option<T>, kind: &str) -> Vec<T> {
    let total = raw.len();
    let records: Vec<T> = raw.into_iter().filter_map(convert).collect();
    if records.len() < total {
        tracing::debug!("Skipped {} non-object {} records", total - records.len(), kind);
    }
    records
}

pub fn initialize(config: &Config) -> anyhow::Result<()> {
    let executor = FetchExecutor::new(config)?;
    EXECUTOR
        .set(executor)
        .map_err(|_| anyhow::anyhow!("Sienge executor already initialized"))
}

pub fn get_executor() -> &'static FetchExecutor {
    EXECUTOR
        .get()
        .expect("Sienge executor has not been initialized")
}
