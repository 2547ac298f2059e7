use contracts::domain::a001_supply_contract::aggregate::EnrichedContract;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;

use super::reconciliation::reconcile;
use crate::domain::a003_attachment::repository as attachment_repository;
use crate::shared::api_error::{ApiError, ApiResult};
use crate::shared::format::format_amount;
use crate::usecases::u501_fetch_from_sienge::FetchExecutor;

const CSV_HEADERS: [&str; 14] = [
    "Número do Contrato",
    "Status",
    "Empresa",
    "Fornecedor",
    "Data de Início",
    "Data de Vencimento",
    "Valor Mão de Obra",
    "Valor Material",
    "Valor Total",
    "Valor Medido",
    "Saldo",
    "Medições",
    "Caução",
    "Anexos",
];

/// Контракты из Sienge, сверенные с измерениями и вложениями.
///
/// Ошибка загрузки контрактов фатальна для запроса; пустой список
/// контрактов тоже считается ошибкой. Измерения и счётчики вложений
/// необязательны: при сбое используются пустые значения.
pub async fn list_enriched(
    executor: &FetchExecutor,
    conn: &DatabaseConnection,
) -> ApiResult<Vec<EnrichedContract>> {
    let contracts = executor
        .fetch_contracts()
        .await
        .map_err(ApiError::Upstream)?;
    if contracts.is_empty() {
        return Err(ApiError::EmptyContractFeed);
    }

    let measurements = executor.fetch_measurements().await;

    let attachment_counts = match attachment_repository::counts_by_contract(conn).await {
        Ok(counts) => counts,
        Err(e) => {
            tracing::warn!("Attachment counts unavailable, using zeros: {:#}", e);
            HashMap::new()
        }
    };

    Ok(reconcile(&contracts, &measurements, &attachment_counts))
}

/// CSV со сводкой по контрактам, суммы с двумя знаками.
pub fn export_csv(contracts: &[EnrichedContract]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for c in contracts {
        let source = &c.contract;
        writer.write_record([
            source.text("contractNumber"),
            source.text("status"),
            source.text("companyName"),
            source.text("supplierName"),
            source.text("startDate"),
            source.text("endDate"),
            format_amount(source.total_labor_value()),
            format_amount(source.total_material_value()),
            format_amount(c.total_value),
            format_amount(c.measured_value),
            format_amount(c.remaining_balance),
            c.measurement_count.to_string(),
            format_amount(c.retention_value),
            c.attachment_count.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}
