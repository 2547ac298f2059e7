//! Сверка контрактов с измерениями.
//!
//! Чистая функция над списками в памяти: связывает измерения с
//! контрактами по эвристике ключей, считает измеренную сумму, остаток
//! и удержание (caução). Ошибок не бывает: кривые поля дают `0`.

use contracts::domain::a001_supply_contract::aggregate::{
    EnrichedContract, SupplyContract, ALT_RETENTION_FIELDS,
};
use contracts::domain::a002_measurement::aggregate::Measurement;
use contracts::shared::correlation::CorrelationKey;
use std::collections::HashMap;

use crate::shared::format::format_brl;

/// Обогащает контракты данными измерений и счётчиками вложений.
///
/// Если измерений нет вообще (endpoint недоступен), сопоставление и
/// расчёт удержания пропускаются: `measuredValue = 0`,
/// `remainingBalance = totalValue`, `measurementCount = 0`,
/// `retentionValue = 0`.
pub fn reconcile(
    contracts: &[SupplyContract],
    measurements: &[Measurement],
    attachment_counts: &HashMap<String, i64>,
) -> Vec<EnrichedContract> {
    if measurements.is_empty() {
        tracing::warn!(
            "No measurements available; {} contracts get default measurement values",
            contracts.len()
        );
        return contracts
            .iter()
            .map(|c| EnrichedContract::new(c, 0.0, 0, 0.0, attachment_count(c, attachment_counts)))
            .collect();
    }

    let assigned = match_measurements(contracts, measurements);

    let result: Vec<EnrichedContract> = contracts
        .iter()
        .zip(assigned.iter())
        .map(|(contract, indices)| {
            let measured_value: f64 = indices
                .iter()
                .map(|&i| measurements[i].measured_amount())
                .sum();
            let retention = retention_value(contract, measured_value);
            let enriched = EnrichedContract::new(
                contract,
                measured_value,
                indices.len(),
                retention,
                attachment_count(contract, attachment_counts),
            );
            if !indices.is_empty() {
                tracing::debug!(
                    "Contract {}: {} measurements, measured {}, balance {}",
                    contract.text("contractNumber"),
                    indices.len(),
                    format_brl(enriched.measured_value),
                    format_brl(enriched.remaining_balance)
                );
            }
            enriched
        })
        .collect();

    let with_measurements = result.iter().filter(|c| c.measurement_count > 0).count();
    tracing::info!(
        "Reconciled {} contracts with {} measurements: {} contracts have measurements",
        contracts.len(),
        measurements.len(),
        with_measurements
    );

    result
}

/// Индексы измерений для каждого контракта (в порядке контрактов).
///
/// Каждое измерение достаётся не более чем одному контракту:
/// 1. измерения группируются по своему ключу связи (с учётом типа:
///    число `10` и строка `"10"` в разных группах);
/// 2. контракты по порядку пробуют свои ключи; первая найденная и ещё
///    никем не занятая группа забирается целиком, остальные ключи не
///    проверяются;
/// 3. контракты без совпадений ищут незанятые измерения, у которых
///    `contractNumber`/`contract_number` текстуально равен их номеру.
pub fn match_measurements(
    contracts: &[SupplyContract],
    measurements: &[Measurement],
) -> Vec<Vec<usize>> {
    let mut buckets: HashMap<CorrelationKey, Vec<usize>> = HashMap::new();
    for (idx, measurement) in measurements.iter().enumerate() {
        if let Some(key) = measurement.correlation_key() {
            buckets.entry(key).or_default().push(idx);
        }
    }

    let mut claimed = vec![false; measurements.len()];
    let mut assigned: Vec<Option<Vec<usize>>> = vec![None; contracts.len()];

    for (slot, contract) in assigned.iter_mut().zip(contracts) {
        for key in contract.candidate_keys() {
            if let Some(indices) = buckets.remove(&key) {
                for &i in &indices {
                    claimed[i] = true;
                }
                *slot = Some(indices);
                break;
            }
        }
    }

    for (slot, contract) in assigned.iter_mut().zip(contracts) {
        if slot.is_some() {
            continue;
        }
        let Some(number) = contract.contract_number() else {
            continue;
        };
        let indices: Vec<usize> = measurements
            .iter()
            .enumerate()
            .filter(|(i, m)| !claimed[*i] && m.refers_to_number(&number))
            .map(|(i, _)| i)
            .collect();
        if !indices.is_empty() {
            for &i in &indices {
                claimed[i] = true;
            }
            *slot = Some(indices);
        }
    }

    assigned.into_iter().map(Option::unwrap_or_default).collect()
}

/// Удержание (caução), первое положительное значение по цепочке:
/// 1. `securityDeposit.securityDepositBalance`;
/// 2. `securityDeposit.securityDepositPercentage` от измеренной суммы,
///    а если она нулевая, от стоимости контракта;
/// 3. `securityDeposit.securityDepositValue`;
/// 4. `securityDepositValue` на уровне контракта;
/// 5. первое положительное из альтернативных полей (`retentionValue`, ...);
/// 6. иначе `0`.
pub fn retention_value(contract: &SupplyContract, measured_value: f64) -> f64 {
    let balance = contract.security_deposit_amount("securityDepositBalance");
    if balance > 0.0 {
        return balance;
    }

    let percentage = contract.security_deposit_amount("securityDepositPercentage");
    if percentage > 0.0 {
        let base = if measured_value > 0.0 {
            measured_value
        } else {
            contract.total_value()
        };
        let by_percentage = (base * percentage) / 100.0;
        if by_percentage > 0.0 {
            return by_percentage;
        }
    }

    let nested_value = contract.security_deposit_amount("securityDepositValue");
    if nested_value > 0.0 {
        return nested_value;
    }

    let flat_value = contract.amount("securityDepositValue");
    if flat_value > 0.0 {
        return flat_value;
    }

    ALT_RETENTION_FIELDS
        .iter()
        .map(|field| contract.amount(field))
        .find(|v| *v > 0.0)
        .unwrap_or(0.0)
}

fn attachment_count(contract: &SupplyContract, counts: &HashMap<String, i64>) -> i64 {
    contract
        .contract_number()
        .and_then(|number| counts.get(number.as_str()).copied())
        .unwrap_or(0)
}
