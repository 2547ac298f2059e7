use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::amount::{field_amount, to_amount};
use crate::shared::correlation::{
    candidate_keys, first_key, CorrelationKey, CONTRACT_KEY_FIELDS, CONTRACT_NUMBER_FIELDS,
};

// ============================================================================
// Raw record
// ============================================================================

/// Поля альтернативных названий удержания (caução), по приоритету.
pub const ALT_RETENTION_FIELDS: [&str; 5] = [
    "retentionValue",
    "warrantyValue",
    "guaranteeValue",
    "depositValue",
    "cautionValue",
];

/// Имена производных полей, которые добавляет сверка.
pub const DERIVED_FIELDS: [&str; 6] = [
    "totalValue",
    "measuredValue",
    "remainingBalance",
    "measurementCount",
    "retentionValue",
    "attachmentCount",
];

/// Контракт поставки в том виде, в каком его вернул Sienge
/// (`/supply-contracts/all`).
///
/// Схема у API нестабильная, поэтому запись хранится как JSON-объект,
/// а нужные поля читаются через методы доступа. Все поля передаются
/// клиенту без изменений.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplyContract {
    pub fields: Map<String, Value>,
}

impl SupplyContract {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Запись из произвольного JSON; не-объекты отбрасываются.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Номер контракта (натуральный ключ) в текстовой форме.
    pub fn contract_number(&self) -> Option<CorrelationKey> {
        first_key(&self.fields, &CONTRACT_NUMBER_FIELDS[..1])
    }

    /// Ключи, по которым контракт ищет свои измерения, в порядке приоритета.
    pub fn candidate_keys(&self) -> Vec<CorrelationKey> {
        candidate_keys(&self.fields, &CONTRACT_KEY_FIELDS)
    }

    /// Текстовое поле для отображения; пустая строка, если поля нет.
    pub fn text(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn amount(&self, key: &str) -> f64 {
        field_amount(&self.fields, key)
    }

    pub fn total_labor_value(&self) -> f64 {
        self.amount("totalLaborValue")
    }

    pub fn total_material_value(&self) -> f64 {
        self.amount("totalMaterialValue")
    }

    /// Стоимость контракта: работы + материалы.
    pub fn total_value(&self) -> f64 {
        self.total_labor_value() + self.total_material_value()
    }

    /// Вложенный объект `securityDeposit`, если он есть.
    pub fn security_deposit(&self) -> Option<&Map<String, Value>> {
        self.fields.get("securityDeposit").and_then(Value::as_object)
    }

    /// Сумма из `securityDeposit.<key>`.
    pub fn security_deposit_amount(&self, key: &str) -> f64 {
        self.security_deposit()
            .and_then(|deposit| deposit.get(key))
            .map(to_amount)
            .unwrap_or(0.0)
    }
}

// ============================================================================
// Enriched record
// ============================================================================

/// Контракт после сверки с измерениями и вложениями.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContract {
    #[serde(flatten)]
    pub contract: SupplyContract,

    /// Работы + материалы
    pub total_value: f64,
    /// Сумма работ и материалов по сопоставленным измерениям
    pub measured_value: f64,
    /// `total_value - measured_value`, может быть отрицательным
    pub remaining_balance: f64,
    pub measurement_count: usize,
    /// Удержание (caução)
    pub retention_value: f64,
    pub attachment_count: i64,
}

impl EnrichedContract {
    /// Собирает обогащённый контракт. Одноимённые производным поля
    /// исходной записи удаляются, чтобы в JSON не было дублей ключей.
    pub fn new(
        contract: &SupplyContract,
        measured_value: f64,
        measurement_count: usize,
        retention_value: f64,
        attachment_count: i64,
    ) -> Self {
        let total_value = contract.total_value();
        let mut fields = contract.fields.clone();
        for key in DERIVED_FIELDS {
            fields.remove(key);
        }

        Self {
            contract: SupplyContract::new(fields),
            total_value,
            measured_value,
            remaining_balance: total_value - measured_value,
            measurement_count,
            retention_value,
            attachment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract(v: Value) -> SupplyContract {
        SupplyContract::from_value(v).unwrap()
    }

    #[test]
    fn test_total_value_coerces_strings() {
        let c = contract(json!({
            "contractNumber": "10",
            "totalLaborValue": "6000",
            "totalMaterialValue": 4000
        }));
        assert_eq!(c.total_value(), 10000.0);
        assert_eq!(c.contract_number().unwrap().as_str(), "10");
    }

    #[test]
    fn test_security_deposit_nested() {
        let c = contract(json!({
            "securityDeposit": {"securityDepositPercentage": "5"}
        }));
        assert_eq!(c.security_deposit_amount("securityDepositPercentage"), 5.0);
        assert_eq!(c.security_deposit_amount("securityDepositBalance"), 0.0);

        let flat = contract(json!({"securityDeposit": 12}));
        assert!(flat.security_deposit().is_none());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(SupplyContract::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn test_enriched_serializes_flat() {
        let c = contract(json!({
            "contractNumber": "10",
            "status": "ACTIVE",
            "totalLaborValue": "6000",
            "retentionValue": 3
        }));
        let enriched = EnrichedContract::new(&c, 1500.0, 1, 0.0, 2);
        let v = serde_json::to_value(&enriched).unwrap();

        assert_eq!(v["contractNumber"], "10");
        assert_eq!(v["status"], "ACTIVE");
        assert_eq!(v["totalValue"], 6000.0);
        assert_eq!(v["measuredValue"], 1500.0);
        assert_eq!(v["remainingBalance"], 4500.0);
        assert_eq!(v["measurementCount"], 1);
        assert_eq!(v["retentionValue"], 0.0);
        assert_eq!(v["attachmentCount"], 2);
    }
}
