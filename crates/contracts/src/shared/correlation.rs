use serde_json::{Map, Value};
use std::fmt;

/// Поля измерения, из которых берётся ключ связи с контрактом (по приоритету).
pub const MEASUREMENT_KEY_FIELDS: [&str; 6] = [
    "contractId",
    "supplyContractId",
    "contract_id",
    "id",
    "contractNumber",
    "contract_number",
];

/// Поля контракта, которые пробуются против индекса измерений (по приоритету).
pub const CONTRACT_KEY_FIELDS: [&str; 5] = [
    "id",
    "contractId",
    "contract_id",
    "contractNumber",
    "contract_number",
];

/// Поля с номером контракта, используемые в текстовом fallback.
pub const CONTRACT_NUMBER_FIELDS: [&str; 2] = ["contractNumber", "contract_number"];

/// Ключ связи измерения с контрактом.
///
/// Тип JSON-значения сохраняется: число `10` и строка `"10"` это разные
/// ключи, как в исходных данных Sienge, где id и номера контрактов
/// пересекаются. Текстовое сравнение нужно только для fallback по
/// номеру контракта, см. [`CorrelationKey::as_str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CorrelationKey {
    Number(String),
    Text(String),
}

impl CorrelationKey {
    /// Ключ из скалярного JSON-значения. Пустая строка, `0`, bool,
    /// массивы и объекты ключом не являются.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(Self::Number(n.to_string())),
            _ => None,
        }
    }

    /// Текстовая форма ключа, без учёта типа.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Number(s) | Self::Text(s) => s,
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ключ из первого не-`null` поля среди `fields`.
///
/// Следующие поля не проверяются, даже если первое значение ключом не
/// является (например `""`): такая запись в поиск по ключу не попадает.
pub fn first_key(record: &Map<String, Value>, fields: &[&str]) -> Option<CorrelationKey> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .find(|value| !value.is_null())
        .and_then(CorrelationKey::from_value)
}

/// Все пригодные ключи среди `fields`, в порядке приоритета.
pub fn candidate_keys(record: &Map<String, Value>, fields: &[&str]) -> Vec<CorrelationKey> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .filter_map(CorrelationKey::from_value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_and_string_are_distinct() {
        let number = CorrelationKey::from_value(&json!(10)).unwrap();
        let text = CorrelationKey::from_value(&json!("10")).unwrap();
        assert_ne!(number, text);
        assert_eq!(number.as_str(), text.as_str());
    }

    #[test]
    fn test_first_key_skips_only_nulls() {
        let record = obj(json!({
            "contractId": null,
            "supplyContractId": 77,
            "id": 5
        }));
        let key = first_key(&record, &MEASUREMENT_KEY_FIELDS).unwrap();
        assert_eq!(key, CorrelationKey::Number("77".to_string()));
    }

    #[test]
    fn test_first_key_stops_at_unusable_value() {
        let record = obj(json!({"contractId": "", "id": 99, "contractNumber": "10"}));
        assert!(first_key(&record, &MEASUREMENT_KEY_FIELDS).is_none());

        let zero = obj(json!({"contractId": 0, "id": 99}));
        assert!(first_key(&zero, &MEASUREMENT_KEY_FIELDS).is_none());
    }

    #[test]
    fn test_first_key_none() {
        let record = obj(json!({"totalLaborValue": 10, "contractId": false}));
        assert!(first_key(&record, &MEASUREMENT_KEY_FIELDS).is_none());
    }

    #[test]
    fn test_candidate_keys_keep_priority() {
        let record = obj(json!({
            "contractNumber": "CT-1",
            "id": 9,
            "contract_id": null
        }));
        let keys: Vec<String> = candidate_keys(&record, &CONTRACT_KEY_FIELDS)
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["9", "CT-1"]);
    }
}
