use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::amount::field_amount;
use crate::shared::correlation::{
    first_key, CorrelationKey, CONTRACT_NUMBER_FIELDS, MEASUREMENT_KEY_FIELDS,
};

/// Измерение (medição) по контракту, как его вернул Sienge.
///
/// Стабильного первичного ключа нет, а поле связи с контрактом может
/// называться по-разному, поэтому запись хранится как JSON-объект.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measurement {
    pub fields: Map<String, Value>,
}

impl Measurement {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Ключ связи: первое не-`null` поле из `MEASUREMENT_KEY_FIELDS`.
    /// Если его значение ключом не является, ключа нет.
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        first_key(&self.fields, &MEASUREMENT_KEY_FIELDS)
    }

    /// Совпадает ли `contractNumber`/`contract_number` измерения с номером.
    /// Сравнивается текст, тип значения не важен.
    pub fn refers_to_number(&self, number: &CorrelationKey) -> bool {
        CONTRACT_NUMBER_FIELDS
            .iter()
            .filter_map(|field| self.fields.get(*field))
            .filter_map(CorrelationKey::from_value)
            .any(|key| key.as_str() == number.as_str())
    }

    /// Измеренная сумма: работы + материалы.
    pub fn measured_amount(&self) -> f64 {
        field_amount(&self.fields, "totalLaborValue")
            + field_amount(&self.fields, "totalMaterialValue")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_correlation_priority() {
        let m = Measurement::from_value(json!({
            "id": 900,
            "supplyContractId": 15,
            "contractNumber": "CT-15"
        }))
        .unwrap();
        assert_eq!(m.correlation_key().unwrap().as_str(), "15");
    }

    #[test]
    fn test_unusable_first_field_leaves_no_key() {
        let m = Measurement::from_value(json!({
            "contractId": "",
            "id": 99,
            "contractNumber": "10",
            "totalLaborValue": 5
        }))
        .unwrap();
        assert!(m.correlation_key().is_none());

        let number = CorrelationKey::from_value(&json!("10")).unwrap();
        assert!(m.refers_to_number(&number));
    }

    #[test]
    fn test_refers_to_number() {
        let m = Measurement::from_value(json!({"contract_number": 10})).unwrap();
        let number = CorrelationKey::from_value(&json!("10")).unwrap();
        assert!(m.refers_to_number(&number));

        let other = CorrelationKey::from_value(&json!("11")).unwrap();
        assert!(!m.refers_to_number(&other));
    }

    #[test]
    fn test_measured_amount() {
        let m = Measurement::from_value(json!({
            "totalLaborValue": "1000",
            "totalMaterialValue": 500.5
        }))
        .unwrap();
        assert_eq!(m.measured_amount(), 1500.5);

        let empty = Measurement::default();
        assert_eq!(empty.measured_amount(), 0.0);
    }
}
