use serde_json::{Map, Value};

/// Приводит значение денежного поля из API Sienge к `f64`.
///
/// API отдаёт суммы то числом, то строкой (`"6000"`), иногда `null`.
/// Всё, что не удаётся разобрать, становится `0.0`: NaN и бесконечности
/// дальше не распространяются.
pub fn to_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

/// Разбор суммы из строки, `0.0` при ошибке.
pub fn parse_amount(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Сумма из поля записи; отсутствующее поле даёт `0.0`.
pub fn field_amount(fields: &Map<String, Value>, key: &str) -> f64 {
    fields.get(key).map(to_amount).unwrap_or(0.0)
}
