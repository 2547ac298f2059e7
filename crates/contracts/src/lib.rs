//! Общие типы портала контрактов Sienge: записи ERP, производные поля
//! сверки и DTO вложений. Крейт не выполняет ввод-вывод.

pub mod domain;
pub mod shared;
