pub mod a001_supply_contract;
pub mod a002_measurement;
pub mod a003_attachment;
