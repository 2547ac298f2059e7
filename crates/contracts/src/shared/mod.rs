pub mod amount;
pub mod correlation;
