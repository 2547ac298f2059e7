pub mod discovery;
pub mod executor;
pub mod pagination;
pub mod retry;
pub mod sienge_api_client;

pub use executor::{get_executor, initialize, FetchExecutor};
