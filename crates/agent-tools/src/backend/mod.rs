//! Lookup Backends
//!
//! Data sources behind the search and `weather` tools. Only mocks ship
//! today; a real search or weather API plugs in by implementing the trait.

mod mock;

pub use mock::{MockPapers, MockSearch, MockWeather};

use async_trait::async_trait;

use crate::error::Result;

/// Web search backend (Strategy pattern)
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Result titles for a query, best first
    async fn search(&self, query: &str) -> Result<Vec<String>>;

    /// Backend name, shown in tool output
    fn name(&self) -> &str;
}

/// Current conditions at a location
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReport {
    pub temperature_f: i32,
    pub conditions: String,
}

/// Weather backend (Strategy pattern)
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn current(&self, location: &str) -> Result<WeatherReport>;

    fn name(&self) -> &str;
}
