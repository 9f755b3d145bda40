//! Mock Backends
//!
//! Static answers for demos and tests.

use async_trait::async_trait;

use super::{SearchBackend, WeatherBackend, WeatherReport};
use crate::error::Result;

/// Mock search backend returning three placeholder results
#[derive(Clone, Debug, Default)]
pub struct MockSearch;

#[async_trait]
impl SearchBackend for MockSearch {
    async fn search(&self, _query: &str) -> Result<Vec<String>> {
        Ok(vec![
            "First result".into(),
            "Second result".into(),
            "Third result".into(),
        ])
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

/// Mock paper index with three placeholder citations
#[derive(Clone, Debug, Default)]
pub struct MockPapers;

#[async_trait]
impl SearchBackend for MockPapers {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok([(2023, "Advances in"), (2022, "A survey of"), (2024, "Open problems in")]
            .into_iter()
            .map(|(year, lead)| format!("{lead} {query} ({year}) - Authors et al."))
            .collect())
    }

    fn name(&self) -> &str {
        "Mock academic"
    }
}

/// Mock weather backend: the same mild afternoon everywhere
#[derive(Clone, Debug, Default)]
pub struct MockWeather;

#[async_trait]
impl WeatherBackend for MockWeather {
    async fn current(&self, _location: &str) -> Result<WeatherReport> {
        Ok(WeatherReport {
            temperature_f: 72,
            conditions: "Partly Cloudy".into(),
        })
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search() {
        let results = MockSearch.search("rust").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], "First result");
    }

    #[tokio::test]
    async fn test_mock_papers_cite_the_query() {
        let results = MockPapers.search("qubits").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], "Advances in qubits (2023) - Authors et al.");
    }

    #[tokio::test]
    async fn test_mock_weather() {
        let report = MockWeather.current("Paris").await.unwrap();
        assert_eq!(report.temperature_f, 72);
        assert_eq!(report.conditions, "Partly Cloudy");
    }
}
