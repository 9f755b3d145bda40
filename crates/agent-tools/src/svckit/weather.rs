//! Weather Tool

use std::sync::Arc;

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;

use super::string_arg;
use crate::backend::{MockWeather, WeatherBackend};

/// Current weather through a [`WeatherBackend`]
pub struct WeatherTool {
    backend: Arc<dyn WeatherBackend>,
}

impl WeatherTool {
    pub fn new(backend: Arc<dyn WeatherBackend>) -> Self {
        Self { backend }
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new(Arc::new(MockWeather))
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("weather", "Get the current weather for a location").param(
            ParameterSchema::required("location", "string", "City or place name, e.g. 'Paris'"),
        )
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let location = string_arg(arguments, "location")?;
        let report = self.backend.current(&location).await?;

        Ok(format!(
            "{} weather for {location}: {}°F, {}",
            self.backend.name(),
            report.temperature_f,
            report.conditions
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_weather_report() {
        let args = json!({"location": "Paris"}).as_object().cloned().unwrap();
        let output = WeatherTool::default().invoke(&args).await.unwrap();
        assert_eq!(output, "Mock weather for Paris: 72°F, Partly Cloudy");
    }

    #[tokio::test]
    async fn test_missing_location() {
        let err = WeatherTool::default().invoke(&Arguments::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing argument: location");
    }
}
