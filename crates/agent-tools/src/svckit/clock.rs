//! Time Tool
//!
//! Current wall-clock time in an IANA timezone.

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::string_arg_or;
use crate::error::{Result, ToolError};

/// Reports the current time in a timezone (default UTC)
#[derive(Clone, Debug, Default)]
pub struct TimeTool;

fn time_in(timezone: &str, now: DateTime<Utc>) -> Result<String> {
    let tz: Tz = timezone
        .trim()
        .parse()
        .map_err(|_| ToolError::UnknownTimezone(timezone.to_string()))?;

    Ok(format!(
        "Current time in {timezone}: {}",
        now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z")
    ))
}

#[async_trait]
impl Tool for TimeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("time", "Get the current time in a specific timezone").param(
            ParameterSchema::optional(
                "timezone",
                "string",
                "IANA timezone name, e.g. 'Europe/Paris'",
            )
            .with_default(serde_json::json!("UTC")),
        )
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let timezone = string_arg_or(arguments, "timezone", "UTC")?;
        Ok(time_in(&timezone, Utc::now())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_time_in_utc() {
        assert_eq!(
            time_in("UTC", noon_utc()).unwrap(),
            "Current time in UTC: 2024-01-15 12:00:00 UTC"
        );
    }

    #[test]
    fn test_time_in_named_zone() {
        let output = time_in("Asia/Tokyo", noon_utc()).unwrap();
        assert_eq!(output, "Current time in Asia/Tokyo: 2024-01-15 21:00:00 JST");
    }

    #[test]
    fn test_unknown_timezone() {
        let err = time_in("Mars/Olympus", noon_utc()).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTimezone(_)));
        assert!(err.to_string().contains("Please use a valid timezone name"));
    }

    #[tokio::test]
    async fn test_default_timezone_is_utc() {
        let output = TimeTool.invoke(&Arguments::new()).await.unwrap();
        assert!(output.starts_with("Current time in UTC: "));
    }
}
