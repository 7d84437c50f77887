//! Weather lookup tool — stub that returns mock weather data.
//!
//! In production this would call a real weather API. The stub returns
//! plausible, deterministic data so turns that mix text and tool calls
//! can be exercised end to end without network access.

use async_trait::async_trait;
use patchchat_core::error::ToolError;
use patchchat_core::tool::Tool;
use serde_json::json;

pub struct LookupWeatherTool;

#[async_trait]
impl Tool for LookupWeatherTool {
    fn name(&self) -> &str {
        "lookupWeather"
    }

    fn description(&self) -> &str {
        "Look up current weather conditions for a location. Returns temperature, conditions, humidity, and wind."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city name or location to look up weather for"
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units (default: metric)"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;
        let units = arguments["units"].as_str().unwrap_or("metric");

        Ok(mock_weather(location, units))
    }
}

const CONDITIONS: [&str; 7] = [
    "Sunny",
    "Scattered clouds",
    "Drizzle",
    "Showers",
    "Windy",
    "Hazy",
    "Sleet",
];
const WIND_DIRECTIONS: [&str; 8] = ["N", "NNE", "ENE", "E", "SSE", "SW", "WSW", "NW"];

/// Deterministic mock weather: FNV-1a over the location name seeds
/// every field, so repeated lookups for the same place agree.
fn mock_weather(location: &str, units: &str) -> serde_json::Value {
    let seed = location.bytes().fold(0x811c_9dc5_u32, |acc, b| {
        (acc ^ b as u32).wrapping_mul(0x0100_0193)
    });

    let celsius = ((seed >> 8) % 38) as f64 - 4.0;
    let (temperature, unit_label) = if units == "imperial" {
        (celsius * 1.8 + 32.0, "°F")
    } else {
        (celsius, "°C")
    };

    json!({
        "location": location,
        "temperature": (temperature * 10.0).round() / 10.0,
        "units": unit_label,
        "conditions": CONDITIONS[(seed >> 16) as usize % CONDITIONS.len()],
        "humidity": 25 + (seed >> 4) % 70,
        "windSpeed": ((seed >> 12) % 28) as f64 + 3.0,
        "windDirection": WIND_DIRECTIONS[(seed >> 24) as usize % WIND_DIRECTIONS.len()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_returns_weather() {
        let output = LookupWeatherTool
            .execute(json!({"location": "Tokyo"}))
            .await
            .unwrap();

        assert_eq!(output["location"], "Tokyo");
        assert!(output["temperature"].is_number());
        assert!(output["conditions"].is_string());
    }

    #[tokio::test]
    async fn imperial_units() {
        let output = LookupWeatherTool
            .execute(json!({"location": "New York", "units": "imperial"}))
            .await
            .unwrap();

        assert_eq!(output["units"], "°F");
    }

    #[tokio::test]
    async fn deterministic_results() {
        let first = LookupWeatherTool
            .execute(json!({"location": "London"}))
            .await
            .unwrap();
        let second = LookupWeatherTool
            .execute(json!({"location": "London"}))
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fields_come_from_local_tables() {
        let output = LookupWeatherTool
            .execute(json!({"location": "Reykjavik"}))
            .await
            .unwrap();

        let conditions = output["conditions"].as_str().unwrap();
        assert!(CONDITIONS.contains(&conditions));
        let direction = output["windDirection"].as_str().unwrap();
        assert!(WIND_DIRECTIONS.contains(&direction));
    }

    #[tokio::test]
    async fn missing_location_is_invalid() {
        let err = LookupWeatherTool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn tool_declaration() {
        let decl = LookupWeatherTool.to_declaration();
        assert_eq!(decl.name, "lookupWeather");
        assert_eq!(decl.parameters["required"][0], "location");
    }
}
