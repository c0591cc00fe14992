//! OpenWeatherMap client and the `get_weather` tool built on it.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::air_quality;
use crate::config::WeatherConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const NOT_FOUND_REPLY: &str = "Could not find weather for";
const UNAVAILABLE_REPLY: &str = "Weather service currently unavailable.";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no weather found for '{location}' (status {status})")]
    NotFound { location: String, status: StatusCode },

    #[error("air pollution API returned status {0}")]
    Status(StatusCode),

    #[error("response is missing {0}")]
    MissingData(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub location: String,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub humidity: Option<u8>,
    pub description: String,
    pub coord: Option<Coord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQuality {
    pub index: u8,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

// Wire shapes for the two endpoints; only the fields we read.
#[derive(Deserialize)]
struct WeatherResponse {
    name: Option<String>,
    coord: Option<Coord>,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Deserialize)]
struct PollutionResponse {
    #[serde(default)]
    list: Vec<PollutionEntry>,
}

#[derive(Deserialize)]
struct PollutionEntry {
    main: PollutionMain,
    #[serde(default)]
    components: Components,
}

#[derive(Deserialize)]
struct PollutionMain {
    aqi: u8,
}

#[derive(Deserialize, Default)]
struct Components {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    units: String,
}

impl WeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
        }
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        Self::new(config.api_key.clone().unwrap_or_default())
            .with_base_url(config.base_url.clone())
            .with_units(config.units.clone())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Symbol for temperatures returned under the configured units.
    pub fn temperature_unit(&self) -> &'static str {
        match self.units.as_str() {
            "imperial" => "°F",
            "standard" => "K",
            _ => "°C",
        }
    }

    /// Current conditions for a city name.
    pub async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("q", location), ("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::NotFound { location: location.to_string(), status });
        }

        let body: WeatherResponse = response.json().await?;
        let description = body
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or(WeatherError::MissingData("weather[0].description"))?;

        Ok(CurrentWeather {
            location: body.name.unwrap_or_else(|| location.to_string()),
            temperature: body.main.temp,
            feels_like: body.main.feels_like,
            humidity: body.main.humidity,
            description,
            coord: body.coord,
        })
    }

    /// Air pollution at a coordinate.
    pub async fn air_quality(&self, coord: Coord) -> Result<AirQuality, WeatherError> {
        let url = format!("{}/data/2.5/air_pollution", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let body: PollutionResponse = response.json().await?;
        let entry = body
            .list
            .into_iter()
            .next()
            .ok_or(WeatherError::MissingData("list[0]"))?;
        Ok(AirQuality {
            index: entry.main.aqi,
            pm2_5: entry.components.pm2_5,
            pm10: entry.components.pm10,
        })
    }
}

/// `get_weather`: current weather for a city, optionally with air quality.
///
/// Lookup failures are reported to the model as plain text rather than as
/// tool errors, so the agent can still answer.
#[derive(Debug, Clone)]
pub struct WeatherTool {
    client: WeatherClient,
    include_air_quality: bool,
}

impl WeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self { client, include_air_quality: false }
    }

    pub fn with_air_quality(mut self, enabled: bool) -> Self {
        self.include_air_quality = enabled;
        self
    }

    pub async fn report(&self, location: &str) -> String {
        let weather = match self.client.current(location).await {
            Ok(weather) => weather,
            Err(WeatherError::NotFound { status, .. }) => {
                debug!(location, %status, "weather lookup found nothing");
                return format!("{NOT_FOUND_REPLY} {location}.");
            }
            Err(err) => {
                warn!(location, error = %err, "weather lookup failed");
                return UNAVAILABLE_REPLY.to_string();
            }
        };

        let mut report = format!(
            "The current temperature in {} is {}{} with {}.",
            location,
            weather.temperature,
            self.client.temperature_unit(),
            weather.description
        );

        if self.include_air_quality {
            match weather.coord {
                Some(coord) => match self.client.air_quality(coord).await {
                    Ok(aq) => {
                        report.push(' ');
                        report.push_str(&air_quality::describe(aq.index));
                    }
                    Err(err) => warn!(location, error = %err, "air quality lookup failed"),
                },
                None => warn!(location, "weather response had no coordinates"),
            }
        }
        report
    }
}

#[crate::tool(
    description = "Fetch real-time weather for a given city location. Input should be a city name.",
    params(location = "City name, e.g. 'London'")
)]
impl WeatherTool {
    async fn get_weather(&self, location: String) -> String {
        let location = location.trim();
        if location.is_empty() {
            debug!("weather requested without a location");
            return format!("{NOT_FOUND_REPLY} {location}.");
        }
        self.report(location).await
    }
}
