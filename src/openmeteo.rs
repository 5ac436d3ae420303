use chrono::{NaiveDate, NaiveDateTime};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::TransportError;
use crate::weather::{
    CurrentConditions, DailyPoint, DailySeries, ForecastData, HourlyPoint, HourlySeries, Location,
};

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const USER_AGENT: &str = concat!("wx-lookup/", env!("CARGO_PKG_VERSION"));

pub mod geocoding {
    use super::*;

    #[derive(Deserialize, Debug, Default)]
    struct SearchResponse {
        #[serde(default)]
        results: Option<Vec<Place>>,
    }

    #[derive(Deserialize, Debug)]
    struct Place {
        name: String,
        latitude: f64,
        longitude: f64,
        admin1: Option<String>,
    }

    impl From<Place> for Location {
        fn from(place: Place) -> Self {
            Location {
                name: place.name,
                admin_region: place.admin1,
                latitude: place.latitude,
                longitude: place.longitude,
            }
        }
    }

    pub struct GeocodingClient {
        client: Client,
        base_url: String,
    }

    impl GeocodingClient {
        pub fn new() -> Result<Self, TransportError> {
            Self::with_base_url(GEOCODING_URL)
        }

        pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TransportError> {
            Ok(Self {
                client: http_client()?,
                base_url: base_url.into(),
            })
        }

        /// First match for `query`, or `None` when the provider knows no such place.
        /// Callers trim and reject empty queries before getting here.
        pub fn resolve(&self, query: &str) -> Result<Option<Location>, TransportError> {
            tracing::debug!(query, url = %self.base_url, "geocoding lookup");
            let request = self.client.get(&self.base_url).query(&[
                ("name", query),
                ("language", "en"),
                ("format", "json"),
            ]);
            let response: SearchResponse = get_json(request)?;
            Ok(response
                .results
                .unwrap_or_default()
                .into_iter()
                .next()
                .map(Location::from))
        }
    }
}

pub mod forecast {
    use super::*;

    const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min";
    const HOURLY_FIELDS: &str = "temperature_2m,weather_code";
    const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,wind_speed_10m,weather_code,rain";
    const FORECAST_DAYS: &str = "7";

    #[derive(Deserialize, Debug)]
    struct ForecastResponse {
        current: Current,
        daily: Daily,
        hourly: Hourly,
    }

    #[derive(Deserialize, Debug)]
    struct Current {
        temperature_2m: f64,
        relative_humidity_2m: f64,
        apparent_temperature: f64,
        precipitation: f64,
        wind_speed_10m: f64,
        weather_code: i32,
        #[serde(default)]
        rain: f64,
    }

    #[derive(Deserialize, Debug)]
    struct Daily {
        time: Vec<String>,
        weather_code: Vec<i32>,
        temperature_2m_max: Vec<f64>,
        temperature_2m_min: Vec<f64>,
    }

    #[derive(Deserialize, Debug)]
    struct Hourly {
        time: Vec<String>,
        temperature_2m: Vec<f64>,
        weather_code: Vec<i32>,
    }

    impl TryFrom<Daily> for DailySeries {
        type Error = TransportError;

        fn try_from(daily: Daily) -> Result<Self, Self::Error> {
            let len = daily.time.len();
            if daily.weather_code.len() != len
                || daily.temperature_2m_max.len() != len
                || daily.temperature_2m_min.len() != len
            {
                return Err(TransportError::Malformed(format!(
                    "daily series misaligned: time={len} weather_code={} max={} min={}",
                    daily.weather_code.len(),
                    daily.temperature_2m_max.len(),
                    daily.temperature_2m_min.len()
                )));
            }

            let mut days = Vec::with_capacity(len);
            for i in 0..len {
                let date = NaiveDate::parse_from_str(&daily.time[i], "%Y-%m-%d").map_err(|e| {
                    TransportError::Malformed(format!("daily time {:?}: {e}", daily.time[i]))
                })?;
                days.push(DailyPoint {
                    date,
                    weather_code: daily.weather_code[i],
                    temperature_max: daily.temperature_2m_max[i],
                    temperature_min: daily.temperature_2m_min[i],
                });
            }
            Ok(DailySeries { days })
        }
    }

    impl TryFrom<Hourly> for HourlySeries {
        type Error = TransportError;

        fn try_from(hourly: Hourly) -> Result<Self, Self::Error> {
            let len = hourly.time.len();
            if hourly.temperature_2m.len() != len || hourly.weather_code.len() != len {
                return Err(TransportError::Malformed(format!(
                    "hourly series misaligned: time={len} temperature={} weather_code={}",
                    hourly.temperature_2m.len(),
                    hourly.weather_code.len()
                )));
            }

            let mut hours = Vec::with_capacity(len);
            for i in 0..len {
                let time = NaiveDateTime::parse_from_str(&hourly.time[i], "%Y-%m-%dT%H:%M")
                    .map_err(|e| {
                        TransportError::Malformed(format!("hourly time {:?}: {e}", hourly.time[i]))
                    })?;
                hours.push(HourlyPoint {
                    time,
                    temperature: hourly.temperature_2m[i],
                    weather_code: hourly.weather_code[i],
                });
            }
            Ok(HourlySeries { hours })
        }
    }

    impl TryFrom<ForecastResponse> for ForecastData {
        type Error = TransportError;

        fn try_from(response: ForecastResponse) -> Result<Self, Self::Error> {
            let current = response.current;
            Ok(ForecastData {
                current: CurrentConditions {
                    temperature: current.temperature_2m,
                    apparent_temperature: current.apparent_temperature,
                    humidity: current.relative_humidity_2m,
                    precipitation: current.precipitation,
                    rain: current.rain,
                    wind_speed: current.wind_speed_10m,
                    weather_code: current.weather_code,
                },
                daily: response.daily.try_into()?,
                hourly: response.hourly.try_into()?,
            })
        }
    }

    pub struct ForecastClient {
        client: Client,
        base_url: String,
    }

    impl ForecastClient {
        pub fn new() -> Result<Self, TransportError> {
            Self::with_base_url(FORECAST_URL)
        }

        pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TransportError> {
            Ok(Self {
                client: http_client()?,
                base_url: base_url.into(),
            })
        }

        /// Seven days of daily and hourly forecast plus current conditions.
        /// The provider picks the timezone from the coordinates.
        pub fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastData, TransportError> {
            tracing::debug!(latitude, longitude, url = %self.base_url, "forecast request");
            let request = self.client.get(&self.base_url).query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("daily", DAILY_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("current", CURRENT_FIELDS),
                ("timezone", "auto"),
                ("forecast_days", FORECAST_DAYS),
            ]);
            let response: ForecastResponse = get_json(request)?;
            response.try_into()
        }
    }
}

fn http_client() -> Result<Client, TransportError> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, TransportError> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status));
    }
    Ok(response.json()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::forecast::ForecastClient;
    use super::geocoding::GeocodingClient;
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    /// A seven day forecast body shaped like the provider's answer, starting 2026-10-19.
    pub(crate) fn forecast_body() -> Value {
        let days: Vec<String> = (19..26).map(|d| format!("2026-10-{d:02}")).collect();
        let hours: Vec<String> = days
            .iter()
            .flat_map(|d| (0..24).map(move |h| format!("{d}T{h:02}:00")))
            .collect();
        let temps: Vec<f64> = (0..hours.len()).map(|i| (i % 24) as f64 * 0.5).collect();
        let codes: Vec<i32> = (0..hours.len()).map(|i| if i % 2 == 0 { 0 } else { 61 }).collect();
        json!({
            "latitude": 52.52,
            "longitude": 13.419998,
            "timezone": "Europe/Berlin",
            "current": {
                "time": "2026-10-19T14:00",
                "interval": 900,
                "temperature_2m": 12.3,
                "relative_humidity_2m": 71,
                "apparent_temperature": 10.8,
                "precipitation": 0.2,
                "wind_speed_10m": 14.4,
                "weather_code": 3,
                "rain": 0.2
            },
            "daily": {
                "time": days,
                "weather_code": [3, 61, 2, 0, 71, 95, 45],
                "temperature_2m_max": [14.1, 12.0, 11.5, 13.2, 4.0, 16.8, 9.9],
                "temperature_2m_min": [6.2, 5.0, 4.4, 3.9, -1.5, 8.0, 2.2]
            },
            "hourly": {
                "time": hours,
                "temperature_2m": temps,
                "weather_code": codes
            }
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_returns_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Springfield"))
            .and(query_param("language", "en"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"name": "Springfield", "latitude": 39.80172, "longitude": -89.64371, "admin1": "Illinois"},
                    {"name": "Springfield", "latitude": 37.21533, "longitude": -93.29824, "admin1": "Missouri"}
                ],
                "generationtime_ms": 0.9
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/v1/search", server.uri());
        let location = run_blocking(move || GeocodingClient::with_base_url(url)?.resolve("Springfield"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(location.name, "Springfield");
        assert_eq!(location.admin_region.as_deref(), Some("Illinois"));
        assert_eq!(location.latitude, 39.80172);
        assert_eq!(location.longitude, -89.64371);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_without_results_is_none() {
        for body in [json!({"results": []}), json!({"generationtime_ms": 0.4})] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let url = server.uri();
            let location = run_blocking(move || GeocodingClient::with_base_url(url)?.resolve("Atlantis"))
                .await
                .unwrap();
            assert!(location.is_none());
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_keeps_missing_admin_region_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"name": "Monaco", "latitude": 43.73, "longitude": 7.42}]
            })))
            .mount(&server)
            .await;

        let url = server.uri();
        let location = run_blocking(move || GeocodingClient::with_base_url(url)?.resolve("Monaco"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(location.admin_region, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_surfaces_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = server.uri();
        let err = run_blocking(move || GeocodingClient::with_base_url(url)?.resolve("Berlin"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_requests_seven_days_and_builds_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "52.52"))
            .and(query_param("longitude", "13.41"))
            .and(query_param("daily", "weather_code,temperature_2m_max,temperature_2m_min"))
            .and(query_param("hourly", "temperature_2m,weather_code"))
            .and(query_param(
                "current",
                "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,wind_speed_10m,weather_code,rain",
            ))
            .and(query_param("timezone", "auto"))
            .and(query_param("forecast_days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/v1/forecast", server.uri());
        let data = run_blocking(move || ForecastClient::with_base_url(url)?.fetch(52.52, 13.41))
            .await
            .unwrap();

        assert_eq!(data.current.temperature, 12.3);
        assert_eq!(data.current.humidity, 71.0);
        assert_eq!(data.current.weather_code, 3);
        assert_eq!(data.current.rain, 0.2);
        assert_eq!(data.daily.days.len(), 7);
        assert_eq!(data.daily.days[4].temperature_min, -1.5);
        assert_eq!(
            data.daily.days[0].date,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
        assert_eq!(data.hourly.hours.len(), 168);
        assert_eq!(data.hourly.day(1)[0].time.format("%d %H").to_string(), "20 00");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_rejects_misaligned_series() {
        let mut body = forecast_body();
        body["hourly"]["temperature_2m"]
            .as_array_mut()
            .unwrap()
            .pop();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let url = server.uri();
        let err = run_blocking(move || ForecastClient::with_base_url(url)?.fetch(1.0, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_rejects_garbage_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let url = server.uri();
        let err = run_blocking(move || ForecastClient::with_base_url(url)?.fetch(1.0, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_surfaces_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": true,
                "reason": "Latitude must be in range of -90 to 90°."
            })))
            .mount(&server)
            .await;

        let url = server.uri();
        let err = run_blocking(move || ForecastClient::with_base_url(url)?.fetch(100.0, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status(s) if s.as_u16() == 400));
    }
}
