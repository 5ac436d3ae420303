use chrono::{NaiveDate, NaiveDateTime};

/// Icon category for a provider weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
}

impl WeatherIcon {
    /// Total over every code. Codes 0 and 1 are both clear and anything the
    /// table does not know falls back to clear as well.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 | 1 => Self::Clear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            61 | 63 | 65 | 80 | 81 | 82 => Self::Rain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Storm,
            _ => Self::Clear,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "sunny",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Overcast => "overcast",
            Self::Fog => "fog",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Clear => "☀",
            Self::PartlyCloudy => "⛅",
            Self::Overcast => "☁",
            Self::Fog => "≡",
            Self::Drizzle => "☂",
            Self::Rain => "☔",
            Self::Snow => "❄",
            Self::Storm => "⚡",
        }
    }
}

/// Best geocoding match for a search.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub admin_region: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Conditions at the current instant, in the provider's metric base units.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub rain: f64,
    pub wind_speed: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub weather_code: i32,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub weather_code: i32,
}

/// Daily forecast, one row per day starting today. Rows are built from the
/// provider's parallel arrays, so a row always describes a single day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    pub days: Vec<DailyPoint>,
}

/// Hourly forecast, 24 rows per forecast day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlySeries {
    pub hours: Vec<HourlyPoint>,
}

impl HourlySeries {
    pub const HOURS_PER_DAY: usize = 24;

    /// Rows belonging to forecast day `day`, clamped to what the provider sent.
    pub fn day(&self, day: usize) -> &[HourlyPoint] {
        let start = (day * Self::HOURS_PER_DAY).min(self.hours.len());
        let end = (start + Self::HOURS_PER_DAY).min(self.hours.len());
        &self.hours[start..end]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastData {
    pub current: CurrentConditions,
    pub daily: DailySeries,
    pub hourly: HourlySeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_table_matches_provider_codes() {
        let table = [
            (0, WeatherIcon::Clear),
            (1, WeatherIcon::Clear),
            (2, WeatherIcon::PartlyCloudy),
            (3, WeatherIcon::Overcast),
            (45, WeatherIcon::Fog),
            (48, WeatherIcon::Fog),
            (51, WeatherIcon::Drizzle),
            (53, WeatherIcon::Drizzle),
            (55, WeatherIcon::Drizzle),
            (61, WeatherIcon::Rain),
            (63, WeatherIcon::Rain),
            (65, WeatherIcon::Rain),
            (80, WeatherIcon::Rain),
            (81, WeatherIcon::Rain),
            (82, WeatherIcon::Rain),
            (71, WeatherIcon::Snow),
            (73, WeatherIcon::Snow),
            (75, WeatherIcon::Snow),
            (77, WeatherIcon::Snow),
            (85, WeatherIcon::Snow),
            (86, WeatherIcon::Snow),
            (95, WeatherIcon::Storm),
            (96, WeatherIcon::Storm),
            (99, WeatherIcon::Storm),
        ];
        for (code, icon) in table {
            assert_eq!(WeatherIcon::from_code(code), icon, "code {code}");
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_clear() {
        for code in [-1, 4, 44, 56, 57, 66, 67, 100, i32::MIN, i32::MAX] {
            assert_eq!(WeatherIcon::from_code(code), WeatherIcon::Clear, "code {code}");
        }
    }

    #[test]
    fn hourly_day_slices_are_clamped() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let series = HourlySeries {
            hours: (0..30)
                .map(|i| HourlyPoint {
                    time: start + chrono::Duration::hours(i),
                    temperature: i as f64,
                    weather_code: 0,
                })
                .collect(),
        };
        assert_eq!(series.day(0).len(), 24);
        assert_eq!(series.day(1).len(), 6);
        assert_eq!(series.day(1)[0].temperature, 24.0);
        assert!(series.day(2).is_empty());
        assert!(series.day(6).is_empty());
    }
}
