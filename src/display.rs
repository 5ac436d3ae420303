//! Turns forecast data and the current units into ready-to-draw panels.
//!
//! Everything here is a pure function of its inputs so the presenter can
//! rebuild every panel from cached data whenever the units change.

use std::ops::Range;

use chrono::{NaiveDateTime, Timelike};

use crate::dates;
use crate::units::{self, UnitOption, UnitsState};
use crate::weather::{
    CurrentConditions, DailySeries, ForecastData, HourlyPoint, HourlySeries, Location,
    WeatherIcon,
};

/// Hours shown for today, starting after the current hour.
pub const TODAY_HOURS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPanel {
    pub place: String,
    pub region: Option<String>,
    pub date: String,
    pub temperature: String,
    pub icon: WeatherIcon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailsPanel {
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub precipitation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyCard {
    pub day: String,
    pub icon: WeatherIcon,
    pub max: String,
    pub min: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DaySelector {
    pub options: Vec<String>,
    pub selected: usize,
}

impl DaySelector {
    pub fn label(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRow {
    pub time: String,
    pub icon: WeatherIcon,
    pub temperature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitsPanel {
    pub system: &'static str,
    pub options: Vec<(UnitOption, bool)>,
    pub wind_symbol: &'static str,
    pub precipitation_symbol: &'static str,
}

impl Default for UnitsPanel {
    fn default() -> Self {
        units_panel(&UnitsState::default())
    }
}

/// Rounds half toward positive infinity, so -2.5 shows as -2 and 2.5 as 3.
pub fn round_display(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn degrees(celsius: f64, units: &UnitsState) -> String {
    let value = units::temperature::convert(celsius, units.temperature);
    format!("{}°", round_display(value))
}

pub fn current_panel(
    location: &Location,
    data: &ForecastData,
    units: &UnitsState,
    now: NaiveDateTime,
) -> CurrentPanel {
    CurrentPanel {
        place: location.name.clone(),
        region: location.admin_region.clone(),
        date: dates::current_date_label(now),
        temperature: degrees(data.current.temperature, units),
        icon: WeatherIcon::from_code(data.current.weather_code),
    }
}

pub fn details_panel(current: &CurrentConditions, units: &UnitsState) -> DetailsPanel {
    let wind = units::speed::convert(current.wind_speed, units.wind_speed);
    // precipitation is shown as converted, without rounding
    let precipitation = units::precipitation::convert(current.precipitation, units.precipitation);
    DetailsPanel {
        feels_like: degrees(current.apparent_temperature, units),
        humidity: format!("{}%", current.humidity),
        wind: format!("{} {}", round_display(wind), units.wind_speed.symbol()),
        precipitation: format!("{} {}", precipitation, units.precipitation.symbol()),
    }
}

pub fn daily_cards(daily: &DailySeries, units: &UnitsState) -> Vec<DailyCard> {
    daily
        .days
        .iter()
        .map(|day| DailyCard {
            day: dates::short_day_label(day.date),
            icon: WeatherIcon::from_code(day.weather_code),
            max: degrees(day.temperature_max, units),
            min: degrees(day.temperature_min, units),
        })
        .collect()
}

pub fn day_selector(daily: &DailySeries, selected: usize) -> DaySelector {
    DaySelector {
        options: daily
            .days
            .iter()
            .map(|day| dates::full_day_label(day.date))
            .collect(),
        selected,
    }
}

/// Range of `day_hours` (one forecast day) to display.
///
/// Today starts at the first hour strictly after `current_hour` and shows up to
/// `TODAY_HOURS` entries; if no such hour exists it starts at midnight. Other
/// days show all of their hours.
pub fn hourly_window(day_hours: &[HourlyPoint], day: usize, current_hour: u32) -> Range<usize> {
    let (start, count) = if day == 0 {
        let start = day_hours
            .iter()
            .position(|point| point.time.hour() > current_hour)
            .unwrap_or(0);
        (start, TODAY_HOURS)
    } else {
        (0, HourlySeries::HOURS_PER_DAY)
    };
    let end = (start + count).min(day_hours.len());
    start..end
}

pub fn hourly_rows(
    hourly: &HourlySeries,
    day: usize,
    current_hour: u32,
    units: &UnitsState,
) -> Vec<HourlyRow> {
    let day_hours = hourly.day(day);
    day_hours[hourly_window(day_hours, day, current_hour)]
        .iter()
        .map(|point| HourlyRow {
            time: dates::hour_label(point.time),
            icon: WeatherIcon::from_code(point.weather_code),
            temperature: degrees(point.temperature, units),
        })
        .collect()
}

pub fn units_panel(units: &UnitsState) -> UnitsPanel {
    UnitsPanel {
        system: units.system().label(),
        options: UnitOption::ALL
            .iter()
            .map(|option| (*option, option.is_selected(units)))
            .collect(),
        wind_symbol: units.wind_speed.symbol(),
        precipitation_symbol: units.precipitation.symbol(),
    }
}
