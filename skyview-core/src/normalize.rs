use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::{
    conditions::translate_opt,
    model::{DailyForecast, HourlyForecast, ResolvedLocation, WeatherData},
    provider::{DailyBlock, ForecastPayload, HourlyBlock},
};

pub const HOURLY_WINDOW: usize = 24;
pub const DAILY_WINDOW: usize = 5;
pub const SOURCE: &str = "Open-Meteo";

const PROVIDER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const CLOCK_FORMAT: &str = "%H:%M";
const MISSING_CLOCK: &str = "--:--";

/// Map a raw payload into a snapshot. Never fails; short series yield short output.
///
/// `now` is shifted into the location's wall clock using the payload's UTC offset, since the
/// hourly series starts at local midnight.
pub fn normalize(
    raw: &ForecastPayload,
    location: &ResolvedLocation,
    now: DateTime<Utc>,
) -> WeatherData {
    let local_now = now.naive_utc() + Duration::seconds(i64::from(raw.utc_offset_seconds));
    let current = &raw.current;
    let daily = &raw.daily;

    WeatherData {
        city: location.display_name.clone(),
        country: location.region.clone(),
        temperature: round(current.temperature_2m),
        feels_like: round(current.apparent_temperature),
        condition: translate_opt(current.weather_code).to_string(),
        humidity: round(current.relative_humidity_2m),
        wind_speed: round(current.wind_speed_10m),
        pressure: round(current.pressure_msl),
        uv_index: round(daily.uv_index_max.first().copied().flatten()),
        sunrise: daily.sunrise.first().map_or_else(|| MISSING_CLOCK.to_string(), |s| clock(s)),
        sunset: daily.sunset.first().map_or_else(|| MISSING_CLOCK.to_string(), |s| clock(s)),
        hourly: hourly_window(&raw.hourly, local_now.hour() as usize),
        daily: daily_window(daily),
        source: Some(SOURCE.to_string()),
    }
}

/// Up to 24 entries starting at `start`; stops at the end of the shorter series.
pub fn hourly_window(hourly: &HourlyBlock, start: usize) -> Vec<HourlyForecast> {
    let len = hourly.time.len().min(hourly.temperature_2m.len());

    (start..len)
        .take(HOURLY_WINDOW)
        .map(|i| HourlyForecast {
            time: clock(&hourly.time[i]),
            temp: round(hourly.temperature_2m[i]),
        })
        .collect()
}

/// Indices 0..5 (today plus four days), bounded by the shortest required series.
pub fn daily_window(daily: &DailyBlock) -> Vec<DailyForecast> {
    let len = daily
        .time
        .len()
        .min(daily.temperature_2m_max.len())
        .min(daily.temperature_2m_min.len());

    (0..len.min(DAILY_WINDOW))
        .map(|i| DailyForecast {
            day: day_label(i, &daily.time[i]),
            high: round(daily.temperature_2m_max[i]),
            low: round(daily.temperature_2m_min[i]),
            condition: translate_opt(daily.weather_code.get(i).copied().flatten()).to_string(),
        })
        .collect()
}

fn round(value: Option<f64>) -> i32 {
    value.map(|v| v.round() as i32).unwrap_or(0)
}

/// Provider-local ISO timestamp to "HH:MM".
fn clock(timestamp: &str) -> String {
    NaiveDateTime::parse_from_str(timestamp, PROVIDER_TIME_FORMAT)
        .map(|t| t.format(CLOCK_FORMAT).to_string())
        .unwrap_or_else(|_| MISSING_CLOCK.to_string())
}

fn day_label(index: usize, date: &str) -> String {
    if index == 0 {
        return "Today".to_string();
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a").to_string())
        .unwrap_or_else(|_| date.to_string())
}
