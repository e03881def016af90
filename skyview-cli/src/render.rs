use std::fmt::Write;

use chrono::{Local, Timelike};
use skyview_core::{
    AiAnalysis, ThemeId, WeatherData,
    theme::{derive, is_night_hour},
};

/// Theme for the snapshot at the viewer's current wall-clock hour.
pub fn current_theme(snapshot: &WeatherData) -> ThemeId {
    derive(&snapshot.condition, is_night_hour(Local::now().hour()))
}

pub fn render_snapshot(data: &WeatherData, theme: ThemeId) -> String {
    let mut out = String::new();

    let place = if data.country.is_empty() {
        data.city.clone()
    } else {
        format!("{}, {}", data.city, data.country)
    };

    let _ = writeln!(out, "{place}  [{theme}]");
    let _ = writeln!(
        out,
        "{}°C, {} (feels like {}°C)",
        data.temperature, data.condition, data.feels_like
    );
    let _ = writeln!(
        out,
        "Humidity {}%  Wind {} km/h  Pressure {} hPa  UV {}",
        data.humidity, data.wind_speed, data.pressure, data.uv_index
    );
    let _ = writeln!(out, "Sunrise {}  Sunset {}", data.sunrise, data.sunset);

    if !data.hourly.is_empty() {
        let _ = writeln!(out, "\nNext hours:");
        let line = data
            .hourly
            .iter()
            .map(|h| format!("{} {}°", h.time, h.temp))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "  {line}");
    }

    if !data.daily.is_empty() {
        let _ = writeln!(out, "\nForecast:");
        for day in &data.daily {
            let _ = writeln!(
                out,
                "  {:<6} {:>4}° / {:>4}°  {}",
                day.day, day.high, day.low, day.condition
            );
        }
    }

    if let Some(source) = &data.source {
        let _ = write!(out, "\nData: {source}");
    }

    out
}

pub fn render_summary(summary: &str) -> String {
    format!("AI summary: {summary}")
}

pub fn render_analysis(analysis: &AiAnalysis) -> String {
    let mut out = String::new();
    let sections = [
        ("Advice", &analysis.advice),
        ("Outfit", &analysis.outfit),
        ("Details", &analysis.details),
    ];

    for (title, body) in sections.into_iter().filter(|(_, body)| !body.is_empty()) {
        let _ = writeln!(out, "{title}:\n  {body}");
    }

    out
}
