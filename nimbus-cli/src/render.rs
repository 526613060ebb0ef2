//! Human-readable output.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Local, Utc};
use nimbus_core::{Loaded, WeatherSnapshot};

pub fn summary(loaded: &Loaded) -> String {
    let snap = loaded.snapshot.as_ref();
    let main = snap.current();
    let mut out = String::new();

    let _ = writeln!(out, "{}", loaded.location.name);
    let _ = writeln!(
        out,
        "  {}°C  (feels like {}°C)",
        round(main.temp),
        round(main.feels_like)
    );
    if let Some(condition) = snap.condition() {
        let _ = writeln!(out, "  {}", capitalize(&condition.description));
    }
    let _ = writeln!(out);

    row(&mut out, "Humidity", format!("{}%", main.humidity));
    row(&mut out, "Pressure", format!("{} hPa", main.pressure));
    if let Some(km) = snap.visibility_km() {
        row(&mut out, "Visibility", format!("{km:.1} km"));
    }
    if let Some(t) = snap.sunrise() {
        row(&mut out, "Sunrise", clock(snap, t));
    }
    if let Some(t) = snap.sunset() {
        row(&mut out, "Sunset", clock(snap, t));
    }
    if let Some(wind) = snap.wind() {
        row(&mut out, "Wind", format!("{:.1} m/s", wind.speed));
    }

    out
}

pub fn details(loaded: &Loaded) -> String {
    let snap = loaded.snapshot.as_ref();
    let main = snap.current();
    let mut out = summary(loaded);

    let _ = writeln!(out);
    row(&mut out, "High / Low", format!("{}° / {}°", round(main.temp_max), round(main.temp_min)));

    if let Some(wind) = snap.wind() {
        if let Some(deg) = wind.deg {
            row(&mut out, "Wind from", format!("{deg}° {}", compass(deg)));
        }
        if let Some(gust) = wind.gust {
            row(&mut out, "Gusts", format!("{gust:.1} m/s"));
        }
    }
    if let Some(clouds) = snap.cloudiness_pct() {
        row(&mut out, "Clouds", format!("{clouds}%"));
    }
    if let Some(t) = snap.observed_at() {
        row(&mut out, "Observed", clock(snap, t));
    }

    out
}

fn row(out: &mut String, label: &str, value: String) {
    let _ = writeln!(out, "  {label:<12}{value}");
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

/// HH:MM at the observed location, or in local time when its offset is unknown.
fn clock(snap: &WeatherSnapshot, t: DateTime<Utc>) -> String {
    match snap.timezone_offset().and_then(FixedOffset::east_opt) {
        Some(offset) => t.with_timezone(&offset).format("%H:%M").to_string(),
        None => t.with_timezone(&Local).format("%H:%M").to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn compass(deg: u16) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = ((f64::from(deg % 360) / 22.5).round() as usize) % POINTS.len();
    POINTS[idx]
}
