// Shared helpers

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Retention window expressed in (possibly fractional) days.
pub fn retention_window(days: f64) -> Duration {
    let millis = (days.max(0.0) * 86_400_000.0).round() as i64;
    Duration::milliseconds(millis)
}

pub fn retention_cutoff(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    now - retention_window(days)
}

/// Replaces every `{key}` with its value.
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

/// Random pleasant color as "#RRGGBB": any hue, saturation 0.4-0.8, value 0.5-1.0.
pub fn random_color_hex<R: Rng + ?Sized>(rng: &mut R) -> String {
    let hue: f32 = rng.gen_range(0.0..1.0);
    let saturation: f32 = rng.gen_range(0.4..0.8);
    let value: f32 = rng.gen_range(0.5..1.0);
    let (r, g, b) = hsv_to_rgb(hue, saturation, value);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> (u8, u8, u8) {
    let sector = (hue * 6.0).floor();
    let fraction = hue * 6.0 - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - fraction * saturation);
    let t = value * (1.0 - (1.0 - fraction) * saturation);
    let (r, g, b) = match sector as i32 % 6 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    let to_byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}
