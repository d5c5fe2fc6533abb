//! Human-readable distance and duration strings shown next to the map.

/// Average road speed assumed by the place-graph travel estimate.
pub const AVERAGE_SPEED_KMH: f64 = 50.0;

/// Format a travel duration given in minutes.
///
/// Short trips read `"42 min"`, longer ones `"2 hrs 5 min"`, and anything past
/// a day switches to `"1 day 1 hr"` style. Fractions are truncated.
pub fn format_duration(minutes: f64) -> String {
    let minutes = if minutes.is_finite() { minutes.max(0.0) } else { 0.0 };
    if minutes < 60.0 {
        return format!("{} min", minutes as u64);
    }

    let hours = (minutes / 60.0).floor() as u64;
    let mins = (minutes % 60.0) as u64;

    if hours < 24 {
        let unit = if hours == 1 { "hr" } else { "hrs" };
        return if mins == 0 {
            format!("{hours} {unit}")
        } else {
            format!("{hours} {unit} {mins} min")
        };
    }

    let days = hours / 24;
    let hours = hours % 24;
    let mut result = if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    };
    if hours > 0 {
        result.push_str(&format!(" {hours} hr"));
    }
    if mins > 0 {
        result.push_str(&format!(" {mins} min"));
    }
    result
}

/// Format a distance given in kilometres.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else if km < 100.0 {
        format!("{km:.2} km")
    } else {
        format!("{km:.1} km")
    }
}

/// Travel time for a road distance at [`AVERAGE_SPEED_KMH`].
pub fn estimate_travel_time(distance_km: f64) -> String {
    let minutes = distance_km / AVERAGE_SPEED_KMH * 60.0;
    let minutes = if minutes.is_finite() { minutes.max(0.0) } else { 0.0 };
    if minutes < 60.0 {
        return format!("{} min", minutes as u64);
    }
    let h = (minutes / 60.0).floor() as u64;
    let m = (minutes % 60.0) as u64;
    if m == 0 {
        format!("{h} hr")
    } else {
        format!("{h} hr {m} min")
    }
}
