//! Human readable test runtimes.

/// Format a runtime given in seconds, e.g. `"850ms"`, `"1.5s"`, `"2m 5.5s"`.
///
/// The seconds unit is floored to one decimal with a trailing `.0` dropped.
pub fn format_runtime(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0ms".to_string();
    }

    let ms = seconds * 1000.0;
    if ms < 1000.0 {
        return format!("{}ms", ms.floor() as u64);
    }

    let tenths = (seconds * 10.0).floor() as u64;
    let total = tenths / 10;
    let units = [
        (total / 86_400, "d"),
        (total % 86_400 / 3600, "h"),
        (total % 3600 / 60, "m"),
    ];

    let mut parts: Vec<String> = units
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, suffix)| format!("{}{}", value, suffix))
        .collect();

    let second_tenths = tenths % 600;
    if second_tenths > 0 {
        parts.push(format_seconds(second_tenths));
    }

    parts.join(" ")
}

fn format_seconds(tenths: u64) -> String {
    match tenths % 10 {
        0 => format!("{}s", tenths / 10),
        fraction => format!("{}.{}s", tenths / 10, fraction),
    }
}
