use std::time::Duration;
use std::time::SystemTime;

use humansize::format_size;
use humansize::DECIMAL;

/// Relative description of `t` against the current wall clock,
/// e.g. "now", "3 seconds ago", "2 minutes from now".
pub fn humanize_time(t: SystemTime) -> String {
    humanize_time_at(t, SystemTime::now())
}

pub(crate) fn humanize_time_at(
    t: SystemTime,
    now: SystemTime,
) -> String {
    let (diff, suffix) = match now.duration_since(t) {
        Ok(d) => (d, "ago"),
        Err(e) => (e.duration(), "from now"),
    };

    if diff < Duration::from_secs(1) {
        return "now".to_string();
    }

    let secs = diff.as_secs();
    let (n, unit) = match secs {
        0..=59 => (secs, "second"),
        60..=3599 => (secs / 60, "minute"),
        3600..=86399 => (secs / 3600, "hour"),
        _ => (secs / 86400, "day"),
    };

    if n == 1 {
        format!("1 {unit} {suffix}")
    } else {
        format!("{n} {unit}s {suffix}")
    }
}

/// SI formatted size, e.g. "24.58 kB"
pub fn humanize_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Wall clock rounded to the nearest second
pub(crate) fn now_rounded_to_second() -> SystemTime {
    let now = SystemTime::now();
    match now.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(since_epoch) => {
            let mut secs = since_epoch.as_secs();
            if since_epoch.subsec_millis() >= 500 {
                secs += 1;
            }
            SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
        }
        Err(_) => now,
    }
}
