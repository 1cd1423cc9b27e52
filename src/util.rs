/// Formats seconds as `m:ss` (or `h:mm:ss` past an hour) for the big clock.
pub fn fmt_clock(secs: f64) -> String {
    let total = secs.max(0.0).ceil() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Formats a finish time with tenths, e.g. `4:03.2`.
pub fn fmt_finish(secs: f64) -> String {
    let tenths = (secs.max(0.0) * 10.0).round() as u64;
    let (m, rem) = (tenths / 600, tenths % 600);
    format!("{}:{:02}.{}", m, rem / 10, rem % 10)
}
