/// `MM:SS`, or `HH:MM:SS` from one hour on. Negative and NaN read as zero.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Label for the time left, as shown next to the seek bar.
pub fn format_remaining(current: f64, duration: f64) -> String {
    format_clock(duration - current)
}
