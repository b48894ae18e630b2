/// Sample times and durations are expressed in 100 ns ticks.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

pub fn ticks_to_secs(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

/// Duration of one frame at `frame_rate / divisor` frames per second.
pub fn frame_duration_ticks(frame_rate: u8, divisor: u8) -> i64 {
    if frame_rate == 0 {
        return 0;
    }
    TICKS_PER_SECOND * i64::from(divisor) / i64::from(frame_rate)
}
