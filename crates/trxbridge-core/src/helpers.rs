//! Frequency formatting and conversion helpers.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// # Example
///
/// ```
/// use trxbridge_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(145_500_000), "145.500000 MHz");
/// assert_eq!(format_freq_mhz(433_025_000), "433.025000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Convert hertz to whole kilohertz, rounding to the nearest kilohertz.
///
/// Exact halves round to the even neighbour, the same result a
/// `"%.0f"`-style float format gives for `hz / 1000.0`.
///
/// # Example
///
/// ```
/// use trxbridge_core::hz_to_khz_rounded;
///
/// assert_eq!(hz_to_khz_rounded(145_000), 145);
/// assert_eq!(hz_to_khz_rounded(145_499), 145);
/// assert_eq!(hz_to_khz_rounded(145_501), 146);
/// assert_eq!(hz_to_khz_rounded(144_500), 144);
/// assert_eq!(hz_to_khz_rounded(145_500), 146);
/// ```
pub fn hz_to_khz_rounded(freq_hz: u64) -> u64 {
    let khz = freq_hz / 1000;
    let rem = freq_hz % 1000;
    if rem > 500 || (rem == 500 && khz % 2 == 1) {
        khz + 1
    } else {
        khz
    }
}
