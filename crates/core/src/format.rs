//! Human-readable byte counts.

const SI_UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BINARY_UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Format `bytes` as text using SI (powers of 1000) or binary (powers of 1024)
/// units, with `decimal_places` digits after the point.
///
/// Values below the threshold are printed as plain bytes without scaling.
///
/// ```
/// use bundlesize_core::format::human_file_size;
///
/// assert_eq!(human_file_size(512, false, 1), "512 B");
/// assert_eq!(human_file_size(1536, false, 1), "1.5 KiB");
/// assert_eq!(human_file_size(260_198, true, 1), "260.2 kB");
/// ```
pub fn human_file_size(bytes: i64, si: bool, decimal_places: usize) -> String {
    let (thresh, units) = if si {
        (1000.0, &SI_UNITS)
    } else {
        (1024.0, &BINARY_UNITS)
    };

    if (bytes as f64).abs() < thresh {
        return format!("{bytes} B");
    }

    let r = 10f64.powi(decimal_places.min(MAX_ROUNDING_PLACES) as i32);
    let mut value = bytes as f64;
    let mut u = 0usize;

    loop {
        value /= thresh;
        if round_half_up(value.abs(), r) < thresh || u == units.len() - 1 {
            break;
        }
        u += 1;
    }

    // Ties go away from zero before fixed-point formatting, which would
    // otherwise round them to even.
    let rounded = round_half_up(value.abs(), r).copysign(value);
    format!("{rounded:.decimal_places$} {}", units[u])
}

const MAX_ROUNDING_PLACES: usize = 15;

fn round_half_up(magnitude: f64, r: f64) -> f64 {
    (magnitude * r).round() / r
}

/// SI units with one decimal; the format used for totals and per-file sizes.
pub fn format_si(bytes: u64) -> String {
    human_file_size(clamp_to_i64(bytes), true, 1)
}

/// Binary units with one decimal; the format used for size deltas.
pub fn format_delta(delta: i64) -> String {
    human_file_size(delta, false, 1)
}

pub(crate) fn clamp_to_i64(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}
