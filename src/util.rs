use chrono::{DateTime, SecondsFormat, Utc};

// The repository counts time in microseconds since the epoch, the DAV
// side in seconds. Every crossing scales by this factor.
pub(crate) const USEC_PER_SEC: i64 = 1_000_000;

/// Current wall-clock time in epoch microseconds.
pub(crate) fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Format an epoch-microseconds timestamp the way the repository
/// serializes dates: RFC 3339 in UTC with microsecond precision.
pub(crate) fn micros_to_rfc3339(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}
