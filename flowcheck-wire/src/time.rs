//! Absolute timestamps for flow records.
//!
//! Records carry `first`/`last` as device-uptime ticks (milliseconds since
//! boot). The header pairs the current uptime with the export wall-clock, so
//! a record's first-packet time is the export time minus the uptime elapsed
//! since its `first` tick.

use chrono::{TimeZone, Utc};

use crate::FlowHeader;

/// Value the uptime tick counter wraps at.
pub const TICK_ROLLOVER: u64 = u32::MAX as u64;

/// Absolute first-packet time of a record, in milliseconds since the epoch.
///
/// When `first` is ahead of the header's uptime the counter rolled over
/// between the first packet and export, and the elapsed time is measured
/// through `2^32 - 1`.
pub fn absolute_first_ms(header: &FlowHeader, first: u32) -> i64 {
    let uptime = header.sys_uptime as u64;
    let first = first as u64;

    let elapsed = if first <= uptime {
        uptime - first
    } else {
        (TICK_ROLLOVER - first) + uptime
    };

    header.export_ms() - elapsed as i64
}

/// Render epoch milliseconds as `YYYY-MM-DD HH:MM:SS.mmm` in UTC.
pub fn format_timestamp_ms(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| format!("{}ms", ms))
}
