//! Export window computation (the time manipulator)
//!
//! Pure date arithmetic for the next incremental export window. The
//! controller treats this as a black box satisfying one contract: given a
//! reference time, the last watermark and a window size, produce the
//! [from, to) window of the next incremental export. Deterministic, no side
//! effects, cannot fail transiently.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open [from, to) incremental export window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportWindow {
    /// Inclusive start of the window (the previous watermark)
    pub export_from: DateTime<Utc>,

    /// Exclusive end of the window (the next watermark)
    pub export_to: DateTime<Utc>,
}

impl ExportWindow {
    /// Whether the window end has already passed at `now`
    ///
    /// A window whose end time is not in the future of `now` is skipped as
    /// "export not needed" for the cycle.
    pub fn end_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.export_to <= now
    }
}

/// Compute the next incremental export window
///
/// The window starts at the last watermark and spans `window_minutes`.
/// `reference` is the caller's current time; it does not shift the window,
/// it only anchors logging and the skip decision made by the caller.
pub fn next_export_window(
    reference: DateTime<Utc>,
    watermark: DateTime<Utc>,
    window_minutes: u32,
) -> ExportWindow {
    let _ = reference;
    ExportWindow {
        export_from: watermark,
        export_to: watermark + Duration::minutes(i64::from(window_minutes)),
    }
}
