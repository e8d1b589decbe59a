// ── Energy monitor reading ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading from the hub's energy monitor.
///
/// Values are reported by the hub as integers: `current` and `max` are the
/// instantaneous and peak draw, `today` and `yesterday` the daily totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub current: i64,
    pub max: i64,
    pub today: i64,
    pub yesterday: i64,
    /// When the reply was parsed.
    pub read_at: DateTime<Utc>,
}
