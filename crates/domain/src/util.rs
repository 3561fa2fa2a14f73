use std::time::{SystemTime, UNIX_EPOCH};

use time::OffsetDateTime;
use uuid::Uuid;

pub fn uuid_v7_without_dashes() -> String {
    Uuid::now_v7().simple().to_string()
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Year-month bucket (`YYYY-MM`) for chart groupings.
pub fn month_key(epoch_ms: i64) -> String {
    let value = OffsetDateTime::from_unix_timestamp_nanos(epoch_ms as i128 * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    format!("{:04}-{:02}", value.year(), u8::from(value.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_pads_single_digit_months() {
        // 2024-02-05T00:00:00Z
        assert_eq!(month_key(1_707_091_200_000), "2024-02");
    }

}
