use chrono::{DateTime, TimeZone, Utc};

pub fn from_millis(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Timestamp {} is out of range", millis))
}

pub fn to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}
