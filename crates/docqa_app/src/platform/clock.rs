use chrono::{DateTime, SecondsFormat, Utc};
use docqa_core::EpochMillis;

pub fn now_millis() -> EpochMillis {
    millis_of(Utc::now())
}

pub fn millis_of(at: DateTime<Utc>) -> EpochMillis {
    u64::try_from(at.timestamp_millis()).unwrap_or(0)
}

pub fn to_rfc3339(millis: EpochMillis) -> String {
    let at = i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default();
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_rfc3339(text: &str) -> Option<EpochMillis> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|at| millis_of(at.with_timezone(&Utc)))
}
