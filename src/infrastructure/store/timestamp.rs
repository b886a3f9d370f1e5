use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp as persisted inside documents.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreTimestamp {
    #[serde(rename = "_seconds")]
    pub seconds: i64,
    #[serde(rename = "_nanoseconds")]
    pub nanos: u32,
}

impl StoreTimestamp {
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// `None` when the stored value is outside chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos).single()
    }

    pub fn to_value(self) -> Value {
        serde_json::json!({ "_seconds": self.seconds, "_nanoseconds": self.nanos })
    }

    /// Reads a timestamp out of a raw document value, if it has that shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let seconds = obj.get("_seconds")?.as_i64()?;
        let nanos = obj.get("_nanoseconds")?.as_u64()?;
        Some(StoreTimestamp { seconds, nanos: u32::try_from(nanos).ok()? })
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        StoreTimestamp {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl From<StoreTimestamp> for Value {
    fn from(ts: StoreTimestamp) -> Self {
        ts.to_value()
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub mod iso_millis {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_both_ways_without_losing_precision() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap() + chrono::Duration::milliseconds(250);
        let ts = StoreTimestamp::from(dt);

        assert_eq!(ts.seconds, dt.timestamp());
        assert_eq!(ts.nanos, 250_000_000);
        assert_eq!(ts.to_datetime(), Some(dt));
        assert_eq!(StoreTimestamp::from_value(&ts.to_value()), Some(ts));
    }

    #[test]
    fn out_of_range_values_have_no_datetime() {
        assert_eq!(StoreTimestamp { seconds: i64::MAX, nanos: 0 }.to_datetime(), None);
        assert_eq!(StoreTimestamp { seconds: 0, nanos: 2_000_000_000 }.to_datetime(), None);
    }

    #[test]
    fn orders_chronologically() {
        let early = StoreTimestamp { seconds: 10, nanos: 999 };
        let late = StoreTimestamp { seconds: 11, nanos: 0 };
        assert!(early < late);
    }

    #[test]
    fn rejects_values_of_other_shapes() {
        assert_eq!(StoreTimestamp::from_value(&serde_json::json!("2024-01-01")), None);
        assert_eq!(StoreTimestamp::from_value(&serde_json::json!({"_seconds": 1})), None);
    }

    #[test]
    fn iso_output_uses_millis_and_z() {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(with = "iso_millis")]
            at: DateTime<Utc>,
        }
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let json = serde_json::to_value(Wrapper { at }).unwrap();
        assert_eq!(json["at"], "2024-01-02T03:04:05.000Z");
    }
}
