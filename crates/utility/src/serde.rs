/// Serializes a `DateTime<Utc>` as milliseconds since the Unix epoch, the
/// format every timestamp in the response envelope uses.
pub mod epoch_millis {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(
        timestamp: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        timestamp.timestamp_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| serde::de::Error::custom("epoch milliseconds out of range"))
    }

    pub mod option {
        use chrono::{DateTime, TimeZone, Utc};
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S>(
            timestamp: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            timestamp
                .map(|timestamp| timestamp.timestamp_millis())
                .serialize(serializer)
        }

        pub fn deserialize<'de, D>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let millis = Option::<i64>::deserialize(deserializer)?;
            millis
                .map(|millis| {
                    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                        serde::de::Error::custom("epoch milliseconds out of range")
                    })
                })
                .transpose()
        }
    }
}

/// Nanoseconds since service-day midnight. A bare type alias, not a
/// newtype: every arithmetic site in the engine treats it as a plain `i64`
/// (see the single "seconds since service midnight" helper in
/// `transit_engine::time`), and a newtype would just add `.0` noise at
/// every call site without adding safety, since the value is signed and
/// unrestricted (trips may run past 24h).
pub type NanosSinceMidnight = i64;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    #[test]
    fn epoch_millis_round_trips() {
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(timestamp.timestamp_millis() / 1000, timestamp.timestamp());
    }
}
