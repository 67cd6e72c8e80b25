//! Serde converters for storing `chrono` timestamps as BSON dates.

pub mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bson::DateTime::from_millis(date.timestamp_millis()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| de::Error::custom("timestamp out of range"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mongodb::bson::{self, doc, Bson};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super::bson_datetime_as_chrono")]
        at: chrono::DateTime<Utc>,
    }

    #[test]
    fn stores_as_bson_datetime() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let document = bson::to_document(&Stamped { at }).unwrap();

        assert!(matches!(document.get("at"), Some(Bson::DateTime(_))));

        let back: Stamped = bson::from_document(document).unwrap();
        assert_eq!(back.at, at);
    }

    #[test]
    fn reads_bson_datetime() {
        let millis = 1_700_000_000_000;
        let document = doc! { "at": bson::DateTime::from_millis(millis) };
        let parsed: Stamped = bson::from_document(document).unwrap();
        assert_eq!(parsed.at.timestamp_millis(), millis);
    }
}
