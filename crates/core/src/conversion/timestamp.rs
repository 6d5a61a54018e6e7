//! Platform timestamp representations
//!
//! Formatting is total for any `DateTime<Utc>` and only drops precision finer
//! than the platform's resolution.

use adrelay_domain::{AdRelayError, Result};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Google Ads upload format, e.g. `2021-06-10 18:08:04+00:00`.
const GOOGLE_ADS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Timestamp representation expected by a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `yyyy-mm-dd hh:mm:ss+00:00`, second resolution
    GoogleAds,
    /// ISO 8601 with millisecond precision and an explicit `+00:00` offset
    Iso8601,
    /// Unix epoch milliseconds
    EpochMillis,
    /// Unix epoch microseconds
    EpochMicros,
}

impl TimestampFormat {
    /// Smallest time step the representation can carry.
    pub fn resolution(self) -> Duration {
        match self {
            Self::GoogleAds => Duration::seconds(1),
            Self::Iso8601 | Self::EpochMillis => Duration::milliseconds(1),
            Self::EpochMicros => Duration::microseconds(1),
        }
    }

    /// Render `ts` in this representation.
    pub fn format(self, ts: &DateTime<Utc>) -> String {
        match self {
            Self::GoogleAds => ts.format(GOOGLE_ADS_FORMAT).to_string(),
            Self::Iso8601 => ts.to_rfc3339_opts(SecondsFormat::Millis, false),
            Self::EpochMillis => ts.timestamp_millis().to_string(),
            Self::EpochMicros => ts.timestamp_micros().to_string(),
        }
    }

    /// Parse a value previously produced by [`TimestampFormat::format`].
    ///
    /// # Errors
    /// Returns [`AdRelayError::Validation`] when `raw` is not in this
    /// representation.
    pub fn parse(self, raw: &str) -> Result<DateTime<Utc>> {
        let invalid = |detail: String| {
            AdRelayError::Validation(format!("invalid {self:?} timestamp {raw:?}: {detail}"))
        };

        match self {
            Self::GoogleAds => DateTime::parse_from_str(raw, GOOGLE_ADS_FORMAT)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| invalid(e.to_string())),
            Self::Iso8601 => DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| invalid(e.to_string())),
            Self::EpochMillis => {
                let millis = raw.parse::<i64>().map_err(|e| invalid(e.to_string()))?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(|| invalid("out of range".to_string()))
            }
            Self::EpochMicros => {
                let micros = raw.parse::<i64>().map_err(|e| invalid(e.to_string()))?;
                DateTime::from_timestamp_micros(micros)
                    .ok_or_else(|| invalid("out of range".to_string()))
            }
        }
    }

    /// `ts` with precision beyond this representation removed.
    pub fn truncate(self, ts: &DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::GoogleAds => ts.trunc_subsecs(0),
            Self::Iso8601 | Self::EpochMillis => ts.trunc_subsecs(3),
            Self::EpochMicros => ts.trunc_subsecs(6),
        }
    }
}

/// Epoch microseconds as a number, for JSON bodies that want an integer.
pub fn epoch_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Epoch milliseconds as a number, for JSON bodies that want an integer.
pub fn epoch_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const ALL: [TimestampFormat; 4] = [
        TimestampFormat::GoogleAds,
        TimestampFormat::Iso8601,
        TimestampFormat::EpochMillis,
        TimestampFormat::EpochMicros,
    ];

    fn sample() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2021, 6, 10)
            .and_then(|d| d.and_hms_nano_opt(18, 8, 4, 123_456_789))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap()
    }

    #[test]
    fn google_ads_format_has_explicit_offset() {
        assert_eq!(TimestampFormat::GoogleAds.format(&sample()), "2021-06-10 18:08:04+00:00");
    }

    #[test]
    fn iso8601_keeps_milliseconds() {
        assert_eq!(TimestampFormat::Iso8601.format(&sample()), "2021-06-10T18:08:04.123+00:00");
    }

    #[test]
    fn epoch_representations() {
        assert_eq!(TimestampFormat::EpochMillis.format(&sample()), "1623348484123");
        assert_eq!(TimestampFormat::EpochMicros.format(&sample()), "1623348484123456");
        assert_eq!(epoch_micros(&sample()), 1_623_348_484_123_456);
        assert_eq!(epoch_millis(&sample()), 1_623_348_484_123);
    }

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, nanos: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_nano_opt(h, mi, s, nanos))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap()
    }

    #[test]
    fn format_then_parse_round_trips_within_resolution() {
        let instants = [
            sample(),
            // before the epoch, with sub-millisecond digits
            instant(1969, 7, 20, 20, 17, 40, 987_654_321),
            instant(1960, 1, 1, 0, 0, 0, 1),
            // whole seconds
            instant(2022, 9, 26, 12, 0, 0, 0),
            Utc.timestamp_opt(0, 0).unwrap(),
            // exact microseconds
            instant(2030, 2, 28, 23, 59, 59, 999_999_000),
            // leap day, end of day
            instant(2024, 2, 29, 23, 59, 59, 500_000_000),
        ];

        for ts in instants {
            for format in ALL {
                let parsed = format.parse(&format.format(&ts)).unwrap();
                assert_eq!(parsed, format.truncate(&ts), "{format:?} {ts}");
                assert!(parsed <= ts, "{format:?} {ts}");
                assert!(ts - parsed < format.resolution(), "{format:?} {ts}");
            }
        }
    }

    #[test]
    fn exact_microseconds_survive_epoch_micros() {
        let ts = instant(2030, 2, 28, 23, 59, 59, 999_999_000);
        let parsed = TimestampFormat::EpochMicros.parse(&epoch_micros(&ts).to_string()).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn pre_epoch_millis_are_negative() {
        let ts = instant(1969, 12, 31, 23, 59, 59, 500_000_000);
        assert_eq!(epoch_millis(&ts), -500);
        assert_eq!(TimestampFormat::EpochMillis.parse("-500").unwrap(), ts);
    }

    #[test]
    fn parse_accepts_other_offsets_for_google_ads() {
        let parsed = TimestampFormat::GoogleAds.parse("2021-06-10 20:08:04+02:00").unwrap();
        assert_eq!(parsed, sample().trunc_subsecs(0));
    }

    #[test]
    fn parse_rejects_foreign_representation() {
        let err = TimestampFormat::GoogleAds.parse("2021-06-10T18:08:04Z").unwrap_err();
        assert!(matches!(err, AdRelayError::Validation(_)));
        assert!(TimestampFormat::EpochMillis.parse("yesterday").is_err());
    }
}
