use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})[_\-. T]?(?P<hour>\d{2})(?P<minute>\d{2})(?P<second>\d{2})(?P<millis>\d{3})?",
    )
    .expect("timestamp pattern must compile")
});

pub fn timestamp_from_filename(stem: &str, hour_offset: i64) -> Option<NaiveDateTime> {
    TIMESTAMP_RE
        .captures_iter(stem)
        .find_map(|caps| build_timestamp(&caps))
        .and_then(|ts| ts.checked_add_signed(TimeDelta::try_hours(hour_offset)?))
}

fn build_timestamp(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let field = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = i32::try_from(field("year")?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, field("month")?, field("day")?)?;
    let millis = field("millis").unwrap_or(0);
    date.and_hms_milli_opt(field("hour")?, field("minute")?, field("second")?, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|v| v.and_hms_opt(h, mi, s))
            .expect("valid timestamp")
    }

    #[test]
    fn extracts_android_camera_name() {
        assert_eq!(
            timestamp_from_filename("IMG_20240316_101520", 0),
            Some(at(2024, 3, 16, 10, 15, 20))
        );
    }

    #[test]
    fn accepts_common_separators() {
        let expected = Some(at(2019, 9, 19, 5, 38, 57));
        assert_eq!(timestamp_from_filename("Screenshot_20190919-053857", 0), expected);
        assert_eq!(timestamp_from_filename("VID20190919053857", 0), expected);
        assert_eq!(timestamp_from_filename("PXL_20190919.053857", 0), expected);
    }

    #[test]
    fn rejects_invalid_calendar_values() {
        assert_eq!(timestamp_from_filename("20240230_101520", 0), None);
        assert_eq!(timestamp_from_filename("20241301_101520", 0), None);
        assert_eq!(timestamp_from_filename("20240316_246000", 0), None);
        assert_eq!(timestamp_from_filename("random_photo", 0), None);
    }

    #[test]
    fn captures_fraction_as_milliseconds() {
        let ts = timestamp_from_filename("PXL_20240316_101520123", 0).expect("must match");
        assert_eq!(ts.nanosecond(), 123_000_000);
        assert_eq!(ts.second(), 20);
    }

    #[test]
    fn applies_hour_offset_to_wall_clock() {
        assert_eq!(
            timestamp_from_filename("mmexport_20240316_231520", 2),
            Some(at(2024, 3, 17, 1, 15, 20))
        );
        assert_eq!(
            timestamp_from_filename("20240316_011520", -8),
            Some(at(2024, 3, 15, 17, 15, 20))
        );
    }

    #[test]
    fn huge_offset_yields_no_timestamp() {
        let stem = "IMG_20240316_101520";
        assert_eq!(timestamp_from_filename(stem, i64::MAX / 1000), None);
        assert_eq!(timestamp_from_filename(stem, i64::MIN), None);
    }

    #[test]
    fn skips_invalid_match_and_uses_later_valid_one() {
        assert_eq!(
            timestamp_from_filename("99999999_999999 20240316_101520", 0),
            Some(at(2024, 3, 16, 10, 15, 20))
        );
    }
}
