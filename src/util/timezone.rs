use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let seconds = utc.unix_timestamp();
    let nanos: u32 = utc.nanosecond();
    let datetime_utc = DateTime::<Utc>::from_timestamp(seconds, nanos)
        .or_else(|| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_default();
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Calendar date of `time` as observed in `tz`.
pub fn localized_date(time: OffsetDateTime, tz: Tz) -> Date {
    local_offset(time, tz)
        .map(|offset| time.to_offset(offset).date())
        .unwrap_or_else(|| time.to_offset(UtcOffset::UTC).date())
}

fn local_offset(time: OffsetDateTime, tz: Tz) -> Option<UtcOffset> {
    let localized = localized_datetime(time, tz);
    let seconds = localized.offset().fix().local_minus_utc();
    UtcOffset::from_whole_seconds(seconds).ok()
}

/// Longest clock jump searched when a day boundary falls inside a DST gap.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// First instant of `date` in `tz`. When local midnight is skipped by a
/// transition, the day starts at the first wall-clock time that exists.
pub fn day_start(date: Date, tz: Tz) -> Option<OffsetDateTime> {
    let naive = naive_date(date)?.and_hms_opt(0, 0, 0)?;
    let local = (0..=MAX_GAP_MINUTES).find_map(|minutes| {
        let shifted = shift_minutes(naive, minutes)?;
        tz.from_local_datetime(&shifted).earliest()
    })?;
    to_offset_datetime(local)
}

/// Last instant of `date` in `tz`, stepping back out of a DST gap if needed.
pub fn day_end(date: Date, tz: Tz) -> Option<OffsetDateTime> {
    let naive = naive_date(date)?.and_hms_nano_opt(23, 59, 59, 999_999_999)?;
    let local = (0..=MAX_GAP_MINUTES).find_map(|minutes| {
        let shifted = shift_minutes(naive, -minutes)?;
        tz.from_local_datetime(&shifted).latest()
    })?;
    to_offset_datetime(local)
}

fn shift_minutes(naive: NaiveDateTime, minutes: i64) -> Option<NaiveDateTime> {
    naive.checked_add_signed(TimeDelta::try_minutes(minutes)?)
}

fn naive_date(date: Date) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), u32::from(u8::from(date.month())), u32::from(date.day()))
}

fn to_offset_datetime(local: DateTime<Tz>) -> Option<OffsetDateTime> {
    let nanos = i128::from(local.timestamp()) * 1_000_000_000
        + i128::from(local.timestamp_subsec_nanos());
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// Year and month of `time` in `tz`.
pub fn localized_year_month(time: OffsetDateTime, tz: Tz) -> (i32, u8) {
    let localized = localized_datetime(time, tz);
    (localized.year(), localized.month() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn localized_date_crosses_midnight_in_tokyo() {
        let instant = datetime!(2025-01-31 20:00 UTC);
        assert_eq!(localized_date(instant, chrono_tz::Asia::Tokyo), date!(2025 - 02 - 01));
        assert_eq!(localized_date(instant, chrono_tz::UTC), date!(2025 - 01 - 31));
    }

    #[test]
    fn day_bounds_follow_the_zone_offset() {
        let start = day_start(date!(2025 - 03 - 10), chrono_tz::Asia::Tokyo).expect("start");
        let end = day_end(date!(2025 - 03 - 10), chrono_tz::Asia::Tokyo).expect("end");

        assert_eq!(start, datetime!(2025-03-09 15:00 UTC));
        assert!(end > datetime!(2025-03-10 14:59:59 UTC));
        assert!(end < datetime!(2025-03-10 15:00 UTC));
    }

    #[test]
    fn day_start_skips_forward_over_a_midnight_dst_gap() {
        // Sao Paulo jumped from 00:00 -03 to 01:00 -02 on 2018-11-04.
        let start = day_start(date!(2018 - 11 - 04), chrono_tz::America::Sao_Paulo)
            .expect("start inside a gap still resolves");
        assert_eq!(start, datetime!(2018-11-04 03:00 UTC));

        let end = day_end(date!(2018 - 11 - 03), chrono_tz::America::Sao_Paulo).expect("end");
        assert!(end < start);
        assert!(end > datetime!(2018-11-04 02:59:59 UTC));
    }

    #[test]
    fn year_month_uses_local_calendar() {
        let instant = datetime!(2024-12-31 16:30 UTC);
        assert_eq!(
            localized_year_month(instant, chrono_tz::Asia::Tokyo),
            (2025, 1)
        );
    }
}
