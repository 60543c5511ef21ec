//! Date and time utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{
    format_description::well_known::Rfc3339, macros::format_description,
    UtcOffset,
};
use time_tz::{timezones, OffsetDateTimeExt as _, TimeZone as _, Tz};

/// Untyped date and time.
pub type DateTime = DateTimeOf;

/// UTC date and time.
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Inner representation of the date and time.
    inner: time::OffsetDateTime,

    /// Type parameter describing the kind of date and time.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// Creates a new [`DateTime`] representing the current date and time.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn now() -> Self {
        let inner = time::OffsetDateTime::now_utc();
        Self {
            _of: PhantomData,
            inner: inner
                .replace_microsecond(inner.microsecond())
                .expect("infallible"),
        }
    }

    /// Creates a new [`DateTime`] from the provided [RFC 3339] string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid [RFC 3339] date and time.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub fn from_rfc3339(input: &str) -> Result<Self, ParseError> {
        use ParseError as E;

        time::OffsetDateTime::parse(input, &Rfc3339)
            .map_err(E::Parse)?
            .try_into()
            .map_err(E::ComponentRange)
    }

    /// Returns the [`DateTime`] as an [RFC 3339] string.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.inner.format(&Rfc3339).unwrap_or_else(|e| {
            panic!("cannot format `DateTime` as RFC 3339: {e}")
        })
    }

    /// Returns the calendar [`Date`] of this [`DateTime`] as observed in the
    /// provided [`TimeZone`].
    #[must_use]
    pub fn date_in(&self, zone: TimeZone) -> Date {
        self.inner.to_offset(zone.offset_at(self.inner)).date().into()
    }

    /// Coerces one kind of [`DateTime`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> TryFrom<time::OffsetDateTime> for DateTimeOf<Of> {
    type Error = time::error::ComponentRange;

    fn try_from(dt: time::OffsetDateTime) -> Result<Self, Self::Error> {
        dt.to_offset(UtcOffset::UTC)
            .replace_microsecond(dt.microsecond())
            .map(|inner| Self {
                inner,
                _of: PhantomData,
            })
    }
}

impl<Of: ?Sized> From<DateTimeOf<Of>> for time::OffsetDateTime {
    fn from(dt: DateTimeOf<Of>) -> Self {
        dt.inner
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw)?
            .try_into()
            .map_err(Box::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date (a day without any time-of-day or offset component).
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Creates a new [`Date`] out of the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Into::into)
    }

    /// Normalizes the provided date-like `input` into a calendar [`Date`].
    ///
    /// Accepts a plain `YYYY-MM-DD` date, or a timestamp having a time part
    /// (`YYYY-MM-DDTHH:MM[:SS[.fff]]`, separated by `T` or a space, with an
    /// optional `Z` or `±HH:MM` offset). The date of a timestamp is the one
    /// written in it, so any time of the same day normalizes identically.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Empty`] if the `input` is blank;
    /// - [`ParseError::Parse`] if the date part is malformed;
    /// - [`ParseError::InvalidTime`] if the time part is malformed.
    pub fn normalize(input: &str) -> Result<Self, ParseError> {
        use ParseError as E;

        let input = input.trim();
        if input.is_empty() {
            return Err(E::Empty);
        }

        let (day, time) = match input.find(['T', 't', ' ']) {
            Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
            None => (input, None),
        };

        let date = time::Date::parse(day, format_description!("[year]-[month]-[day]"))
            .map_err(E::Parse)?;
        if let Some(time) = time {
            if !is_time_of_day(time) {
                return Err(E::InvalidTime);
            }
        }

        Ok(date.into())
    }

    /// Normalizes the optional date-like `input` into a calendar [`Date`].
    ///
    /// [`None`] or blank `input` results in [`None`].
    ///
    /// # Errors
    ///
    /// If the provided non-blank `input` cannot be [normalized].
    ///
    /// [normalized]: DateOf::normalize
    pub fn normalize_opt(input: Option<&str>) -> Result<Option<Self>, ParseError> {
        match input.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => Self::normalize(s).map(Some),
        }
    }

    /// Returns the [`Date`] before this one, if any.
    #[must_use]
    pub fn previous_day(self) -> Option<Self> {
        self.inner.previous_day().map(Into::into)
    }

    /// Returns the [`Date`] after this one, if any.
    #[must_use]
    pub fn next_day(self) -> Option<Self> {
        self.inner.next_day().map(Into::into)
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Checks whether the provided `input` is a time of day with an optional
/// offset.
fn is_time_of_day(input: &str) -> bool {
    let (time, offset) = split_offset(input);

    if let Some(offset) = offset {
        let parsed = UtcOffset::parse(
            offset,
            format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
        );
        if parsed.is_err() {
            return false;
        }
    }

    time::Time::parse(
        time,
        format_description!("[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        time::Time::parse(time, format_description!("[hour]:[minute]:[second]"))
    })
    .or_else(|_| time::Time::parse(time, format_description!("[hour]:[minute]")))
    .is_ok()
}

/// Splits the provided time of day `input` into the time itself and its
/// `±HH:MM` offset (if any). A `Z` suffix is stripped.
fn split_offset(input: &str) -> (&str, Option<&str>) {
    if let Some(time) = input.strip_suffix(['Z', 'z']) {
        return (time, None);
    }
    if let Some(i) = input.len().checked_sub(6) {
        if matches!(input.as_bytes()[i], b'+' | b'-') {
            if let (Some(time), Some(offset)) = (input.get(..i), input.get(i..))
            {
                return (time, Some(offset));
            }
        }
    }
    (input, None)
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Hash for DateOf<Of> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.inner.year(),
            u8::from(self.inner.month()),
            self.inner.day(),
        )
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

/// Error of parsing a [`Date`] or a [`DateTime`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// Provided string is blank.
    #[display("no date provided")]
    Empty,

    /// Failed to parse the string.
    Parse(time::error::Parse),

    /// Parsed value has an out of range component.
    ComponentRange(time::error::ComponentRange),

    /// Time part of a timestamp is malformed.
    #[display("malformed time part")]
    InvalidTime,

    /// Time zone name is not a known IANA one.
    #[display("unknown time zone")]
    UnknownTimeZone,
}

/// Time zone defining which calendar day it is at a given instant.
///
/// Either a named [IANA] zone (following its daylight saving rules) or a
/// fixed offset from UTC.
///
/// [IANA]: https://www.iana.org/time-zones
#[derive(Clone, Copy)]
pub struct TimeZone(Zone);

/// Inner representation of a [`TimeZone`].
#[derive(Clone, Copy)]
enum Zone {
    /// Fixed offset from UTC.
    Fixed(UtcOffset),

    /// Named [IANA] zone.
    ///
    /// [IANA]: https://www.iana.org/time-zones
    Named(&'static Tz),
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::UTC
    }
}

impl TimeZone {
    /// UTC [`TimeZone`].
    pub const UTC: Self = Self(Zone::Fixed(UtcOffset::UTC));

    /// Creates a new [`TimeZone`] shifted from UTC by the provided number of
    /// hours and minutes.
    ///
    /// [`None`] is returned if the offset is out of range.
    #[must_use]
    pub fn from_hm(hours: i8, minutes: i8) -> Option<Self> {
        UtcOffset::from_hms(hours, minutes, 0)
            .ok()
            .map(|o| Self(Zone::Fixed(o)))
    }

    /// Looks up the [IANA] [`TimeZone`] with the provided `name` (like
    /// `Australia/Sydney`).
    ///
    /// [IANA]: https://www.iana.org/time-zones
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        timezones::get_by_name(name).map(|tz| Self(Zone::Named(tz)))
    }

    /// Returns the [`UtcOffset`] this [`TimeZone`] has at the provided
    /// instant.
    #[must_use]
    pub fn offset_at(self, at: time::OffsetDateTime) -> UtcOffset {
        match self.0 {
            Zone::Fixed(offset) => offset,
            Zone::Named(tz) => at.to_timezone(tz).offset(),
        }
    }
}

impl Eq for TimeZone {}
impl PartialEq for TimeZone {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Zone::Fixed(a), Zone::Fixed(b)) => a == b,
            (Zone::Named(a), Zone::Named(b)) => a.name() == b.name(),
            (Zone::Fixed(_), Zone::Named(_))
            | (Zone::Named(_), Zone::Fixed(_)) => false,
        }
    }
}

impl fmt::Debug for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeZone({self})")
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Zone::Fixed(offset) => {
                let sign = if offset.is_negative() { '-' } else { '+' };
                write!(
                    f,
                    "{sign}{:02}:{:02}",
                    offset.whole_hours().unsigned_abs(),
                    offset.minutes_past_hour().unsigned_abs(),
                )
            }
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for TimeZone {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("UTC") || s.eq_ignore_ascii_case("Z") {
            return Ok(Self::UTC);
        }
        if s.starts_with(['+', '-']) {
            return UtcOffset::parse(
                s,
                format_description!(
                    "[offset_hour sign:mandatory]:[offset_minute]"
                ),
            )
            .map(|o| Self(Zone::Fixed(o)))
            .map_err(ParseError::Parse);
        }
        Self::named(s).ok_or(ParseError::UnknownTimeZone)
    }
}

/// Source of the current [`DateTime`] and [`Date`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    /// [`TimeZone`] defining the current [`Date`].
    zone: TimeZone,

    /// [`DateTime`] this [`Clock`] is stopped at, if any.
    frozen: Option<DateTime>,
}

impl Clock {
    /// Creates a new running [`Clock`] in the provided [`TimeZone`].
    #[must_use]
    pub fn new(zone: TimeZone) -> Self {
        Self { zone, frozen: None }
    }

    /// Stops this [`Clock`] at the provided [`DateTime`].
    #[must_use]
    pub fn frozen_at(self, at: DateTime) -> Self {
        Self {
            frozen: Some(at),
            ..self
        }
    }

    /// Returns [`TimeZone`] of this [`Clock`].
    #[must_use]
    pub fn zone(&self) -> TimeZone {
        self.zone
    }

    /// Returns the current [`DateTime`].
    #[must_use]
    pub fn now(&self) -> DateTime {
        self.frozen.unwrap_or_else(DateTime::now)
    }

    /// Returns the current [`Date`] in the [`TimeZone`] of this [`Clock`].
    #[must_use]
    pub fn today(&self) -> Date {
        self.now().date_in(self.zone)
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use super::{DateOf, TimeZone};

    impl<Of: ?Sized> Serialize for DateOf<Of> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de, Of: ?Sized> Deserialize<'de> for DateOf<Of> {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::normalize(&s).map_err(D::Error::custom)
        }
    }

    impl Serialize for TimeZone {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for TimeZone {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use proptest::prelude::*;

    use super::{Clock, Date, DateTime, ParseError, TimeZone};

    fn date(s: &str) -> Date {
        Date::normalize(s).unwrap()
    }

    #[test]
    fn normalizes_plain_dates() {
        assert_eq!(date("2025-01-10"), Date::from_ymd(2025, 1, 10).unwrap());
        assert_eq!(date("  2025-01-10 "), date("2025-01-10"));
        assert_eq!(date("2024-02-29").to_string(), "2024-02-29");
    }

    #[test]
    fn normalizes_timestamps_to_their_day() {
        let day = date("2025-01-10");

        assert_eq!(date("2025-01-10T00:00:00.000Z"), day);
        assert_eq!(date("2025-01-10T23:59:59Z"), day);
        assert_eq!(date("2025-01-10T08:30:00+10:00"), day);
        assert_eq!(date("2025-01-10T08:30:00-05:00"), day);
        assert_eq!(date("2025-01-10 13:45:00"), day);
        assert_eq!(date("2025-01-10T13:45"), day);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(matches!(Date::normalize(""), Err(ParseError::Empty)));
        assert!(matches!(Date::normalize("   "), Err(ParseError::Empty)));
        assert!(matches!(
            Date::normalize("2025-02-30"),
            Err(ParseError::Parse(_)),
        ));
        assert!(matches!(
            Date::normalize("10/01/2025"),
            Err(ParseError::Parse(_)),
        ));
        assert!(matches!(
            Date::normalize("2025-01-10Tnoon"),
            Err(ParseError::InvalidTime),
        ));
        assert!(matches!(
            Date::normalize("2025-01-10T25:00:00Z"),
            Err(ParseError::InvalidTime),
        ));
        assert!(Date::normalize("yesterday").is_err());
    }

    #[test]
    fn normalizes_optional_input() {
        assert_eq!(Date::normalize_opt(None).unwrap(), None);
        assert_eq!(Date::normalize_opt(Some(" ")).unwrap(), None);
        assert_eq!(
            Date::normalize_opt(Some("2025-05-01T10:00:00Z")).unwrap(),
            Some(date("2025-05-01")),
        );
        assert!(Date::normalize_opt(Some("nope")).is_err());
    }

    #[test]
    fn steps_days() {
        assert_eq!(date("2025-03-01").previous_day(), Some(date("2025-02-28")));
        assert_eq!(date("2024-12-31").next_day(), Some(date("2025-01-01")));
    }

    #[test]
    fn parses_time_zones() {
        assert_eq!("UTC".parse::<TimeZone>().unwrap(), TimeZone::UTC);
        assert_eq!("+00:00".parse::<TimeZone>().unwrap(), TimeZone::UTC);
        assert_eq!(
            "+10:00".parse::<TimeZone>().unwrap(),
            TimeZone::from_hm(10, 0).unwrap(),
        );
        assert_eq!(
            "-03:30".parse::<TimeZone>().unwrap().to_string(),
            "-03:30",
        );
        assert!("10".parse::<TimeZone>().is_err());
        assert!(matches!(
            "Mars/Olympus".parse::<TimeZone>(),
            Err(ParseError::UnknownTimeZone),
        ));

        let sydney = "Australia/Sydney".parse::<TimeZone>().unwrap();
        assert_eq!(sydney, TimeZone::named("Australia/Sydney").unwrap());
        assert_eq!(sydney.to_string(), "Australia/Sydney");
        assert_ne!(sydney, TimeZone::from_hm(10, 0).unwrap());
    }

    #[test]
    fn clock_tells_day_in_its_zone() {
        let at = DateTime::from_rfc3339("2025-01-09T20:00:00Z").unwrap();

        let utc = Clock::new(TimeZone::UTC).frozen_at(at);
        assert_eq!(utc.now(), at);
        assert_eq!(utc.today(), date("2025-01-09"));

        let sydney = Clock::new(TimeZone::from_hm(11, 0).unwrap()).frozen_at(at);
        assert_eq!(sydney.today(), date("2025-01-10"));
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let sydney = TimeZone::named("Australia/Sydney").unwrap();
        let today = |at: &str| {
            Clock::new(sydney)
                .frozen_at(DateTime::from_rfc3339(at).unwrap())
                .today()
        };

        // Summer time, UTC+11.
        assert_eq!(today("2025-01-09T12:59:00Z"), date("2025-01-09"));
        assert_eq!(today("2025-01-09T13:00:00Z"), date("2025-01-10"));
        assert_eq!(today("2025-01-09T13:30:00Z"), date("2025-01-10"));

        // Standard time, UTC+10.
        assert_eq!(today("2025-07-09T13:30:00Z"), date("2025-07-09"));
        assert_eq!(today("2025-07-09T14:00:00Z"), date("2025-07-10"));
    }

    proptest! {
        #[test]
        fn any_time_of_day_keeps_the_day(
            day in 0u32..3650,
            h in 0u8..24,
            m in 0u8..60,
            s in 0u8..60,
        ) {
            let base = date("2020-01-01");
            let mut d = base;
            for _ in 0..day {
                d = d.next_day().unwrap();
            }

            let plain = d.to_string();
            let stamped = format!("{plain}T{h:02}:{m:02}:{s:02}.000Z");
            prop_assert_eq!(date(&stamped), d);
            prop_assert_eq!(date(&plain), d);
        }
    }
}
