use chrono::{DateTime, FixedOffset, TimeZone};

use crate::{Error, Result};

// -------------------------------------------------------------------------------------------------
// TzOffset
// -------------------------------------------------------------------------------------------------
/// A UTC offset in minutes, as recorded in Git author and committer lines.
///
/// Renders as `±HHMM`, e.g., `+0000`, `-0530`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TzOffset(i16);

impl TzOffset {
    /// The largest magnitude offset accepted, in minutes
    pub const MAX_MINUTES: i16 = 23 * 60 + 59;

    pub const UTC: TzOffset = TzOffset(0);

    pub fn from_minutes(minutes: i32) -> Result<Self> {
        match i16::try_from(minutes) {
            Ok(m) if m.unsigned_abs() <= Self::MAX_MINUTES.unsigned_abs() => Ok(TzOffset(m)),
            _ => Err(Error::validation(
                "timezone offset",
                format!("{minutes} minutes is out of range"),
            )),
        }
    }

    #[inline]
    pub fn minutes(&self) -> i32 {
        i32::from(self.0)
    }

    /// Convert to a `chrono::FixedOffset`.
    pub fn to_fixed_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.minutes() * 60)
            .expect("offsets within a day should be representable")
    }

    /// Convert from a `chrono::FixedOffset`.
    ///
    /// Git records offsets with minute precision; any leftover seconds are an error.
    pub fn from_fixed_offset(offset: &FixedOffset) -> Result<Self> {
        let seconds = offset.local_minus_utc();
        if seconds % 60 != 0 {
            return Err(Error::validation(
                "timezone offset",
                format!("{seconds} seconds is not a whole number of minutes"),
            ));
        }
        Self::from_minutes(seconds / 60)
    }
}

impl std::fmt::Display for TzOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 >= 0 { '+' } else { '-' };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{:02}{:02}", abs / 60, abs % 60)
    }
}

impl std::str::FromStr for TzOffset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::validation("timezone offset", format!("expected ±HHMM, found {s:?}"));

        let bytes = s.as_bytes();
        if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
            return Err(bad());
        }
        let sign = match bytes[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return Err(bad()),
        };
        let hours: i32 = s[1..3].parse().map_err(|_| bad())?;
        let minutes: i32 = s[3..5].parse().map_err(|_| bad())?;
        if minutes >= 60 {
            return Err(bad());
        }
        Self::from_minutes(sign * (hours * 60 + minutes))
    }
}

// -------------------------------------------------------------------------------------------------
// CommitIdentity
// -------------------------------------------------------------------------------------------------
/// An author or committer: who, and when
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommitIdentity {
    name: String,
    email: String,
    seconds: i64,
    offset: TzOffset,
}

impl CommitIdentity {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        seconds: i64,
        offset: TzOffset,
    ) -> Result<Self> {
        let name = name.into();
        let email = email.into();
        check_identity_field("identity name", &name)?;
        check_identity_field("identity email", &email)?;
        if name.trim() != name {
            return Err(Error::validation(
                "identity name",
                format!("{name:?} has surrounding whitespace"),
            ));
        }
        Ok(CommitIdentity {
            name,
            email,
            seconds,
            offset,
        })
    }

    /// Create an identity stamped with the given time, keeping its offset.
    pub fn at<Tz: TimeZone>(
        name: impl Into<String>,
        email: impl Into<String>,
        time: &DateTime<Tz>,
    ) -> Result<Self> {
        let time = time.fixed_offset();
        let offset = TzOffset::from_fixed_offset(time.offset())?;
        Self::new(name, email, time.timestamp(), offset)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[inline]
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    #[inline]
    pub fn offset(&self) -> TzOffset {
        self.offset
    }

    /// The timestamp of this identity in its own offset.
    pub fn datetime(&self) -> Result<DateTime<FixedOffset>> {
        self.offset
            .to_fixed_offset()
            .timestamp_opt(self.seconds, 0)
            .single()
            .ok_or_else(|| {
                Error::validation("timestamp", format!("{} is out of range", self.seconds))
            })
    }
}

/// Render as it appears after `author ` or `committer ` in a commit object.
impl std::fmt::Display for CommitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}> {} {}", self.name, self.email, self.seconds, self.offset)
    }
}

fn check_identity_field(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '<' | '>' | '\n' | '\r' | '\0')) {
        return Err(Error::validation(field, format!("{value:?} contains {c:?}")));
    }
    Ok(())
}
