use time::{Date, OffsetDateTime, UtcOffset};

/// Half-open `[start, end)` span of one calendar day in a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub date: Date,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DayWindow {
    /// `None` for the last representable date, which has no following midnight.
    pub fn for_date(date: Date, offset: UtcOffset) -> Option<Self> {
        Some(Self {
            date,
            start: date.midnight().assume_offset(offset),
            end: date.next_day()?.midnight().assume_offset(offset),
        })
    }

    pub fn containing(instant: OffsetDateTime, offset: UtcOffset) -> Option<Self> {
        Self::for_date(instant.to_offset(offset).date(), offset)
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// `YYYY-MM-DD` rendering used in queries and responses.
pub mod iso_date {
    use serde::Serializer;
    use time::{macros::format_description, Date};

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(serde::ser::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn parse(raw: &str) -> Result<Date, time::error::Parse> {
        Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
    }
}

/// Inclusive range of calendar days, resolved to instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub from: DayWindow,
    pub to: DayWindow,
}

impl DayRange {
    pub const MAX_DAYS: i64 = 366;

    pub fn new(from: Date, to: Date, offset: UtcOffset) -> Option<Self> {
        let days = (to - from).whole_days();
        if days < 0 || days >= Self::MAX_DAYS {
            return None;
        }
        Some(Self {
            from: DayWindow::for_date(from, offset)?,
            to: DayWindow::for_date(to, offset)?,
        })
    }

    pub fn start(&self) -> OffsetDateTime {
        self.from.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.to.end
    }
}
