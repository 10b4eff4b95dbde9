use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How close a product is to its expiry date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWindow {
    /// Within the last few days (or already past)
    Urgent,
    /// Expiring soon, but not urgently
    Soon,
    /// Far enough out that no markdown applies
    Fresh,
}

impl ExpiryWindow {
    /// Classify a day count. Both bounds are inclusive.
    pub fn classify(days_left: i64, urgent_days: i64, soon_days: i64) -> Self {
        if days_left <= urgent_days {
            ExpiryWindow::Urgent
        } else if days_left <= soon_days {
            ExpiryWindow::Soon
        } else {
            ExpiryWindow::Fresh
        }
    }
}

impl std::fmt::Display for ExpiryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiryWindow::Urgent => write!(f, "urgent"),
            ExpiryWindow::Soon => write!(f, "soon"),
            ExpiryWindow::Fresh => write!(f, "fresh"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExpiryError {
    #[error("time data '{input}' does not match format 'YYYY-MM-DD': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parse the calendar date of an ISO-8601-like string.
///
/// Anything from the first `T` or space onwards is discarded, so
/// `2099-01-01T00:00:00Z` and `2099-01-01` are the same day.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, ExpiryError> {
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|source| ExpiryError::InvalidDate {
        input: date_part.to_string(),
        source,
    })
}

/// Whole days from `today` until `expiry`; negative once expired.
pub fn days_left(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// A festival window is open up to and including its end date.
pub fn is_festival_active(festival_end: NaiveDate, today: NaiveDate) -> bool {
    today <= festival_end
}
