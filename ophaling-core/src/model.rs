//! Domain data structures for addresses, months, and collection calendars.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ports::LookupError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a municipality, as returned by a municipality search.
pub struct MunicipalityId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a street, as returned by a street search.
pub struct StreetId(pub String);

impl fmt::Display for MunicipalityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Display for StreetId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for MunicipalityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<&str> for StreetId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Fully resolved address used by the collection queries.
pub struct CollectionAddress {
    /// Municipality the street belongs to.
    pub municipality: MunicipalityId,
    /// Street within the municipality.
    pub street: StreetId,
    /// House number without suffix.
    pub house_number: String,
    /// House number suffix ("toevoeging"), empty when the address has none.
    pub house_suffix: String,
}

impl CollectionAddress {
    /// Construct an address without a house suffix.
    #[must_use]
    pub fn new<M, S, H>(municipality: M, street: S, house_number: H) -> Self
    where
        M: Into<MunicipalityId>,
        S: Into<StreetId>,
        H: Into<String>,
    {
        Self {
            municipality: municipality.into(),
            street: street.into(),
            house_number: house_number.into(),
            house_suffix: String::new(),
        }
    }

    /// Set the house suffix, e.g. `A` or `bus 2`.
    #[must_use]
    pub fn with_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.house_suffix = suffix.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Calendar month addressed by the month calendar endpoint.
///
/// Displays as `YYYY-M` with an unpadded month, which is the path segment the
/// remote API expects.
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    /// Build a month from its year and 1-based month number.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidMonth`] when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, LookupError> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(LookupError::InvalidMonth(month))
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month number, 1 through 12.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }
}

impl From<NaiveDate> for CalendarMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}-{}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// Single scheduled pickup as listed by the month calendar endpoint.
pub struct CollectionEvent {
    /// Pickup date as sent by the API (`YYYY-MM-DD`).
    pub date: String,
    /// Waste category, e.g. `GFT` or `Restafval`.
    pub category: String,
    /// Link to the category detail page.
    #[serde(rename = "detailUrl")]
    pub detail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// What is collected on a calendar day.
pub struct CalendarEntry {
    /// Waste category.
    pub category: String,
    /// Link to the category detail page.
    pub detail_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Collection events keyed by their date string.
pub struct Calendar {
    days: BTreeMap<String, CalendarEntry>,
}

impl Calendar {
    /// Reshape a list of events into a date-keyed calendar.
    ///
    /// A later event replaces an earlier one with the same date.
    #[must_use]
    pub fn from_events<I: IntoIterator<Item = CollectionEvent>>(events: I) -> Self {
        events.into_iter().collect()
    }

    /// Entry for the given date string, if any.
    #[must_use]
    pub fn get(&self, date: &str) -> Option<&CalendarEntry> {
        self.days.get(date)
    }

    /// Number of days with a collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the calendar has no collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Iterate over `(date, entry)` pairs in date order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, CalendarEntry> {
        self.days.iter()
    }
}

impl FromIterator<CollectionEvent> for Calendar {
    fn from_iter<I: IntoIterator<Item = CollectionEvent>>(events: I) -> Self {
        let days = events
            .into_iter()
            .map(|event| {
                (
                    event.date,
                    CalendarEntry {
                        category: event.category,
                        detail_url: event.detail_url,
                    },
                )
            })
            .collect();
        Self { days }
    }
}

impl IntoIterator for Calendar {
    type Item = (String, CalendarEntry);
    type IntoIter = btree_map::IntoIter<String, CalendarEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.into_iter()
    }
}

impl<'cal> IntoIterator for &'cal Calendar {
    type Item = (&'cal String, &'cal CalendarEntry);
    type IntoIter = btree_map::Iter<'cal, String, CalendarEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(date: &str, category: &str, detail_url: &str) -> CollectionEvent {
        CollectionEvent {
            date: date.to_owned(),
            category: category.to_owned(),
            detail_url: detail_url.to_owned(),
        }
    }

    #[test]
    fn calendar_is_keyed_by_event_date() {
        let events: Vec<CollectionEvent> = serde_json::from_value(json!([
            {"date": "2022-03-08", "category": "GFT", "detailUrl": "/x"},
            {"date": "2022-03-15", "category": "Restafval", "detailUrl": "/y"}
        ]))
        .expect("events should deserialize");

        let calendar = Calendar::from_events(events);

        assert_eq!(
            serde_json::to_value(&calendar).expect("calendar should serialize"),
            json!({
                "2022-03-08": {"category": "GFT", "detail_url": "/x"},
                "2022-03-15": {"category": "Restafval", "detail_url": "/y"}
            }),
            "calendar should map each date to its category and detail url"
        );
    }

    #[test]
    fn later_event_on_same_date_wins() {
        let calendar = Calendar::from_events(vec![
            event("2022-03-08", "GFT", "/gft"),
            event("2022-03-08", "PMD", "/pmd"),
        ]);

        assert_eq!(calendar.len(), 1, "duplicate dates collapse to one day");
        assert_eq!(
            calendar.get("2022-03-08").map(|entry| entry.category.as_str()),
            Some("PMD"),
            "the last event for a date is kept"
        );
    }

    #[test]
    fn calendar_iterates_in_date_order() {
        let calendar = Calendar::from_events(vec![
            event("2022-03-15", "Restafval", "/y"),
            event("2022-03-08", "GFT", "/x"),
        ]);

        let borrowed: Vec<&str> = calendar.iter().map(|(date, _)| date.as_str()).collect();
        assert_eq!(
            borrowed,
            ["2022-03-08", "2022-03-15"],
            "days should be listed chronologically"
        );

        let owned: Vec<(String, String)> = calendar
            .into_iter()
            .map(|(date, entry)| (date, entry.category))
            .collect();
        assert_eq!(
            owned,
            [
                ("2022-03-08".to_owned(), "GFT".to_owned()),
                ("2022-03-15".to_owned(), "Restafval".to_owned()),
            ],
            "owned iteration yields the same order with entries"
        );
    }

    #[test]
    fn ids_display_their_raw_value() {
        assert_eq!(MunicipalityId::from("71022").to_string(), "71022", "municipality id");
        assert_eq!(StreetId::from("9876").to_string(), "9876", "street id");
    }

    #[test]
    fn empty_event_list_gives_empty_calendar() {
        let calendar = Calendar::from_events(Vec::new());
        assert!(calendar.is_empty(), "no events means no collection days");
    }

    #[test]
    fn month_displays_without_padding() {
        let march = CalendarMonth::new(2022, 3).expect("march is valid");
        let december = CalendarMonth::new(2022, 12).expect("december is valid");

        assert_eq!(march.year(), 2022, "year is kept");
        assert_eq!(march.month(), 3, "month is kept");
        assert_eq!(march.to_string(), "2022-3", "single digit months are not padded");
        assert_eq!(december.to_string(), "2022-12", "two digit months stay as-is");
    }

    #[test]
    fn month_from_date() {
        let date = NaiveDate::from_ymd_opt(2022, 3, 8).expect("valid date");
        assert_eq!(
            CalendarMonth::from(date),
            CalendarMonth::new(2022, 3).expect("march is valid"),
            "month should take the year and month of the date"
        );
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        assert!(
            matches!(CalendarMonth::new(2022, 0), Err(LookupError::InvalidMonth(0))),
            "month zero is invalid"
        );
        assert!(
            matches!(CalendarMonth::new(2022, 13), Err(LookupError::InvalidMonth(13))),
            "month thirteen is invalid"
        );
    }

    #[test]
    fn address_suffix_defaults_to_empty() {
        let address = CollectionAddress::new("123", "45", "10");
        assert_eq!(address.house_suffix, "", "suffix should default to empty");

        let with_suffix = address.with_suffix("A");
        assert_eq!(with_suffix.house_suffix, "A", "suffix should be set");
    }
}
