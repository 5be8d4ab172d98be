//! Traits describing lookup capabilities and the shared error type.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Error as ReqwestError;
use serde_json::{Error as JsonError, Value};
use url::ParseError as UrlParseError;

use crate::model::{Calendar, CalendarMonth, CollectionAddress, MunicipalityId, StreetId};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the collection API.
pub enum LookupError {
    /// The API answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Response body was not the expected JSON.
    #[error("Decode error: {0}")]
    Decode(#[from] JsonError),
    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlParseError),
    /// Identifier that cannot be used as a URL path segment.
    #[error("Invalid path segment: {0:?}")]
    InvalidSegment(String),
    /// Month number outside 1 through 12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
}

impl LookupError {
    /// HTTP status code when the API rejected the request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Source of the current date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
/// Clock reading the local system date.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
/// Clock pinned to a fixed date.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[async_trait]
/// Lookups offered by a waste collection backend.
///
/// Search results and upcoming collections are passed through as the JSON the
/// backend returned.
pub trait CollectionLookup: Send + Sync {
    /// Search municipalities by name.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the request fails or is rejected.
    async fn search_municipality(&self, municipality: &str) -> Result<Value, LookupError>;

    /// Search streets by name within a municipality.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the request fails or is rejected.
    async fn search_street(
        &self,
        street: &str,
        municipality: &MunicipalityId,
    ) -> Result<Value, LookupError>;

    /// Search house numbers within a street.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the request fails or is rejected.
    async fn search_housenumber(
        &self,
        house_number: &str,
        street: &StreetId,
    ) -> Result<Value, LookupError>;

    /// Upcoming collections for an address.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the request fails or is rejected.
    async fn fetch_next_collection(
        &self,
        address: &CollectionAddress,
    ) -> Result<Value, LookupError>;

    /// Collection calendar of an address for the given month.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the request fails, is rejected, or the
    /// body does not list events.
    async fn fetch_calendar(
        &self,
        address: &CollectionAddress,
        month: CalendarMonth,
    ) -> Result<Calendar, LookupError>;

    /// Collection calendar of an address for the current month.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the request fails, is rejected, or the
    /// body does not list events.
    async fn fetch_month_calendar(
        &self,
        address: &CollectionAddress,
    ) -> Result<Calendar, LookupError>;
}
