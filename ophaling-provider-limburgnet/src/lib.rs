//! Client for the Limburg.net waste collection calendar API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::{ParseError, Url};

use ophaling_core::{
    model::{Calendar, CalendarMonth, CollectionAddress, CollectionEvent, MunicipalityId, StreetId},
    ports::{Clock, CollectionLookup, LookupError, SystemClock},
};

const BASE_URL: &str = "https://limburg.net/api-proxy/public/";
const USER_AGENT: &str = concat!("ophaling/", env!("CARGO_PKG_VERSION"));

/// Response from /kalender/{gemeente}/{YYYY-M}
#[derive(Debug, Deserialize)]
struct MonthCalendarResponse {
    events: Vec<CollectionEvent>,
    // the body also carries month metadata we don't use
}

/// Lookup client for Limburg.net.
pub struct LimburgNetClient {
    client: Client,
    base_url: Url,
    clock: Arc<dyn Clock>,
}

/// Builder for [`LimburgNetClient`].
#[derive(Default)]
pub struct LimburgNetClientBuilder {
    base_url: Option<Url>,
    http_client: Option<Client>,
    user_agent: Option<String>,
    clock: Option<Arc<dyn Clock>>,
}

impl LimburgNetClientBuilder {
    /// Override the API base URL (defaults to the public Limburg.net proxy).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Use an already configured HTTP client.
    #[must_use]
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// User-Agent for the default HTTP client. Ignored with [`Self::http_client`].
    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Date source used to pick the current month.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidUrl`] when the base URL cannot carry a
    /// path, or [`LookupError::Network`] when the HTTP client fails to build.
    pub fn build(self) -> Result<LimburgNetClient, LookupError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(BASE_URL)?,
        };
        if base_url.cannot_be_a_base() {
            return Err(LookupError::InvalidUrl(
                ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let client = match self.http_client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
                .build()?,
        };

        Ok(LimburgNetClient {
            client,
            base_url,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

impl LimburgNetClient {
    /// Create a client for the public API bound to the given HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] if the built-in base URL fails to parse.
    pub fn new(client: Client) -> Result<Self, LookupError> {
        Self::builder().http_client(client).build()
    }

    /// Start configuring a client.
    #[must_use]
    pub fn builder() -> LimburgNetClientBuilder {
        LimburgNetClientBuilder::default()
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// `.` and `..` are rejected since the URL path would drop them.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, LookupError> {
        if let Some(segment) = segments.iter().find(|segment| matches!(**segment, "." | "..")) {
            return Err(LookupError::InvalidSegment((*segment).to_owned()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| LookupError::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // Single GET with status handling; every lookup goes through here.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let request = self.client.get(url).query(query).build()?;
        let url = request.url().to_string();
        debug!(%url, "sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "response received");

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "request rejected");
            return Err(LookupError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(LookupError::from)
    }
}

fn address_query(address: &CollectionAddress) -> [(&str, &str); 3] {
    [
        ("straatNummer", address.street.0.as_str()),
        ("huisNummer", address.house_number.as_str()),
        ("toevoeging", address.house_suffix.as_str()),
    ]
}

#[async_trait]
impl CollectionLookup for LimburgNetClient {
    #[instrument(skip(self))]
    async fn search_municipality(&self, municipality: &str) -> Result<Value, LookupError> {
        let url = self.endpoint(&["afval-kalender", "gemeenten", "search"])?;
        self.fetch_json(url, &[("query", municipality)]).await
    }

    #[instrument(skip(self))]
    async fn search_street(
        &self,
        street: &str,
        municipality: &MunicipalityId,
    ) -> Result<Value, LookupError> {
        let url = self.endpoint(&[
            "afval-kalender",
            "gemeente",
            municipality.0.as_str(),
            "straten",
            "search",
        ])?;
        self.fetch_json(url, &[("query", street)]).await
    }

    #[instrument(skip(self))]
    async fn search_housenumber(
        &self,
        house_number: &str,
        street: &StreetId,
    ) -> Result<Value, LookupError> {
        let url = self.endpoint(&[
            "afval-kalender",
            "straat",
            street.0.as_str(),
            "huisnummers",
            "search",
        ])?;
        self.fetch_json(url, &[("query", house_number)]).await
    }

    #[instrument(skip(self))]
    async fn fetch_next_collection(
        &self,
        address: &CollectionAddress,
    ) -> Result<Value, LookupError> {
        let url = self.endpoint(&["volgende-afval-ophaling", address.municipality.0.as_str()])?;
        self.fetch_json(url, &address_query(address)).await
    }

    #[instrument(skip(self))]
    async fn fetch_calendar(
        &self,
        address: &CollectionAddress,
        month: CalendarMonth,
    ) -> Result<Calendar, LookupError> {
        let month_segment = month.to_string();
        let url = self.endpoint(&[
            "kalender",
            address.municipality.0.as_str(),
            month_segment.as_str(),
        ])?;

        let response = self
            .fetch_json::<MonthCalendarResponse>(url, &address_query(address))
            .await?;
        debug!(events = response.events.len(), "calendar events received");

        Ok(Calendar::from_events(response.events))
    }

    #[instrument(skip(self))]
    async fn fetch_month_calendar(
        &self,
        address: &CollectionAddress,
    ) -> Result<Calendar, LookupError> {
        let month = CalendarMonth::from(self.clock.today());
        self.fetch_calendar(address, month).await
    }
}
