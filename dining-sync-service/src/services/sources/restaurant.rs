//! Reservation platform source client.
//!
//! Basic-auth with the api key as username and an empty password. The
//! bookings listing is offset-paginated; fetching continues while full
//! pages come back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{CreateReservationPayload, ReservationSource, SourceError};
use crate::config::ReservationSourceConfig;
use crate::models::{
    CustomFieldDefinition, CustomFieldValue, DiningTable, OpeningHours, ReservationGuest,
    ReservationStatus, RestaurantBooking, ServicePeriodTimes,
};

const SOURCE: &str = "reservation platform";
const PAGE_SIZE: usize = 100;

/// Client for the reservation platform's REST API.
#[derive(Clone)]
pub struct ReservationPlatformClient {
    client: Client,
    config: ReservationSourceConfig,
}

#[derive(Debug, Deserialize)]
struct BookingRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "dateTime", default)]
    date_time: Option<String>,
    #[serde(default)]
    people: Option<u32>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    guest: Option<ReservationGuest>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "customFields", default)]
    custom_fields: Vec<CustomFieldValue>,
}

impl BookingRecord {
    fn into_domain(self) -> RestaurantBooking {
        RestaurantBooking {
            id: self.id,
            status: ReservationStatus::from_str(self.status.as_deref().unwrap_or("")),
            date_time: self.date_time.as_deref().and_then(parse_date_time),
            people: self.people.unwrap_or(0),
            duration_minutes: self.duration,
            guest: self.guest,
            name: self.name,
            custom_fields: self.custom_fields,
        }
    }
}

fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Serialize)]
struct UpdateStatusRequest<'a> {
    status: &'a str,
}

impl ReservationPlatformClient {
    pub fn new(config: ReservationSourceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(self.config.api_key.expose_secret(), Some(""))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let response = self
            .authed(self.client.get(&url).query(query))
            .send()
            .await
            .map_err(|e| SourceError::network(SOURCE, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Auth { source: SOURCE });
        }
        if !status.is_success() {
            return Err(SourceError::Api {
                source: SOURCE,
                status: status.as_u16(),
                detail: String::new(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::network(SOURCE, e))?;
        serde_json::from_str(&body).map_err(|e| SourceError::invalid(SOURCE, e))
    }
}

#[async_trait]
impl ReservationSource for ReservationPlatformClient {
    async fn fetch_bookings_for(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RestaurantBooking>, SourceError> {
        let from_date_time = format!("{}T00:00:00", date);
        let to_date_time = format!("{}T23:59:59", date);

        let mut all = Vec::new();
        let mut skip = 0usize;
        loop {
            let page: Vec<BookingRecord> = self
                .get_json(
                    "/bookings",
                    &[
                        ("fromDateTime", from_date_time.clone()),
                        ("toDateTime", to_date_time.clone()),
                        ("limit", PAGE_SIZE.to_string()),
                        ("skip", skip.to_string()),
                    ],
                )
                .await?;
            let page_len = page.len();
            all.extend(page.into_iter().map(BookingRecord::into_domain));
            if page_len < PAGE_SIZE {
                break;
            }
            skip += PAGE_SIZE;
        }

        tracing::debug!(bookings = all.len(), %date, "Fetched reservations");
        Ok(all)
    }

    async fn fetch_custom_fields(&self) -> Result<Vec<CustomFieldDefinition>, SourceError> {
        self.get_json("/customFields", &[]).await
    }

    async fn fetch_available_times(
        &self,
        date: NaiveDate,
        people: u32,
    ) -> Result<Vec<ServicePeriodTimes>, SourceError> {
        self.get_json(
            "/bookingFlow/times",
            &[
                ("date", date.to_string()),
                ("people", people.to_string()),
                ("onlyBookableOnline", "false".to_string()),
            ],
        )
        .await
    }

    async fn fetch_available_tables(
        &self,
        people: u32,
        from_date_time: &str,
        to_date_time: &str,
    ) -> Result<Vec<DiningTable>, SourceError> {
        self.get_json(
            "/bookingFlow/availableTables",
            &[
                ("people", people.to_string()),
                ("fromDateTime", from_date_time.to_string()),
                ("toDateTime", to_date_time.to_string()),
                ("returnAllTables", "true".to_string()),
            ],
        )
        .await
    }

    async fn fetch_opening_hours(&self) -> Result<Vec<OpeningHours>, SourceError> {
        self.get_json("/openingHours", &[]).await
    }

    async fn create_booking(
        &self,
        payload: &CreateReservationPayload,
    ) -> Result<RestaurantBooking, SourceError> {
        let url = format!("{}/bookings", self.config.api_base_url);
        let response = self
            .authed(self.client.post(&url).json(payload))
            .send()
            .await
            .map_err(|e| SourceError::network(SOURCE, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Auth { source: SOURCE });
        }
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::network(SOURCE, e))?;
        if !status.is_success() {
            let detail = if body.is_empty() {
                String::new()
            } else {
                format!(" - {}", body)
            };
            return Err(SourceError::Api {
                source: SOURCE,
                status: status.as_u16(),
                detail,
            });
        }

        let record: BookingRecord =
            serde_json::from_str(&body).map_err(|e| SourceError::invalid(SOURCE, e))?;
        tracing::info!(reservation_id = %record.id, "Created reservation");
        Ok(record.into_domain())
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: ReservationStatus,
    ) -> Result<(), SourceError> {
        let url = format!("{}/bookings/{}", self.config.api_base_url, booking_id);
        let response = self
            .authed(self.client.put(&url).json(&UpdateStatusRequest {
                status: status.as_str(),
            }))
            .send()
            .await
            .map_err(|e| SourceError::network(SOURCE, e))?;

        let http_status = response.status();
        if http_status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Auth { source: SOURCE });
        }
        if !http_status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                String::new()
            } else {
                format!(" - {}", body)
            };
            return Err(SourceError::Api {
                source: SOURCE,
                status: http_status.as_u16(),
                detail,
            });
        }

        tracing::debug!(reservation_id = %booking_id, status = status.as_str(), "Updated reservation status");
        Ok(())
    }
}
