//! Hotel roster source client.
//!
//! Wraps the property-management system's stay-list endpoint. The wire
//! format is loose: identifiers and occupant counts may arrive as numbers
//! or strings, and timestamps carry a time-of-day component that is
//! discarded here. Everything is normalized into the domain types at this
//! boundary.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::{HotelRosterSource, SourceError};
use crate::config::HotelSourceConfig;
use crate::models::{title_case, ContactMethod, HotelBooking, InventoryLineItem};

const SOURCE: &str = "hotel roster";

/// Client for the property-management system's REST API.
#[derive(Clone)]
pub struct HotelRosterClient {
    client: Client,
    config: HotelSourceConfig,
}

#[derive(Debug, Serialize)]
struct StayListRequest<'a> {
    period_from: String,
    period_to: String,
    list_type: &'a str,
    region: &'a str,
    api_key: &'a str,
}

/// Response envelope: `success == false` signals an API error even on
/// HTTP 200.
#[derive(Debug, Deserialize)]
struct StayListResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<StayRecord>,
}

#[derive(Debug, Deserialize)]
struct StayRecord {
    booking_id: serde_json::Value,
    #[serde(default)]
    bookings_group_id: Option<serde_json::Value>,
    #[serde(default)]
    booking_status: Option<String>,
    #[serde(default)]
    booking_arrival: Option<String>,
    #[serde(default)]
    booking_departure: Option<String>,
    #[serde(default)]
    site_name: Option<String>,
    #[serde(default)]
    booking_adults: Option<serde_json::Value>,
    #[serde(default)]
    booking_children: Option<serde_json::Value>,
    #[serde(default)]
    booking_infants: Option<serde_json::Value>,
    #[serde(default)]
    guests: Vec<StayGuest>,
    #[serde(default)]
    inventory_items: Vec<StayInventoryItem>,
}

#[derive(Debug, Deserialize)]
struct StayGuest {
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
    #[serde(default)]
    contact_details: Vec<StayContact>,
}

#[derive(Debug, Deserialize)]
struct StayContact {
    #[serde(rename = "type", default)]
    contact_type: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StayInventoryItem {
    #[serde(default)]
    stay_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl StayRecord {
    fn into_domain(self) -> HotelBooking {
        let (guest_name, surname) = match self.guests.first() {
            Some(guest) => {
                let first = title_case(guest.firstname.as_deref().unwrap_or(""));
                let last = title_case(guest.lastname.as_deref().unwrap_or(""));
                let full = format!("{} {}", first, last).trim().to_string();
                let name = if full.is_empty() {
                    "Unknown Guest".to_string()
                } else {
                    full
                };
                let surname = guest
                    .lastname
                    .as_deref()
                    .unwrap_or("")
                    .to_lowercase();
                (name, surname)
            }
            None => ("Unknown Guest".to_string(), String::new()),
        };

        let contacts = self
            .guests
            .first()
            .map(|g| {
                g.contact_details
                    .iter()
                    .filter_map(|c| {
                        Some(ContactMethod {
                            contact_type: c.contact_type.clone()?,
                            value: c.content.clone().unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let inventory_items = self
            .inventory_items
            .into_iter()
            .filter_map(|item| {
                Some(InventoryLineItem {
                    stay_date: parse_date_part(item.stay_date.as_deref()?)?,
                    description: item.description.unwrap_or_default(),
                })
            })
            .collect();

        HotelBooking {
            booking_id: value_to_string(&self.booking_id).unwrap_or_default(),
            group_id: self.bookings_group_id.as_ref().and_then(value_to_string),
            guest_name,
            surname,
            room: self.site_name.unwrap_or_default(),
            total_occupants: value_to_u32(self.booking_adults.as_ref())
                + value_to_u32(self.booking_children.as_ref())
                + value_to_u32(self.booking_infants.as_ref()),
            arrival_date: self.booking_arrival.as_deref().and_then(parse_date_part),
            departure_date: self.booking_departure.as_deref().and_then(parse_date_part),
            contacts,
            inventory_items,
            status: self.booking_status.unwrap_or_default(),
        }
    }
}

/// Identifier normalization: strings pass through, numbers are stringified.
fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_u32(value: Option<&serde_json::Value>) -> u32 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0) as u32,
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Date part of a "YYYY-MM-DD HH:MM:SS" timestamp.
fn parse_date_part(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

impl HotelRosterClient {
    pub fn new(config: HotelSourceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl HotelRosterSource for HotelRosterClient {
    async fn fetch_staying_on(&self, date: NaiveDate) -> Result<Vec<HotelBooking>, SourceError> {
        let url = format!("{}/bookings_list", self.config.api_base_url);
        let request = StayListRequest {
            period_from: format!("{} 00:00:00", date),
            period_to: format!("{} 23:59:59", date),
            list_type: "staying",
            region: &self.config.region,
            api_key: self.config.api_key.expose_secret(),
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.username,
                Some(self.config.password.expose_secret()),
            )
            .json(&request)
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
        let parsed: StayListResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::invalid(SOURCE, e))?;

        if parsed.success == Some(false) {
            return Err(SourceError::Api {
                source: SOURCE,
                status: status.as_u16(),
                detail: format!(
                    " - {}",
                    parsed
                        .message
                        .unwrap_or_else(|| "the roster API returned an error".to_string())
                ),
            });
        }

        tracing::debug!(records = parsed.data.len(), %date, "Fetched hotel stay records");

        Ok(parsed
            .data
            .into_iter()
            .map(StayRecord::into_domain)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stay_record_normalizes_loose_wire_types() {
        let record: StayRecord = serde_json::from_value(serde_json::json!({
            "booking_id": 4711,
            "bookings_group_id": "G9",
            "booking_status": "confirmed",
            "booking_arrival": "2024-03-01 14:00:00",
            "booking_departure": "2024-03-04 10:00:00",
            "site_name": "12",
            "booking_adults": "2",
            "booking_children": 1,
            "guests": [{
                "firstname": "jane",
                "lastname": "mcdonald",
                "contact_details": [
                    {"type": "phone", "content": "07911 123456"},
                    {"type": "email", "content": "jane@example.com"}
                ]
            }],
            "inventory_items": [
                {"stay_date": "2024-03-02", "description": "Dinner Bed & Breakfast"}
            ]
        }))
        .unwrap();

        let booking = record.into_domain();
        assert_eq!(booking.booking_id, "4711");
        assert_eq!(booking.group_id.as_deref(), Some("G9"));
        assert_eq!(booking.guest_name, "Jane McDonald");
        assert_eq!(booking.surname, "mcdonald");
        assert_eq!(booking.total_occupants, 3);
        assert_eq!(
            booking.arrival_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            booking.departure_date,
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
        assert_eq!(booking.phone(), Some("07911 123456"));
        assert_eq!(booking.email(), Some("jane@example.com"));
        assert_eq!(booking.inventory_items.len(), 1);
    }

    #[test]
    fn stay_record_without_guests_uses_placeholder_name() {
        let record: StayRecord =
            serde_json::from_value(serde_json::json!({ "booking_id": "1" })).unwrap();
        let booking = record.into_domain();
        assert_eq!(booking.guest_name, "Unknown Guest");
        assert_eq!(booking.total_occupants, 0);
        assert_eq!(booking.arrival_date, None);
    }
}
