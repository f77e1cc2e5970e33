//! External booking-source abstractions and implementations.
//!
//! The engine and reconciler depend only on the traits here; the HTTP
//! clients and the in-memory mocks are interchangeable backends.

pub mod hotel;
pub mod mock;
pub mod restaurant;

pub use hotel::HotelRosterClient;
pub use restaurant::ReservationPlatformClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    CustomFieldDefinition, CustomFieldValue, DiningTable, HotelBooking, OpeningHours,
    ReservationStatus, RestaurantBooking, ServicePeriodTimes,
};

/// Error type for source operations.
///
/// `Display`/`Error` are implemented by hand rather than via `thiserror`
/// because the `source` field (the human-readable name of the upstream
/// system) collides with `thiserror`'s automatic detection of a field named
/// `source` as the `Error::source()` value.
#[derive(Debug)]
pub enum SourceError {
    /// HTTP 401 from the source. Blocking; never retried.
    Auth { source: &'static str },

    /// The source could not be reached at all.
    Network {
        source: &'static str,
        message: String,
    },

    /// Any other non-2xx response, carrying the numeric status. `detail` is
    /// either empty or pre-formatted as " - <body>".
    Api {
        source: &'static str,
        status: u16,
        detail: String,
    },

    /// 2xx response whose body could not be decoded.
    InvalidResponse {
        source: &'static str,
        message: String,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Auth { source } => {
                write!(f, "{source} authentication failed. Check credentials.")
            }
            SourceError::Network { source, message } => {
                write!(f, "{source} request failed: {message}")
            }
            SourceError::Api {
                source,
                status,
                detail,
            } => write!(f, "{source} API error: {status}{detail}"),
            SourceError::InvalidResponse { source, message } => {
                write!(f, "{source} returned an invalid response: {message}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    pub fn network(source: &'static str, err: reqwest::Error) -> Self {
        Self::Network {
            source,
            message: err.to_string(),
        }
    }

    pub fn invalid(source: &'static str, err: serde_json::Error) -> Self {
        Self::InvalidResponse {
            source,
            message: err.to_string(),
        }
    }
}

/// The property-management system's guest roster.
#[async_trait]
pub trait HotelRosterSource: Send + Sync {
    /// All stay records overlapping the given date.
    async fn fetch_staying_on(&self, date: NaiveDate) -> Result<Vec<HotelBooking>, SourceError>;
}

/// The restaurant reservation platform.
#[async_trait]
pub trait ReservationSource: Send + Sync {
    /// All reservations overlapping the given date.
    async fn fetch_bookings_for(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RestaurantBooking>, SourceError>;

    /// The current custom-field schema.
    async fn fetch_custom_fields(&self) -> Result<Vec<CustomFieldDefinition>, SourceError>;

    /// Available times per service period for the given date and party size.
    async fn fetch_available_times(
        &self,
        date: NaiveDate,
        people: u32,
    ) -> Result<Vec<ServicePeriodTimes>, SourceError>;

    /// All tables (including booked ones) for a time window and party size.
    async fn fetch_available_tables(
        &self,
        people: u32,
        from_date_time: &str,
        to_date_time: &str,
    ) -> Result<Vec<DiningTable>, SourceError>;

    /// The venue's service periods and seating policies.
    async fn fetch_opening_hours(&self) -> Result<Vec<OpeningHours>, SourceError>;

    /// Create a reservation, returning the created record.
    async fn create_booking(
        &self,
        payload: &CreateReservationPayload,
    ) -> Result<RestaurantBooking, SourceError>;

    /// Transition a reservation to a new status.
    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: ReservationStatus,
    ) -> Result<(), SourceError>;
}

/// Guest section of a reservation-creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationGuestPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "notificationEmail", skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<bool>,
}

/// Wire payload for creating a reservation on the platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationPayload {
    pub date: NaiveDate,
    pub time: String,
    pub people: u32,
    pub guest: ReservationGuestPayload,
    pub status: String,
    pub language_code: String,
    pub source: String,
    pub note: String,
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hour_id: Option<String>,
}
