use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub hotel_booking_id: String,
    /// "HH:MM" start time within the snapshot's context date.
    pub time: String,
    pub people: u32,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub opening_hour_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateReservationResponse {
    pub reservation_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailableTimesQuery {
    pub date: NaiveDate,
    pub people: u32,
}

#[derive(Debug, Deserialize)]
pub struct AvailableTablesQuery {
    pub people: u32,
    pub from_date_time: String,
    pub to_date_time: String,
}
