//! In-memory source implementations for testing.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{CreateReservationPayload, HotelRosterSource, ReservationSource, SourceError};
use crate::models::{
    CustomFieldDefinition, DiningTable, HotelBooking, OpeningHours, ReservationGuest,
    ReservationStatus, RestaurantBooking, ServicePeriodTimes,
};

/// Mock hotel roster for testing.
#[derive(Default)]
pub struct MockRosterSource {
    bookings: Mutex<Vec<HotelBooking>>,
    fail_auth: Mutex<bool>,
}

impl MockRosterSource {
    pub fn new(bookings: Vec<HotelBooking>) -> Self {
        Self {
            bookings: Mutex::new(bookings),
            fail_auth: Mutex::new(false),
        }
    }

    pub fn set_bookings(&self, bookings: Vec<HotelBooking>) {
        *self.bookings.lock().unwrap() = bookings;
    }

    /// Make every subsequent fetch fail with an authentication error.
    pub fn fail_with_auth(&self, fail: bool) {
        *self.fail_auth.lock().unwrap() = fail;
    }
}

#[async_trait]
impl HotelRosterSource for MockRosterSource {
    async fn fetch_staying_on(&self, _date: NaiveDate) -> Result<Vec<HotelBooking>, SourceError> {
        if *self.fail_auth.lock().unwrap() {
            return Err(SourceError::Auth {
                source: "hotel roster",
            });
        }
        Ok(self.bookings.lock().unwrap().clone())
    }
}

/// Mock reservation platform for testing. Records create/update calls and
/// can be told to fail updates for specific reservation ids.
#[derive(Default)]
pub struct MockReservationSource {
    bookings: Mutex<Vec<RestaurantBooking>>,
    custom_fields: Mutex<Vec<CustomFieldDefinition>>,
    opening_hours: Mutex<Vec<OpeningHours>>,
    periods: Mutex<Vec<ServicePeriodTimes>>,
    tables: Mutex<Vec<DiningTable>>,
    failing_updates: Mutex<HashSet<String>>,
    created: Mutex<Vec<CreateReservationPayload>>,
    update_calls: Mutex<Vec<(String, ReservationStatus)>>,
}

impl MockReservationSource {
    pub fn new(
        bookings: Vec<RestaurantBooking>,
        custom_fields: Vec<CustomFieldDefinition>,
    ) -> Self {
        Self {
            bookings: Mutex::new(bookings),
            custom_fields: Mutex::new(custom_fields),
            ..Self::default()
        }
    }

    pub fn set_bookings(&self, bookings: Vec<RestaurantBooking>) {
        *self.bookings.lock().unwrap() = bookings;
    }

    pub fn set_opening_hours(&self, hours: Vec<OpeningHours>) {
        *self.opening_hours.lock().unwrap() = hours;
    }

    pub fn set_periods(&self, periods: Vec<ServicePeriodTimes>) {
        *self.periods.lock().unwrap() = periods;
    }

    pub fn set_tables(&self, tables: Vec<DiningTable>) {
        *self.tables.lock().unwrap() = tables;
    }

    /// Make status updates for the given reservation id fail.
    pub fn fail_update_for(&self, booking_id: &str) {
        self.failing_updates
            .lock()
            .unwrap()
            .insert(booking_id.to_string());
    }

    /// Payloads passed to `create_booking`, in call order.
    pub fn created_payloads(&self) -> Vec<CreateReservationPayload> {
        self.created.lock().unwrap().clone()
    }

    /// Status updates attempted so far, in call order.
    pub fn update_calls(&self) -> Vec<(String, ReservationStatus)> {
        self.update_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReservationSource for MockReservationSource {
    async fn fetch_bookings_for(
        &self,
        _date: NaiveDate,
    ) -> Result<Vec<RestaurantBooking>, SourceError> {
        Ok(self.bookings.lock().unwrap().clone())
    }

    async fn fetch_custom_fields(&self) -> Result<Vec<CustomFieldDefinition>, SourceError> {
        Ok(self.custom_fields.lock().unwrap().clone())
    }

    async fn fetch_available_times(
        &self,
        _date: NaiveDate,
        _people: u32,
    ) -> Result<Vec<ServicePeriodTimes>, SourceError> {
        Ok(self.periods.lock().unwrap().clone())
    }

    async fn fetch_available_tables(
        &self,
        _people: u32,
        _from_date_time: &str,
        _to_date_time: &str,
    ) -> Result<Vec<DiningTable>, SourceError> {
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn fetch_opening_hours(&self) -> Result<Vec<OpeningHours>, SourceError> {
        Ok(self.opening_hours.lock().unwrap().clone())
    }

    async fn create_booking(
        &self,
        payload: &CreateReservationPayload,
    ) -> Result<RestaurantBooking, SourceError> {
        let mut created = self.created.lock().unwrap();
        created.push(payload.clone());
        let id = format!("created-{}", created.len());

        let booking = RestaurantBooking {
            id,
            status: ReservationStatus::from_str(&payload.status),
            date_time: None,
            people: payload.people,
            duration_minutes: None,
            guest: Some(ReservationGuest {
                name: Some(payload.guest.name.clone()),
                phone: payload.guest.phone.clone(),
                email: payload.guest.email.clone(),
            }),
            name: None,
            custom_fields: payload.custom_fields.clone(),
        };
        self.bookings.lock().unwrap().push(booking.clone());
        Ok(booking)
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: ReservationStatus,
    ) -> Result<(), SourceError> {
        self.update_calls
            .lock()
            .unwrap()
            .push((booking_id.to_string(), status));

        if self.failing_updates.lock().unwrap().contains(booking_id) {
            return Err(SourceError::Api {
                source: "reservation platform",
                status: 500,
                detail: String::new(),
            });
        }

        let mut bookings = self.bookings.lock().unwrap();
        match bookings.iter_mut().find(|b| b.id == booking_id) {
            Some(booking) => {
                booking.status = status;
                Ok(())
            }
            None => Err(SourceError::Api {
                source: "reservation platform",
                status: 404,
                detail: String::new(),
            }),
        }
    }
}
