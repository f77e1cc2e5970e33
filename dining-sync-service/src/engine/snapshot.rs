//! The immutable reconciliation snapshot: one cycle's complete result.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::engine::{
    detect_orphans, match_bookings, night_role, package_booking_ids, FieldRoles, NightRole,
    OrphanReservation, ReportStats,
};
use crate::models::{HotelBooking, RestaurantBooking};

/// Root aggregate produced by one reconciliation cycle.
///
/// Built in full before it becomes visible; consumers only ever see a
/// complete snapshot, never a partially-updated one. A new cycle replaces
/// the whole value.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationSnapshot {
    pub context_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub hotel_bookings: Vec<HotelBooking>,
    pub restaurant_bookings: Vec<RestaurantBooking>,
    pub field_roles: FieldRoles,
    pub matched_ids: HashSet<String>,
    /// Hotel booking id -> reservation id (last-write-wins on duplicates).
    pub matched_to: HashMap<String, String>,
    pub orphans: Vec<OrphanReservation>,
    pub package_ids: HashSet<String>,
    /// Hotel booking id -> first/last night classification on the context
    /// date, for arrival/departure badges.
    pub night_roles: HashMap<String, NightRole>,
    pub stats: ReportStats,
    /// Dataset fingerprint used by the silent-refresh idempotence guard.
    #[serde(skip)]
    pub data_hash: String,
}

impl ReconciliationSnapshot {
    pub fn build(
        context_date: NaiveDate,
        hotel_bookings: Vec<HotelBooking>,
        restaurant_bookings: Vec<RestaurantBooking>,
        field_roles: FieldRoles,
        package_name: &str,
    ) -> Self {
        let outcome = match_bookings(&hotel_bookings, &restaurant_bookings, &field_roles);
        let orphans = detect_orphans(&hotel_bookings, &restaurant_bookings, &field_roles);
        let package_ids = package_booking_ids(&hotel_bookings, package_name, context_date);
        let night_roles: HashMap<String, NightRole> = hotel_bookings
            .iter()
            .map(|b| {
                (
                    b.booking_id.clone(),
                    night_role(b.arrival_date, b.departure_date, context_date),
                )
            })
            .collect();
        let stats = ReportStats::compute(
            &hotel_bookings,
            &restaurant_bookings,
            &field_roles,
            &outcome.matched_ids,
            context_date,
        );
        let data_hash = dataset_fingerprint(&hotel_bookings, &restaurant_bookings);

        Self {
            context_date,
            generated_at: Utc::now(),
            hotel_bookings,
            restaurant_bookings,
            field_roles,
            matched_ids: outcome.matched_ids,
            matched_to: outcome.matched_to,
            orphans,
            package_ids,
            night_roles,
            stats,
            data_hash,
        }
    }

    pub fn is_matched(&self, hotel_booking_id: &str) -> bool {
        self.matched_ids.contains(hotel_booking_id)
    }
}

/// Order-insensitive fingerprint over the identity and status of both
/// datasets. Two fetches with the same fingerprint need no rebuild.
pub fn dataset_fingerprint(hotel: &[HotelBooking], restaurant: &[RestaurantBooking]) -> String {
    let mut hotel_keys: Vec<String> = hotel
        .iter()
        .map(|b| format!("{}:{}", b.booking_id, b.status))
        .collect();
    hotel_keys.sort();

    let mut reservation_keys: Vec<String> = restaurant
        .iter()
        .map(|b| format!("{}:{}:{}", b.id, b.status.as_str(), b.people))
        .collect();
    reservation_keys.sort();

    let mut hasher = Sha256::new();
    hasher.update(hotel_keys.join(","));
    hasher.update("|");
    hasher.update(reservation_keys.join(","));
    hex::encode(hasher.finalize())
}
