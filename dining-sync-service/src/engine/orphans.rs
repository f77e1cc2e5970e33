//! Detection of reservations whose hotel-booking reference points at a
//! booking absent from the current fetch window.

use std::collections::HashSet;

use serde::Serialize;

use crate::engine::FieldRoles;
use crate::models::{HotelBooking, RestaurantBooking};

/// An active reservation referencing a hotel booking that no longer exists
/// in the roster fetched for the target date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReservation {
    pub reservation_id: String,
    pub hotel_booking_ref: String,
}

/// Scan active reservations for dangling hotel-booking references. Requires
/// the booking-reference role; without it the result is empty. Ordering is
/// stable: reservation iteration order, not separately sorted.
pub fn detect_orphans(
    hotel: &[HotelBooking],
    restaurant: &[RestaurantBooking],
    roles: &FieldRoles,
) -> Vec<OrphanReservation> {
    let Some(ref_field) = roles.booking_ref_field_id.as_deref() else {
        return Vec::new();
    };

    let hotel_ids: HashSet<&str> = hotel.iter().map(|b| b.booking_id.as_str()).collect();
    let mut orphans = Vec::new();

    for reservation in restaurant {
        if !reservation.status.is_active() {
            continue;
        }
        for field in &reservation.custom_fields {
            if !field.matches_field(ref_field) {
                continue;
            }
            if let Some(value) = field.value_str() {
                let reference = value.trim();
                if !reference.is_empty() && !hotel_ids.contains(reference) {
                    orphans.push(OrphanReservation {
                        reservation_id: reservation.id.clone(),
                        hotel_booking_ref: reference.to_string(),
                    });
                }
                // First reference value only; further matches are ignored.
                break;
            }
        }
    }

    orphans
}
