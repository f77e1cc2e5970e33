//! Statistics rollups over the two datasets. A pure fold; no mutation.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::engine::FieldRoles;
use crate::models::{HotelBooking, RestaurantBooking};

/// Display rollups for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub hotel_total: usize,
    pub hotel_matched: usize,
    pub arrivals_total: usize,
    pub arrivals_matched: usize,
    pub departures_total: usize,
    pub departures_matched: usize,
    pub reservation_bookings: usize,
    pub reservation_covers: u32,
    pub meal_plan_bookings: usize,
    pub meal_plan_covers: u32,
    pub hotel_guest_bookings: usize,
    pub hotel_guest_covers: u32,
    pub non_resident_bookings: usize,
    pub non_resident_covers: u32,
}

impl ReportStats {
    pub fn compute(
        hotel: &[HotelBooking],
        restaurant: &[RestaurantBooking],
        roles: &FieldRoles,
        matched_ids: &HashSet<String>,
        context: NaiveDate,
    ) -> Self {
        let mut stats = Self {
            hotel_total: hotel.len(),
            ..Self::default()
        };

        for booking in hotel {
            let matched = matched_ids.contains(&booking.booking_id);
            if matched {
                stats.hotel_matched += 1;
            }
            // Arrival and departure counts are independent: a booking with a
            // known arrival but no departure still counts as an arrival.
            if booking.arrival_date == Some(context) {
                stats.arrivals_total += 1;
                if matched {
                    stats.arrivals_matched += 1;
                }
            }
            let last_night = booking
                .departure_date
                .and_then(|d| d.checked_sub_days(Days::new(1)));
            if last_night == Some(context) {
                stats.departures_total += 1;
                if matched {
                    stats.departures_matched += 1;
                }
            }
        }

        for reservation in restaurant {
            if !reservation.status.is_active() {
                continue;
            }
            stats.reservation_bookings += 1;
            stats.reservation_covers += reservation.people;

            let is_hotel_guest = flag_is_yes(
                reservation,
                roles.hotel_guest_field_id.as_deref(),
                roles.hotel_guest_yes_choice_id.as_deref(),
            );
            let is_meal_plan = flag_is_yes(
                reservation,
                roles.meal_plan_field_id.as_deref(),
                roles.meal_plan_yes_choice_id.as_deref(),
            );

            if is_meal_plan {
                stats.meal_plan_bookings += 1;
                stats.meal_plan_covers += reservation.people;
            }
            if is_hotel_guest {
                stats.hotel_guest_bookings += 1;
                stats.hotel_guest_covers += reservation.people;
            } else {
                stats.non_resident_bookings += 1;
                stats.non_resident_covers += reservation.people;
            }
        }

        stats
    }
}

fn flag_is_yes(
    reservation: &RestaurantBooking,
    field_id: Option<&str>,
    yes_choice_id: Option<&str>,
) -> bool {
    let (Some(field_id), Some(yes_choice_id)) = (field_id, yes_choice_id) else {
        return false;
    };
    reservation.custom_fields.iter().any(|f| {
        f.matches_field(field_id) && f.value_str().as_deref() == Some(yes_choice_id)
    })
}
