//! Per-booking derived attributes: package membership and night role.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::HotelBooking;

/// Where the context date falls within a stay. Both flags are true for a
/// single-night stay, both false for a middle night (or when either date is
/// unknown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NightRole {
    pub is_first_night: bool,
    pub is_last_night: bool,
}

/// Classify the context date against a stay's arrival and departure dates.
/// The last night is the calendar day before departure; the checkout
/// morning itself is neither.
pub fn night_role(
    arrival: Option<NaiveDate>,
    departure: Option<NaiveDate>,
    context: NaiveDate,
) -> NightRole {
    let (Some(arrival), Some(departure)) = (arrival, departure) else {
        return NightRole::default();
    };
    NightRole {
        is_first_night: arrival == context,
        is_last_night: departure.checked_sub_days(Days::new(1)) == Some(context),
    }
}

/// Hotel bookings whose inventory shows the configured package on the
/// context date. An empty package name disables the feature entirely.
pub fn package_booking_ids(
    hotel: &[HotelBooking],
    package_name: &str,
    context: NaiveDate,
) -> HashSet<String> {
    let needle = package_name.trim().to_lowercase();
    if needle.is_empty() {
        return HashSet::new();
    }

    let mut ids = HashSet::new();
    for booking in hotel {
        let on_package = booking.inventory_items.iter().any(|item| {
            item.stay_date == context && item.description.to_lowercase().contains(&needle)
        });
        if on_package {
            ids.insert(booking.booking_id.clone());
        }
    }
    ids
}
