//! The matching engine: which hotel bookings already have a restaurant
//! reservation, and which reservation each one maps to.

use std::collections::{HashMap, HashSet};

use crate::engine::FieldRoles;
use crate::models::{HotelBooking, RestaurantBooking};

/// Result of one matching pass.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub matched_ids: HashSet<String>,
    /// Hotel booking id -> reservation id. When several active reservations
    /// reference the same hotel booking, the one processed last in
    /// reservation iteration order wins (last-write-wins tie-break).
    pub matched_to: HashMap<String, String>,
}

impl MatchOutcome {
    fn record(&mut self, hotel_booking_id: &str, reservation_id: &str) {
        self.matched_ids.insert(hotel_booking_id.to_string());
        self.matched_to
            .insert(hotel_booking_id.to_string(), reservation_id.to_string());
    }
}

/// Compute the matched set over all active reservations, via the direct
/// booking-reference field and the GROUP/EXCLUDE field.
pub fn match_bookings(
    hotel: &[HotelBooking],
    restaurant: &[RestaurantBooking],
    roles: &FieldRoles,
) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    // Group id -> member booking ids, for group references.
    let mut group_index: HashMap<&str, Vec<&str>> = HashMap::new();
    for booking in hotel {
        if let Some(group_id) = booking.group_id.as_deref() {
            group_index
                .entry(group_id)
                .or_default()
                .push(booking.booking_id.as_str());
        }
    }

    for reservation in restaurant {
        if !reservation.status.is_active() {
            continue;
        }

        if let Some(ref_field) = roles.booking_ref_field_id.as_deref() {
            for field in &reservation.custom_fields {
                if !field.matches_field(ref_field) {
                    continue;
                }
                if let Some(hotel_booking_id) = field.value_str() {
                    outcome.record(&hotel_booking_id, &reservation.id);
                }
            }
        }

        if let Some(group_field) = roles.group_exclude_field_id.as_deref() {
            for field in &reservation.custom_fields {
                if !field.matches_field(group_field) {
                    continue;
                }
                let Some(value) = field.value_str() else {
                    continue;
                };
                let refs = parse_group_exclude(&value);
                for id in &refs.individuals {
                    outcome.record(id, &reservation.id);
                }
                for group_id in &refs.groups {
                    if let Some(members) = group_index.get(group_id.as_str()) {
                        for member in members {
                            outcome.record(member, &reservation.id);
                        }
                    }
                }
            }
        }
    }

    outcome
}

/// Parsed GROUP/EXCLUDE field content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupExcludeRefs {
    pub individuals: Vec<String>,
    pub groups: Vec<String>,
    /// Exclusion markers are recognized by the grammar but have no effect on
    /// matching. Intentional, not an oversight.
    pub excludes: Vec<String>,
}

/// Parse the GROUP/EXCLUDE mini-grammar: a comma-separated list where each
/// trimmed entry is `NOT-#<id>` (exclusion), `G#<id>` (group reference) or
/// `#<id>` (individual reference), checked in that order. Anything else is
/// silently ignored.
pub fn parse_group_exclude(value: &str) -> GroupExcludeRefs {
    let mut refs = GroupExcludeRefs::default();

    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some(id) = strip_prefix_ci(entry, "NOT-#") {
            let id = id.trim();
            if !id.is_empty() {
                refs.excludes.push(id.to_string());
            }
        } else if let Some(id) = strip_prefix_ci(entry, "G#") {
            let id = id.trim();
            if !id.is_empty() {
                refs.groups.push(id.to_string());
            }
        } else if let Some(id) = entry.strip_prefix('#') {
            let id = id.trim();
            if !id.is_empty() {
                refs.individuals.push(id.to_string());
            }
        }
    }

    refs
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomFieldValue, ReservationStatus};

    fn hotel_booking(id: &str, group_id: Option<&str>) -> HotelBooking {
        HotelBooking {
            booking_id: id.to_string(),
            group_id: group_id.map(String::from),
            guest_name: "Test Guest".into(),
            surname: "guest".into(),
            room: "1".into(),
            total_occupants: 2,
            arrival_date: None,
            departure_date: None,
            contacts: vec![],
            inventory_items: vec![],
            status: "confirmed".into(),
        }
    }

    fn reservation(
        id: &str,
        status: ReservationStatus,
        custom_fields: Vec<CustomFieldValue>,
    ) -> RestaurantBooking {
        RestaurantBooking {
            id: id.to_string(),
            status,
            date_time: None,
            people: 2,
            duration_minutes: None,
            guest: None,
            name: None,
            custom_fields,
        }
    }

    fn roles() -> FieldRoles {
        FieldRoles {
            booking_ref_field_id: Some("f-ref".into()),
            group_exclude_field_id: Some("f-group".into()),
            ..FieldRoles::default()
        }
    }

    #[test]
    fn parses_group_exclude_grammar() {
        let refs = parse_group_exclude("#101, G#55, NOT-#9, garbage, ");
        assert_eq!(refs.individuals, vec!["101"]);
        assert_eq!(refs.groups, vec!["55"]);
        assert_eq!(refs.excludes, vec!["9"]);
    }

    #[test]
    fn direct_reference_matches_active_reservation() {
        let hotel = vec![hotel_booking("101", None)];
        let restaurant = vec![reservation(
            "r1",
            ReservationStatus::Approved,
            vec![CustomFieldValue::text("f-ref", "Booking #", "101")],
        )];
        let outcome = match_bookings(&hotel, &restaurant, &roles());
        assert!(outcome.matched_ids.contains("101"));
        assert_eq!(outcome.matched_to.get("101").map(String::as_str), Some("r1"));
    }

    #[test]
    fn inactive_statuses_never_match() {
        let hotel = vec![hotel_booking("101", None)];
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Declined,
            ReservationStatus::Cancelled,
            ReservationStatus::NoShow,
        ] {
            let restaurant = vec![reservation(
                "r1",
                status,
                vec![CustomFieldValue::text("f-ref", "Booking #", "101")],
            )];
            let outcome = match_bookings(&hotel, &restaurant, &roles());
            assert!(
                outcome.matched_ids.is_empty(),
                "status {:?} must not match",
                status
            );
        }
    }

    #[test]
    fn group_reference_matches_every_member() {
        let hotel = vec![hotel_booking("1", Some("G1")), hotel_booking("2", Some("G1"))];
        let restaurant = vec![reservation(
            "r1",
            ReservationStatus::Seated,
            vec![CustomFieldValue::text("f-group", "GROUP/EXCLUDE", "G#G1")],
        )];
        let outcome = match_bookings(&hotel, &restaurant, &roles());
        assert!(outcome.matched_ids.contains("1"));
        assert!(outcome.matched_ids.contains("2"));
        assert_eq!(outcome.matched_to.get("1").map(String::as_str), Some("r1"));
        assert_eq!(outcome.matched_to.get("2").map(String::as_str), Some("r1"));
    }

    #[test]
    fn exclusions_and_garbage_have_no_effect() {
        let hotel = vec![hotel_booking("9", None)];
        let restaurant = vec![reservation(
            "r1",
            ReservationStatus::Approved,
            vec![CustomFieldValue::text(
                "f-group",
                "GROUP/EXCLUDE",
                "NOT-#9, garbage",
            )],
        )];
        let outcome = match_bookings(&hotel, &restaurant, &roles());
        assert!(outcome.matched_ids.is_empty());
        assert!(outcome.matched_to.is_empty());
    }

    #[test]
    fn later_reservation_wins_duplicate_mapping() {
        let hotel = vec![hotel_booking("101", None)];
        let restaurant = vec![
            reservation(
                "r1",
                ReservationStatus::Approved,
                vec![CustomFieldValue::text("f-ref", "Booking #", "101")],
            ),
            reservation(
                "r2",
                ReservationStatus::Approved,
                vec![CustomFieldValue::text("f-ref", "Booking #", "101")],
            ),
        ];
        let outcome = match_bookings(&hotel, &restaurant, &roles());
        assert_eq!(outcome.matched_to.get("101").map(String::as_str), Some("r2"));
    }

    #[test]
    fn matching_is_idempotent() {
        let hotel = vec![hotel_booking("1", Some("G1")), hotel_booking("2", Some("G1"))];
        let restaurant = vec![
            reservation(
                "r1",
                ReservationStatus::Approved,
                vec![CustomFieldValue::text("f-ref", "Booking #", "1")],
            ),
            reservation(
                "r2",
                ReservationStatus::Arrived,
                vec![CustomFieldValue::text("f-group", "GROUP/EXCLUDE", "G#G1")],
            ),
        ];
        let first = match_bookings(&hotel, &restaurant, &roles());
        let second = match_bookings(&hotel, &restaurant, &roles());
        assert_eq!(first.matched_ids, second.matched_ids);
        assert_eq!(first.matched_to, second.matched_to);
    }

    #[test]
    fn missing_roles_disable_matching() {
        let hotel = vec![hotel_booking("101", None)];
        let restaurant = vec![reservation(
            "r1",
            ReservationStatus::Approved,
            vec![CustomFieldValue::text("f-ref", "Booking #", "101")],
        )];
        let outcome = match_bookings(&hotel, &restaurant, &FieldRoles::default());
        assert!(outcome.matched_ids.is_empty());
    }
}
