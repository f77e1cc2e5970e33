//! The reconciliation engine: pure functions from the two fetched datasets
//! to the derived match, orphan, classification and statistics collections.

pub mod classify;
pub mod fields;
pub mod matching;
pub mod orphans;
pub mod snapshot;
pub mod stats;

pub use classify::{night_role, package_booking_ids, NightRole};
pub use fields::FieldRoles;
pub use matching::{match_bookings, parse_group_exclude, MatchOutcome};
pub use orphans::{detect_orphans, OrphanReservation};
pub use snapshot::ReconciliationSnapshot;
pub use stats::ReportStats;
