//! Reconciliation orchestration.
//!
//! Owns the current snapshot and serializes every snapshot-producing
//! operation behind one guard, so a manual reconcile and the background
//! refresh can never interleave and a stale fetch can never overwrite a
//! newer snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::config::ReconciliationConfig;
use crate::engine::snapshot::dataset_fingerprint;
use crate::engine::{FieldRoles, ReconciliationSnapshot};
use crate::models::{normalize_phone, CustomFieldValue, ReservationStatus, RestaurantBooking};
use crate::services::metrics;
use crate::services::sources::{
    CreateReservationPayload, HotelRosterSource, ReservationGuestPayload, ReservationSource,
    SourceError,
};

/// Error type for reconciler operations beyond plain source failures.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("no reconciliation snapshot available; run a reconcile first")]
    NoSnapshot,

    #[error("hotel booking {0} not found in the current snapshot")]
    HotelBookingNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Outcome of a background refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No snapshot yet, nothing to refresh.
    Skipped,
    /// Dataset fingerprint unchanged; snapshot left as-is.
    Unchanged,
    /// A new snapshot was installed.
    Updated,
    /// A source failed; the previous snapshot remains visible.
    Failed,
}

/// Result of a batch mark-as-left operation.
#[derive(Debug, Clone, Serialize)]
pub struct MarkLeftOutcome {
    pub targeted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// A reservation to create for a hotel booking in the current snapshot.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub hotel_booking_id: String,
    pub time: String,
    pub people: u32,
    pub table_id: Option<String>,
    pub opening_hour_id: Option<String>,
}

pub struct Reconciler {
    hotel: Arc<dyn HotelRosterSource>,
    restaurant: Arc<dyn ReservationSource>,
    settings: ReconciliationConfig,
    current: RwLock<Option<Arc<ReconciliationSnapshot>>>,
    cycle_guard: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        hotel: Arc<dyn HotelRosterSource>,
        restaurant: Arc<dyn ReservationSource>,
        settings: ReconciliationConfig,
    ) -> Self {
        Self {
            hotel,
            restaurant,
            settings,
            current: RwLock::new(None),
            cycle_guard: Mutex::new(()),
        }
    }

    /// The latest complete snapshot, if any cycle has run.
    pub async fn snapshot(&self) -> Option<Arc<ReconciliationSnapshot>> {
        self.current.read().await.clone()
    }

    async fn install(&self, snapshot: Arc<ReconciliationSnapshot>) {
        *self.current.write().await = Some(snapshot);
    }

    /// Explicit, user-initiated cycle. The three fetches run concurrently
    /// and fail fast: the first source error aborts the cycle, discarding
    /// partial results and leaving the previous snapshot in place.
    pub async fn reconcile(
        &self,
        date: NaiveDate,
    ) -> Result<Arc<ReconciliationSnapshot>, SourceError> {
        let _cycle = self.cycle_guard.lock().await;
        let started = Instant::now();

        let fetched = tokio::try_join!(
            self.hotel.fetch_staying_on(date),
            self.restaurant.fetch_bookings_for(date),
            self.restaurant.fetch_custom_fields(),
        );
        let (hotel, restaurant, definitions) = match fetched {
            Ok(datasets) => datasets,
            Err(e) => {
                metrics::record_cycle("manual", "error");
                return Err(e);
            }
        };

        let roles = FieldRoles::resolve(&definitions, &self.settings.field_overrides);
        let snapshot = Arc::new(ReconciliationSnapshot::build(
            date,
            hotel,
            restaurant,
            roles,
            &self.settings.package_inventory_name,
        ));

        tracing::info!(
            %date,
            hotel_bookings = snapshot.stats.hotel_total,
            matched = snapshot.stats.hotel_matched,
            orphans = snapshot.orphans.len(),
            "Reconciliation cycle complete"
        );
        metrics::record_cycle("manual", "ok");
        metrics::record_cycle_duration("manual", started.elapsed().as_secs_f64());

        self.install(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Background cycle. Refetches the two datasets only, reusing the
    /// previous snapshot's resolved field roles; skips the rebuild when the
    /// dataset fingerprint is unchanged. Errors are logged and swallowed.
    pub async fn silent_refresh(&self) -> RefreshOutcome {
        let _cycle = self.cycle_guard.lock().await;
        let Some(previous) = self.current.read().await.clone() else {
            return RefreshOutcome::Skipped;
        };
        let date = previous.context_date;
        let started = Instant::now();

        let fetched = tokio::try_join!(
            self.hotel.fetch_staying_on(date),
            self.restaurant.fetch_bookings_for(date),
        );
        let (hotel, restaurant) = match fetched {
            Ok(datasets) => datasets,
            Err(e) => {
                tracing::warn!(error = %e, %date, "Silent refresh failed; previous snapshot retained");
                metrics::record_cycle("silent", "error");
                return RefreshOutcome::Failed;
            }
        };

        if dataset_fingerprint(&hotel, &restaurant) == previous.data_hash {
            tracing::debug!(%date, "Silent refresh found no changes");
            metrics::record_cycle("silent", "unchanged");
            return RefreshOutcome::Unchanged;
        }

        let snapshot = Arc::new(ReconciliationSnapshot::build(
            date,
            hotel,
            restaurant,
            previous.field_roles.clone(),
            &self.settings.package_inventory_name,
        ));
        tracing::info!(%date, "Silent refresh installed a new snapshot");
        metrics::record_cycle("silent", "ok");
        metrics::record_cycle_duration("silent", started.elapsed().as_secs_f64());
        self.install(snapshot).await;
        RefreshOutcome::Updated
    }

    /// Mark every seated/arrived reservation whose slot has elapsed as
    /// "left". Refetches the reservations first to pick up changes made on
    /// the platform since the last cycle. Updates run concurrently and
    /// tolerate partial failure: successes are kept, failures are counted
    /// and reported, nothing is rolled back.
    pub async fn mark_past_as_left(&self) -> Result<MarkLeftOutcome, ReconcilerError> {
        let _cycle = self.cycle_guard.lock().await;
        let previous = self
            .current
            .read()
            .await
            .clone()
            .ok_or(ReconcilerError::NoSnapshot)?;
        let date = previous.context_date;

        let mut restaurant = self.restaurant.fetch_bookings_for(date).await?;
        let now = Utc::now();

        let targets: Vec<String> = restaurant
            .iter()
            .filter(|b| {
                matches!(
                    b.status,
                    ReservationStatus::Seated | ReservationStatus::Arrived
                ) && reservation_is_past(b, date, now)
            })
            .map(|b| b.id.clone())
            .collect();

        let mut updated_ids: HashSet<String> = HashSet::new();
        let mut failed = 0usize;
        if !targets.is_empty() {
            let results = futures::future::join_all(
                targets
                    .iter()
                    .map(|id| self.restaurant.update_booking_status(id, ReservationStatus::Left)),
            )
            .await;

            for (id, result) in targets.iter().zip(results) {
                match result {
                    Ok(()) => {
                        updated_ids.insert(id.clone());
                    }
                    Err(e) => {
                        tracing::warn!(reservation_id = %id, error = %e, "Failed to mark reservation as left");
                        failed += 1;
                    }
                }
            }

            // Only the successfully-updated subset is mutated locally.
            for booking in &mut restaurant {
                if updated_ids.contains(&booking.id) {
                    booking.status = ReservationStatus::Left;
                }
            }
        }

        let outcome = MarkLeftOutcome {
            targeted: targets.len(),
            updated: updated_ids.len(),
            failed,
        };
        tracing::info!(
            targeted = outcome.targeted,
            updated = outcome.updated,
            failed = outcome.failed,
            "Mark-as-left batch complete"
        );
        metrics::record_mark_left("ok", outcome.updated as u64);
        metrics::record_mark_left("error", outcome.failed as u64);

        let snapshot = Arc::new(ReconciliationSnapshot::build(
            date,
            previous.hotel_bookings.clone(),
            restaurant,
            previous.field_roles.clone(),
            &self.settings.package_inventory_name,
        ));
        self.install(snapshot).await;

        Ok(outcome)
    }

    /// Create a reservation for a hotel booking in the current snapshot,
    /// then fold the created record into the cached dataset and rebuild the
    /// snapshot without a refetch.
    pub async fn create_reservation(
        &self,
        request: &NewReservation,
    ) -> Result<RestaurantBooking, ReconcilerError> {
        let _cycle = self.cycle_guard.lock().await;
        let previous = self
            .current
            .read()
            .await
            .clone()
            .ok_or(ReconcilerError::NoSnapshot)?;

        let hotel_booking = previous
            .hotel_bookings
            .iter()
            .find(|b| b.booking_id == request.hotel_booking_id)
            .ok_or_else(|| {
                ReconcilerError::HotelBookingNotFound(request.hotel_booking_id.clone())
            })?;

        let roles = &previous.field_roles;
        let mut custom_fields = Vec::new();
        if let Some(field_id) = roles.booking_ref_field_id.as_deref() {
            custom_fields.push(CustomFieldValue::text(
                field_id,
                "Booking #",
                &hotel_booking.booking_id,
            ));
        }
        if let (Some(field_id), Some(yes_id)) = (
            roles.hotel_guest_field_id.as_deref(),
            roles.hotel_guest_yes_choice_id.as_deref(),
        ) {
            custom_fields.push(CustomFieldValue::choice(field_id, "Hotel Guest", yes_id, "Yes"));
        }
        if let (Some(field_id), Some(yes_id)) = (
            roles.meal_plan_field_id.as_deref(),
            roles.meal_plan_yes_choice_id.as_deref(),
        ) {
            if previous.package_ids.contains(&hotel_booking.booking_id) {
                custom_fields.push(CustomFieldValue::choice(field_id, "DBB", yes_id, "Yes"));
            }
        }

        let phone = hotel_booking
            .phone()
            .and_then(|raw| normalize_phone(raw, &self.settings.phone_country_prefix));
        let email = hotel_booking.email().map(String::from);
        let notification_email = if self.settings.send_guest_notification && email.is_some() {
            Some(true)
        } else {
            None
        };

        let payload = CreateReservationPayload {
            date: previous.context_date,
            time: request.time.clone(),
            people: request.people,
            guest: ReservationGuestPayload {
                name: hotel_booking.guest_name.clone(),
                phone,
                email,
                notification_email,
            },
            status: "approved".to_string(),
            language_code: "en".to_string(),
            source: "api".to_string(),
            note: "Created by dining-sync".to_string(),
            custom_fields,
            tables: request.table_id.clone().map(|id| vec![id]),
            opening_hour_id: request.opening_hour_id.clone(),
        };

        let created = match self.restaurant.create_booking(&payload).await {
            Ok(booking) => booking,
            Err(e) => {
                metrics::record_reservation_created("error");
                return Err(e.into());
            }
        };
        metrics::record_reservation_created("ok");
        tracing::info!(
            reservation_id = %created.id,
            hotel_booking_id = %request.hotel_booking_id,
            people = request.people,
            time = %request.time,
            "Reservation created for hotel booking"
        );

        let mut restaurant = previous.restaurant_bookings.clone();
        restaurant.push(created.clone());
        let snapshot = Arc::new(ReconciliationSnapshot::build(
            previous.context_date,
            previous.hotel_bookings.clone(),
            restaurant,
            previous.field_roles.clone(),
            &self.settings.package_inventory_name,
        ));
        self.install(snapshot).await;

        Ok(created)
    }
}

/// Whether a reservation counts as past for the mark-as-left sweep. On past
/// context dates everything is past; on the context date itself the slot
/// (start plus duration) must have elapsed; future dates never qualify.
fn reservation_is_past(
    booking: &RestaurantBooking,
    context_date: NaiveDate,
    now: DateTime<Utc>,
) -> bool {
    let today = now.date_naive();
    if context_date < today {
        return true;
    }
    if context_date > today {
        return false;
    }
    booking.has_ended_by(now)
}
