//! HTTP handlers for the reconciliation API.
//!
//! The presentation layer drives the engine exclusively through these
//! routes; source failures surface as blocking 502s with distinguished
//! messages, and the caller retries by re-posting the operation.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::dtos::{
    AvailableTablesQuery, AvailableTimesQuery, CreateReservationRequest,
    CreateReservationResponse, ReconcileRequest,
};
use crate::engine::ReconciliationSnapshot;
use crate::services::availability::{
    derive_time_slots, group_tables_by_area, ServicePeriodSlots, TableAreaGroup,
};
use crate::services::reconciler::{MarkLeftOutcome, NewReservation, ReconcilerError};
use crate::services::sources::SourceError;
use crate::startup::AppState;

fn source_error(err: SourceError) -> AppError {
    AppError::BadGateway(err.to_string())
}

fn reconciler_error(err: ReconcilerError) -> AppError {
    match err {
        ReconcilerError::NoSnapshot => AppError::Conflict(anyhow::anyhow!(err.to_string())),
        ReconcilerError::HotelBookingNotFound(_) => {
            AppError::NotFound(anyhow::anyhow!(err.to_string()))
        }
        ReconcilerError::Source(source) => source_error(source),
    }
}

/// Run a full reconciliation cycle for the given date and return the
/// resulting report.
pub async fn reconcile(
    State(state): State<AppState>,
    Json(payload): Json<ReconcileRequest>,
) -> Result<Json<ReconciliationSnapshot>, AppError> {
    tracing::info!(date = %payload.date, "Reconcile requested");
    let snapshot = state
        .reconciler
        .reconcile(payload.date)
        .await
        .map_err(source_error)?;
    Ok(Json(snapshot.as_ref().clone()))
}

/// The most recent report, if any cycle has completed.
pub async fn report(
    State(state): State<AppState>,
) -> Result<Json<ReconciliationSnapshot>, AppError> {
    state
        .reconciler
        .snapshot()
        .await
        .map(|s| Json(s.as_ref().clone()))
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("no reconciliation has run yet")))
}

/// Create a reservation for a hotel booking in the current snapshot.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<CreateReservationResponse>), AppError> {
    if payload.people == 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "people must be at least 1"
        )));
    }

    tracing::info!(
        hotel_booking_id = %payload.hotel_booking_id,
        time = %payload.time,
        people = payload.people,
        "Creating reservation"
    );

    let created = state
        .reconciler
        .create_reservation(&NewReservation {
            hotel_booking_id: payload.hotel_booking_id,
            time: payload.time,
            people: payload.people,
            table_id: payload.table_id,
            opening_hour_id: payload.opening_hour_id,
        })
        .await
        .map_err(reconciler_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReservationResponse {
            reservation_id: created.id,
            status: created.status.as_str().to_string(),
        }),
    ))
}

/// Batch-transition past seated/arrived reservations to "left". Partial
/// failure is tolerated and reported, not rolled back.
pub async fn mark_past_as_left(
    State(state): State<AppState>,
) -> Result<Json<MarkLeftOutcome>, AppError> {
    let outcome = state
        .reconciler
        .mark_past_as_left()
        .await
        .map_err(reconciler_error)?;
    Ok(Json(outcome))
}

/// Bookable time slots per service period for a date and party size.
pub async fn available_times(
    State(state): State<AppState>,
    Query(query): Query<AvailableTimesQuery>,
) -> Result<Json<Vec<ServicePeriodSlots>>, AppError> {
    let (periods, hours) = tokio::try_join!(
        state
            .reservations
            .fetch_available_times(query.date, query.people),
        state.reservations.fetch_opening_hours(),
    )
    .map_err(source_error)?;
    Ok(Json(derive_time_slots(&periods, &hours)))
}

/// Tables grouped by area for a time window and party size.
pub async fn available_tables(
    State(state): State<AppState>,
    Query(query): Query<AvailableTablesQuery>,
) -> Result<Json<Vec<TableAreaGroup>>, AppError> {
    let tables = state
        .reservations
        .fetch_available_tables(query.people, &query.from_date_time, &query.to_date_time)
        .await
        .map_err(source_error)?;
    Ok(Json(group_tables_by_area(
        &tables,
        &state.config.reconciliation.default_table_area,
    )))
}
