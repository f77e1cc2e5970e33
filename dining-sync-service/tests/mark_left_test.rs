//! Integration tests for the batch mark-as-left operation.

mod common;

use common::{custom_field_schema, hotel_booking, reservation, TestApp};
use dining_sync_service::models::ReservationStatus;
use dining_sync_service::services::sources::mock::{MockReservationSource, MockRosterSource};
use reqwest::Client;

// The context date is in the past, so every seated/arrived reservation
// counts as past regardless of its time slot.
const CONTEXT_DATE: &str = "2024-03-02";

async fn reconciled_app(reservations: MockReservationSource) -> (TestApp, Client) {
    let roster = MockRosterSource::new(vec![hotel_booking("1", None)]);
    let app = TestApp::spawn(roster, reservations).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/reconcile", app.address))
        .json(&serde_json::json!({ "date": CONTEXT_DATE }))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    (app, client)
}

#[tokio::test]
async fn marks_past_seated_and_arrived_reservations_as_left() {
    let reservations = MockReservationSource::new(
        vec![
            reservation("r1", ReservationStatus::Seated, vec![]),
            reservation("r2", ReservationStatus::Arrived, vec![]),
            // Approved reservations are not targeted.
            reservation("r3", ReservationStatus::Approved, vec![]),
        ],
        custom_field_schema(),
    );
    let (app, client) = reconciled_app(reservations).await;

    let response = client
        .post(format!("{}/api/reservations/mark-left", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["targeted"], 2);
    assert_eq!(outcome["updated"], 2);
    assert_eq!(outcome["failed"], 0);

    let calls = app.reservations.update_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls
        .iter()
        .all(|(_, status)| *status == ReservationStatus::Left));

    // The rebuilt snapshot reflects the transitions.
    let report: serde_json::Value = client
        .get(format!("{}/api/report", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let statuses: Vec<(&str, &str)> = report["restaurant_bookings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| (b["id"].as_str().unwrap(), b["status"].as_str().unwrap()))
        .collect();
    assert!(statuses.contains(&("r1", "left")));
    assert!(statuses.contains(&("r2", "left")));
    assert!(statuses.contains(&("r3", "approved")));
}

#[tokio::test]
async fn partial_failure_keeps_the_successful_subset() {
    let reservations = MockReservationSource::new(
        vec![
            reservation("r1", ReservationStatus::Seated, vec![]),
            reservation("r2", ReservationStatus::Seated, vec![]),
        ],
        custom_field_schema(),
    );
    reservations.fail_update_for("r2");
    let (app, client) = reconciled_app(reservations).await;

    let response = client
        .post(format!("{}/api/reservations/mark-left", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    // Partial failure is not an error; it is counted and reported.
    assert!(response.status().is_success());

    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["targeted"], 2);
    assert_eq!(outcome["updated"], 1);
    assert_eq!(outcome["failed"], 1);

    let report: serde_json::Value = client
        .get(format!("{}/api/report", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let statuses: Vec<(&str, &str)> = report["restaurant_bookings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| (b["id"].as_str().unwrap(), b["status"].as_str().unwrap()))
        .collect();
    assert!(statuses.contains(&("r1", "left")));
    // The failed update is not applied locally either.
    assert!(statuses.contains(&("r2", "seated")));
}

#[tokio::test]
async fn mark_left_without_a_snapshot_is_a_conflict() {
    let app = TestApp::spawn(MockRosterSource::default(), MockReservationSource::default()).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/reservations/mark-left", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);
}
