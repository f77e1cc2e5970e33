//! Integration tests for the availability endpoints.

mod common;

use common::TestApp;
use dining_sync_service::models::{
    DiningTable, OpeningHours, SeatingPolicy, ServicePeriodTimes, TableArea,
};
use dining_sync_service::services::sources::mock::{MockReservationSource, MockRosterSource};
use reqwest::Client;

#[tokio::test]
async fn available_times_merge_opening_hours_with_reported_times() {
    let reservations = MockReservationSource::default();
    reservations.set_periods(vec![ServicePeriodTimes {
        id: "dinner".to_string(),
        name: Some("Dinner".to_string()),
        available_times: vec!["18:00".to_string(), "18:30".to_string()],
    }]);
    reservations.set_opening_hours(vec![OpeningHours {
        id: "dinner".to_string(),
        name: Some("Dinner".to_string()),
        open: Some(1800),
        close: Some(2100),
        seating: Some(SeatingPolicy {
            interval: Some(30),
            duration: Some(120),
        }),
    }]);
    let app = TestApp::spawn(MockRosterSource::default(), reservations).await;
    let client = Client::new();

    let periods: serde_json::Value = client
        .get(format!(
            "{}/api/availability/times?date=2024-03-02&people=2",
            app.address
        ))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let slots = periods[0]["slots"].as_array().unwrap();
    let times: Vec<&str> = slots.iter().map(|s| s["time"].as_str().unwrap()).collect();
    assert_eq!(times, vec!["18:00", "18:30", "19:00"]);
    assert_eq!(slots[0]["available"], true);
    assert_eq!(slots[2]["available"], false);
}

#[tokio::test]
async fn available_tables_group_by_area_with_default_flag() {
    let reservations = MockReservationSource::default();
    reservations.set_tables(vec![
        DiningTable {
            id: "t2".to_string(),
            name: Some("Table 2".to_string()),
            booked: false,
            area: Some(TableArea {
                name: Some("Restaurant".to_string()),
            }),
        },
        DiningTable {
            id: "t1".to_string(),
            name: Some("Table 1".to_string()),
            booked: true,
            area: Some(TableArea {
                name: Some("Restaurant".to_string()),
            }),
        },
        DiningTable {
            id: "b1".to_string(),
            name: Some("Bar 1".to_string()),
            booked: false,
            area: Some(TableArea {
                name: Some("Bar".to_string()),
            }),
        },
    ]);
    let app = TestApp::spawn(MockRosterSource::default(), reservations).await;
    let client = Client::new();

    let groups: serde_json::Value = client
        .get(format!(
            "{}/api/availability/tables?people=2&from_date_time=2024-03-02T18:00:00&to_date_time=2024-03-02T20:00:00",
            app.address
        ))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    // The test config's default area is "Restaurant".
    assert_eq!(groups[0]["name"], "Restaurant");
    assert_eq!(groups[0]["is_default"], true);
    let names: Vec<&str> = groups[0]["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Table 1", "Table 2"]);
    assert_eq!(groups[1]["name"], "Bar");
    assert_eq!(groups[1]["is_default"], false);
}
