use std::sync::Arc;

use chrono::NaiveDate;
use dining_sync_service::config::{
    DiningSyncConfig, FieldOverrides, HotelSourceConfig, ReconciliationConfig,
    ReservationSourceConfig,
};
use dining_sync_service::models::{
    ContactMethod, CustomFieldChoice, CustomFieldDefinition, CustomFieldValue, HotelBooking,
    InventoryLineItem, ReservationStatus, RestaurantBooking,
};
use dining_sync_service::services::sources::mock::{MockReservationSource, MockRosterSource};
use dining_sync_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;

pub struct TestApp {
    pub address: String,
    pub roster: Arc<MockRosterSource>,
    pub reservations: Arc<MockReservationSource>,
}

pub fn test_config() -> DiningSyncConfig {
    DiningSyncConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
        },
        service_name: "dining-sync-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "info".to_string(),
        otlp_endpoint: None,
        hotel_source: HotelSourceConfig {
            api_base_url: "http://localhost/hotel".to_string(),
            region: "au".to_string(),
            username: "test-user".to_string(),
            password: Secret::new("test-password".to_string()),
            api_key: Secret::new("test-key".to_string()),
        },
        reservation_source: ReservationSourceConfig {
            api_base_url: "http://localhost/restaurant".to_string(),
            api_key: Secret::new("test-key".to_string()),
        },
        reconciliation: ReconciliationConfig {
            package_inventory_name: "dinner bed".to_string(),
            default_table_area: "Restaurant".to_string(),
            auto_refresh_seconds: 0,
            send_guest_notification: false,
            phone_country_prefix: "+44".to_string(),
            field_overrides: FieldOverrides::default(),
        },
    }
}

impl TestApp {
    pub async fn spawn(roster: MockRosterSource, reservations: MockReservationSource) -> Self {
        Self::spawn_with_config(test_config(), roster, reservations).await
    }

    pub async fn spawn_with_config(
        config: DiningSyncConfig,
        roster: MockRosterSource,
        reservations: MockReservationSource,
    ) -> Self {
        let roster = Arc::new(roster);
        let reservations = Arc::new(reservations);

        let app =
            Application::build_with_sources(config, roster.clone(), reservations.clone())
                .await
                .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint.
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            roster,
            reservations,
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn hotel_booking(id: &str, group_id: Option<&str>) -> HotelBooking {
    HotelBooking {
        booking_id: id.to_string(),
        group_id: group_id.map(String::from),
        guest_name: "Jane Smith".to_string(),
        surname: "smith".to_string(),
        room: "12".to_string(),
        total_occupants: 2,
        arrival_date: Some(date(2024, 3, 1)),
        departure_date: Some(date(2024, 3, 4)),
        contacts: vec![
            ContactMethod {
                contact_type: "phone".to_string(),
                value: "07911 123456".to_string(),
            },
            ContactMethod {
                contact_type: "email".to_string(),
                value: "jane@example.com".to_string(),
            },
        ],
        inventory_items: vec![],
        status: "confirmed".to_string(),
    }
}

pub fn hotel_booking_with_package(id: &str, stay_date: NaiveDate) -> HotelBooking {
    let mut booking = hotel_booking(id, None);
    booking.inventory_items = vec![InventoryLineItem {
        stay_date,
        description: "Dinner Bed & Breakfast Package".to_string(),
    }];
    booking
}

pub fn reservation(
    id: &str,
    status: ReservationStatus,
    custom_fields: Vec<CustomFieldValue>,
) -> RestaurantBooking {
    RestaurantBooking {
        id: id.to_string(),
        status,
        date_time: None,
        people: 2,
        duration_minutes: Some(120),
        guest: None,
        name: None,
        custom_fields,
    }
}

/// The platform schema used across tests: booking reference, hotel-guest
/// flag, meal-plan flag and GROUP/EXCLUDE.
pub fn custom_field_schema() -> Vec<CustomFieldDefinition> {
    vec![
        CustomFieldDefinition {
            id: "f-ref".to_string(),
            name: "Booking #".to_string(),
            field_type: None,
            multiple_choice_selections: vec![],
        },
        CustomFieldDefinition {
            id: "f-guest".to_string(),
            name: "Hotel Guest".to_string(),
            field_type: None,
            multiple_choice_selections: vec![
                CustomFieldChoice {
                    id: "c-yes".to_string(),
                    name: "Yes".to_string(),
                },
                CustomFieldChoice {
                    id: "c-no".to_string(),
                    name: "No".to_string(),
                },
            ],
        },
        CustomFieldDefinition {
            id: "f-dbb".to_string(),
            name: "DBB".to_string(),
            field_type: None,
            multiple_choice_selections: vec![CustomFieldChoice {
                id: "d-yes".to_string(),
                name: "Yes".to_string(),
            }],
        },
        CustomFieldDefinition {
            id: "f-group".to_string(),
            name: "GROUP/EXCLUDE".to_string(),
            field_type: None,
            multiple_choice_selections: vec![],
        },
    ]
}
