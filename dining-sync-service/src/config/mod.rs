//! Configuration module for dining-sync-service.

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct DiningSyncConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub hotel_source: HotelSourceConfig,
    pub reservation_source: ReservationSourceConfig,
    pub reconciliation: ReconciliationConfig,
}

/// Connection settings for the property-management system's roster API.
#[derive(Debug, Clone)]
pub struct HotelSourceConfig {
    pub api_base_url: String,
    pub region: String,
    pub username: String,
    pub password: Secret<String>,
    pub api_key: Secret<String>,
}

/// Connection settings for the restaurant reservation platform's API.
#[derive(Debug, Clone)]
pub struct ReservationSourceConfig {
    pub api_base_url: String,
    pub api_key: Secret<String>,
}

/// Operator-supplied reconciliation behavior.
#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// Case-insensitive inventory description substring identifying the
    /// dinner package. Empty disables package classification.
    pub package_inventory_name: String,
    /// Table area expanded by default in the presentation layer.
    pub default_table_area: String,
    /// Background refresh period in seconds. 0 disables the refresh task.
    pub auto_refresh_seconds: u64,
    /// Ask the platform to email the guest when a reservation is created.
    pub send_guest_notification: bool,
    /// Country prefix applied when normalizing guest phone numbers.
    pub phone_country_prefix: String,
    pub field_overrides: FieldOverrides,
}

/// Explicit custom-field-id overrides. When set, the resolver trusts the
/// operator verbatim instead of applying the name heuristics.
#[derive(Debug, Clone, Default)]
pub struct FieldOverrides {
    pub booking_ref_field_id: Option<String>,
    pub hotel_guest_field_id: Option<String>,
    pub meal_plan_field_id: Option<String>,
}

impl DiningSyncConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "dining-sync-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            hotel_source: HotelSourceConfig {
                api_base_url: required("HOTEL_API_BASE_URL")?,
                region: env::var("HOTEL_API_REGION").unwrap_or_else(|_| "au".to_string()),
                username: required("HOTEL_API_USERNAME")?,
                password: Secret::new(required("HOTEL_API_PASSWORD")?),
                api_key: Secret::new(required("HOTEL_API_KEY")?),
            },
            reservation_source: ReservationSourceConfig {
                api_base_url: required("RESERVATION_API_BASE_URL")?,
                api_key: Secret::new(required("RESERVATION_API_KEY")?),
            },
            reconciliation: ReconciliationConfig {
                package_inventory_name: env::var("PACKAGE_INVENTORY_NAME").unwrap_or_default(),
                default_table_area: env::var("DEFAULT_TABLE_AREA").unwrap_or_default(),
                auto_refresh_seconds: env::var("AUTO_REFRESH_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
                send_guest_notification: env::var("SEND_GUEST_NOTIFICATION")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
                phone_country_prefix: env::var("PHONE_COUNTRY_PREFIX")
                    .unwrap_or_else(|_| "+44".to_string()),
                field_overrides: FieldOverrides {
                    booking_ref_field_id: optional("BOOKING_REF_FIELD_ID"),
                    hotel_guest_field_id: optional("HOTEL_GUEST_FIELD_ID"),
                    meal_plan_field_id: optional("MEAL_PLAN_FIELD_ID"),
                },
            },
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::ConfigError(anyhow::anyhow!("{} is required", name)))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
