//! Domain models for dining-sync-service.

#![allow(clippy::should_implement_trait)]

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Hotel Roster Models
// ============================================================================

/// A guest contact entry as recorded by the property-management system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMethod {
    pub contact_type: String,
    pub value: String,
}

/// A single inventory line charged against one night of a stay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLineItem {
    pub stay_date: NaiveDate,
    pub description: String,
}

/// One stay-day record from the property-management system.
///
/// Fetched fresh per reconciliation cycle and never mutated; the next cycle
/// supersedes the whole set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelBooking {
    /// Normalized to a string at the client boundary; the wire format may
    /// deliver this as a number.
    pub booking_id: String,
    /// Links sibling bookings travelling as one group.
    pub group_id: Option<String>,
    pub guest_name: String,
    pub surname: String,
    pub room: String,
    pub total_occupants: u32,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub contacts: Vec<ContactMethod>,
    pub inventory_items: Vec<InventoryLineItem>,
    /// Free-text hotel status, display-only.
    pub status: String,
}

impl HotelBooking {
    /// First non-empty contact value of the given type.
    pub fn contact(&self, contact_type: &str) -> Option<&str> {
        self.contacts
            .iter()
            .find(|c| c.contact_type == contact_type)
            .map(|c| c.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Phone number, falling back to the mobile entry.
    pub fn phone(&self) -> Option<&str> {
        self.contact("phone").or_else(|| self.contact("mobile"))
    }

    pub fn email(&self) -> Option<&str> {
        self.contact("email")
    }
}

// ============================================================================
// Reservation Platform Models
// ============================================================================

/// Reservation lifecycle status on the platform side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Arrived,
    Seated,
    Left,
    Declined,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Arrived => "arrived",
            Self::Seated => "seated",
            Self::Left => "left",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
            Self::NoShow => "noshow",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "approved" => Self::Approved,
            "arrived" => Self::Arrived,
            "seated" => Self::Seated,
            "left" => Self::Left,
            "declined" => Self::Declined,
            "cancelled" => Self::Cancelled,
            "noshow" => Self::NoShow,
            _ => Self::Pending,
        }
    }

    /// Only active reservations count toward matching and statistics.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Approved | Self::Arrived | Self::Seated | Self::Left)
    }
}

/// Guest details attached to a reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationGuest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One reservation record from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantBooking {
    pub id: String,
    pub status: ReservationStatus,
    pub date_time: Option<DateTime<Utc>>,
    pub people: u32,
    pub duration_minutes: Option<u32>,
    pub guest: Option<ReservationGuest>,
    /// Legacy top-level guest name carried by older records.
    pub name: Option<String>,
    pub custom_fields: Vec<CustomFieldValue>,
}

impl RestaurantBooking {
    /// Whether the reservation's time slot (start plus seating duration) has
    /// fully elapsed. Records without a start time never count as ended.
    pub fn has_ended_by(&self, now: DateTime<Utc>) -> bool {
        match self.date_time {
            Some(start) => {
                start + Duration::minutes(i64::from(self.duration_minutes.unwrap_or(0))) <= now
            }
            None => false,
        }
    }
}

// ============================================================================
// Custom Field Models
// ============================================================================

/// A custom-field value attached to a reservation.
///
/// The wire format identifies the field under either `_id` (current records)
/// or `id` (older records); both are accepted when matching a field role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomFieldValue {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(
        rename = "multipleChoiceValueName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub choice_label: Option<String>,
}

impl CustomFieldValue {
    /// A free-text field value.
    pub fn text(field_id: &str, name: &str, value: &str) -> Self {
        Self {
            id: Some(field_id.to_string()),
            name: Some(name.to_string()),
            value: Some(serde_json::Value::String(value.to_string())),
            ..Self::default()
        }
    }

    /// A multiple-choice field value referencing a choice id.
    pub fn choice(field_id: &str, name: &str, choice_id: &str, label: &str) -> Self {
        Self {
            id: Some(field_id.to_string()),
            name: Some(name.to_string()),
            value: Some(serde_json::Value::String(choice_id.to_string())),
            choice_label: Some(label.to_string()),
            ..Self::default()
        }
    }

    pub fn matches_field(&self, field_id: &str) -> bool {
        self.id.as_deref() == Some(field_id) || self.legacy_id.as_deref() == Some(field_id)
    }

    /// The value as a non-empty string. Numeric values are stringified;
    /// empty strings and non-scalar values read as absent.
    pub fn value_str(&self) -> Option<String> {
        match self.value.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One choice of a multiple-choice custom field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldChoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// Schema entry for one of the platform's dynamically-defined custom fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(rename = "multipleChoiceSelections", default)]
    pub multiple_choice_selections: Vec<CustomFieldChoice>,
}

// ============================================================================
// Availability Models
// ============================================================================

/// Seating policy of a service period: slot interval and seating duration,
/// both in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatingPolicy {
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Opening hours of one service period. `open` and `close` are HHMM
/// integers (e.g. 1730 for half past five).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub open: Option<u32>,
    #[serde(default)]
    pub close: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating: Option<SeatingPolicy>,
}

/// Available times reported for one service period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePeriodTimes {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "availableTimes", default)]
    pub available_times: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A bookable table (possibly a combination such as "Table 1 + Table 2").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub booked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<TableArea>,
}

// ============================================================================
// Name And Phone Normalization
// ============================================================================

/// Title-case a guest name, handling apostrophes (O'Brien), Mc (McDonald)
/// and Mac followed by an uppercase letter (MacDonald).
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let lower = word.to_lowercase();

    if chars.len() > 2 && chars[1] == '\'' {
        let mut out = String::new();
        out.extend(chars[0].to_uppercase());
        out.push('\'');
        out.extend(chars[2].to_uppercase());
        out.push_str(&chars[3..].iter().collect::<String>().to_lowercase());
        return out;
    }
    if lower.starts_with("mc") && chars.len() > 2 {
        let mut out = String::from("Mc");
        out.extend(chars[2].to_uppercase());
        out.push_str(&chars[3..].iter().collect::<String>().to_lowercase());
        return out;
    }
    if lower.starts_with("mac") && chars.len() > 3 && !chars[3].is_lowercase() {
        let mut out = String::from("Mac");
        out.extend(chars[3].to_uppercase());
        out.push_str(&chars[4..].iter().collect::<String>().to_lowercase());
        return out;
    }

    let mut out = String::new();
    out.extend(chars[0].to_uppercase());
    out.push_str(&chars[1..].iter().collect::<String>().to_lowercase());
    out
}

/// Normalize a raw phone number for the reservation platform: digits only,
/// leading zero dropped, country prefix applied.
pub fn normalize_phone(raw: &str, country_prefix: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits = digits.strip_prefix('0').unwrap_or(&digits);
    Some(format!("{}{}", country_prefix, digits))
}
