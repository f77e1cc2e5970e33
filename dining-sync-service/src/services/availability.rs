//! Derivation of bookable time slots and table groupings from the
//! reservation platform's availability endpoints.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{DiningTable, OpeningHours, ServicePeriodTimes};

/// One bookable (or sold-out) slot within a service period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    /// "H:MM" display form, hour not zero-padded.
    pub time: String,
    /// HHMM integer form for sorting and comparison.
    pub hhmm: u32,
    pub available: bool,
}

/// All slots of one service period.
#[derive(Debug, Clone, Serialize)]
pub struct ServicePeriodSlots {
    pub period_id: String,
    pub name: String,
    pub slots: Vec<TimeSlot>,
}

const DEFAULT_INTERVAL_MINUTES: u32 = 15;
const DEFAULT_DURATION_MINUTES: u32 = 120;

/// Merge the platform's available times with the venue's opening hours.
///
/// With an opening-hours entry, the full slot grid is generated from opening
/// time up to the last slot that still fits a whole seating duration before
/// close, and each slot is flagged available when the platform reported it.
/// Without one, the raw available times are passed through, sorted. Periods
/// with neither are dropped.
pub fn derive_time_slots(
    periods: &[ServicePeriodTimes],
    opening_hours: &[OpeningHours],
) -> Vec<ServicePeriodSlots> {
    let hours_by_id: HashMap<&str, &OpeningHours> =
        opening_hours.iter().map(|oh| (oh.id.as_str(), oh)).collect();

    let mut result = Vec::new();
    for period in periods {
        let normalized: HashSet<String> = period
            .available_times
            .iter()
            .filter_map(|t| parse_time_minutes(t))
            .map(format_minutes)
            .collect();

        let slots: Vec<TimeSlot> = match hours_by_id.get(period.id.as_str()) {
            Some(oh) if oh.open.is_some() && oh.close.is_some() => {
                let interval = oh
                    .seating
                    .as_ref()
                    .and_then(|s| s.interval)
                    .filter(|i| *i > 0)
                    .unwrap_or(DEFAULT_INTERVAL_MINUTES);
                let duration = oh
                    .seating
                    .as_ref()
                    .and_then(|s| s.duration)
                    .unwrap_or(DEFAULT_DURATION_MINUTES);
                let open_minutes = hhmm_to_minutes(oh.open.unwrap());
                let close_minutes = hhmm_to_minutes(oh.close.unwrap());
                // The last bookable slot must fit a whole seating duration
                // before close; the interval makes that bound inclusive.
                let end_minutes = close_minutes.saturating_sub(duration) + interval;

                (open_minutes..end_minutes)
                    .step_by(interval as usize)
                    .map(|minutes| {
                        let time = format_minutes(minutes);
                        TimeSlot {
                            available: normalized.contains(&time),
                            hhmm: minutes_to_hhmm(minutes),
                            time,
                        }
                    })
                    .collect()
            }
            _ if !period.available_times.is_empty() => {
                let mut slots: Vec<TimeSlot> = period
                    .available_times
                    .iter()
                    .filter_map(|t| parse_time_minutes(t))
                    .map(|minutes| TimeSlot {
                        time: format_minutes(minutes),
                        hhmm: minutes_to_hhmm(minutes),
                        available: true,
                    })
                    .collect();
                slots.sort_by_key(|s| s.hhmm);
                slots
            }
            _ => continue,
        };

        if slots.is_empty() {
            continue;
        }

        let name = period.name.clone().unwrap_or_else(|| {
            format!(
                "{} - {}",
                slots.first().unwrap().time,
                slots.last().unwrap().time
            )
        });
        result.push(ServicePeriodSlots {
            period_id: period.id.clone(),
            name,
            slots,
        });
    }

    result
}

fn hhmm_to_minutes(hhmm: u32) -> u32 {
    (hhmm / 100) * 60 + hhmm % 100
}

fn minutes_to_hhmm(minutes: u32) -> u32 {
    (minutes / 60) * 100 + minutes % 60
}

fn format_minutes(minutes: u32) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// "18:30" / "9:5" -> minutes since midnight.
fn parse_time_minutes(raw: &str) -> Option<u32> {
    let mut parts = raw.split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 0,
    };
    Some(hours * 60 + minutes)
}

/// One area of the floor plan with its tables, sorted for display.
#[derive(Debug, Clone, Serialize)]
pub struct TableAreaGroup {
    pub name: String,
    /// Whether this is the operator-configured default area.
    pub is_default: bool,
    pub tables: Vec<DiningTable>,
}

/// Group tables by area, preserving first-seen area order. Combination
/// tables spanning more than two physical tables are not offered. Tables
/// sort by the first number in their name; unnumbered tables sort last.
pub fn group_tables_by_area(tables: &[DiningTable], default_area: &str) -> Vec<TableAreaGroup> {
    let default_area = default_area.trim();

    let mut groups: Vec<TableAreaGroup> = Vec::new();
    for table in tables {
        let name = table.name.as_deref().unwrap_or("");
        if name.matches('+').count() > 1 {
            continue;
        }
        let area_name = table
            .area
            .as_ref()
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| "Other".to_string());

        match groups.iter_mut().find(|g| g.name == area_name) {
            Some(group) => group.tables.push(table.clone()),
            None => groups.push(TableAreaGroup {
                is_default: !default_area.is_empty()
                    && area_name.eq_ignore_ascii_case(default_area),
                name: area_name,
                tables: vec![table.clone()],
            }),
        }
    }

    for group in &mut groups {
        group
            .tables
            .sort_by_key(|t| table_sort_number(t.name.as_deref().unwrap_or("")));
    }
    groups
}

fn table_sort_number(name: &str) -> u32 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(9999)
}
