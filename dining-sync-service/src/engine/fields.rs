//! Resolution of the reservation platform's dynamic custom-field schema
//! into the semantic roles the engine needs.

use serde::Serialize;

use crate::config::FieldOverrides;
use crate::models::CustomFieldDefinition;

/// Resolved field-role bindings, computed once per cycle and passed
/// explicitly into every downstream component.
///
/// Every binding is optional: an unresolved role disables the dependent
/// feature, it is never an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldRoles {
    pub booking_ref_field_id: Option<String>,
    pub hotel_guest_field_id: Option<String>,
    pub hotel_guest_yes_choice_id: Option<String>,
    pub meal_plan_field_id: Option<String>,
    pub meal_plan_yes_choice_id: Option<String>,
    pub group_exclude_field_id: Option<String>,
}

impl FieldRoles {
    /// Resolve roles from the schema. An explicit operator override wins
    /// verbatim; otherwise a deterministic name heuristic is applied.
    pub fn resolve(definitions: &[CustomFieldDefinition], overrides: &FieldOverrides) -> Self {
        let booking_ref_field_id = overrides.booking_ref_field_id.clone().or_else(|| {
            find_field(definitions, |name| {
                name.contains("booking") && name.contains('#')
            })
        });

        let hotel_guest_field_id = overrides.hotel_guest_field_id.clone().or_else(|| {
            find_field(definitions, |name| {
                name.contains("hotel") && name.contains("guest")
            })
        });
        let hotel_guest_yes_choice_id = hotel_guest_field_id
            .as_deref()
            .and_then(|id| yes_choice_id(definitions, id));

        let meal_plan_field_id = overrides
            .meal_plan_field_id
            .clone()
            .or_else(|| find_field(definitions, |name| name == "dbb"));
        let meal_plan_yes_choice_id = meal_plan_field_id
            .as_deref()
            .and_then(|id| yes_choice_id(definitions, id));

        // No override path here: exact, case-sensitive name match.
        let group_exclude_field_id = definitions
            .iter()
            .find(|f| f.name == "GROUP/EXCLUDE")
            .map(|f| f.id.clone());

        Self {
            booking_ref_field_id,
            hotel_guest_field_id,
            hotel_guest_yes_choice_id,
            meal_plan_field_id,
            meal_plan_yes_choice_id,
            group_exclude_field_id,
        }
    }
}

fn find_field(
    definitions: &[CustomFieldDefinition],
    predicate: impl Fn(&str) -> bool,
) -> Option<String> {
    definitions
        .iter()
        .find(|f| predicate(&f.name.to_lowercase()))
        .map(|f| f.id.clone())
}

/// The id of the field's "Yes" choice, matched case-insensitively on the
/// choice label. Absent when the field is unknown or has no such choice.
fn yes_choice_id(definitions: &[CustomFieldDefinition], field_id: &str) -> Option<String> {
    definitions
        .iter()
        .find(|f| f.id == field_id)?
        .multiple_choice_selections
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case("yes"))
        .map(|c| c.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomFieldChoice;

    fn definition(id: &str, name: &str, choices: &[(&str, &str)]) -> CustomFieldDefinition {
        CustomFieldDefinition {
            id: id.to_string(),
            name: name.to_string(),
            field_type: None,
            multiple_choice_selections: choices
                .iter()
                .map(|(cid, cname)| CustomFieldChoice {
                    id: cid.to_string(),
                    name: cname.to_string(),
                })
                .collect(),
        }
    }

    fn schema() -> Vec<CustomFieldDefinition> {
        vec![
            definition("f-ref", "Booking #", &[]),
            definition("f-guest", "Hotel Guest?", &[("c-yes", "Yes"), ("c-no", "No")]),
            definition("f-dbb", "DBB", &[("d-yes", "YES"), ("d-no", "No")]),
            definition("f-group", "GROUP/EXCLUDE", &[]),
        ]
    }

    #[test]
    fn resolves_all_roles_by_name_heuristics() {
        let roles = FieldRoles::resolve(&schema(), &FieldOverrides::default());
        assert_eq!(roles.booking_ref_field_id.as_deref(), Some("f-ref"));
        assert_eq!(roles.hotel_guest_field_id.as_deref(), Some("f-guest"));
        assert_eq!(roles.hotel_guest_yes_choice_id.as_deref(), Some("c-yes"));
        assert_eq!(roles.meal_plan_field_id.as_deref(), Some("f-dbb"));
        assert_eq!(roles.meal_plan_yes_choice_id.as_deref(), Some("d-yes"));
        assert_eq!(roles.group_exclude_field_id.as_deref(), Some("f-group"));
    }

    #[test]
    fn explicit_overrides_win_verbatim() {
        let overrides = FieldOverrides {
            booking_ref_field_id: Some("custom-ref".into()),
            hotel_guest_field_id: Some("f-guest".into()),
            meal_plan_field_id: Some("not-in-schema".into()),
        };
        let roles = FieldRoles::resolve(&schema(), &overrides);
        // Trusted even though no such field exists in the schema.
        assert_eq!(roles.booking_ref_field_id.as_deref(), Some("custom-ref"));
        // Override with a schema-known field still resolves its Yes choice.
        assert_eq!(roles.hotel_guest_yes_choice_id.as_deref(), Some("c-yes"));
        // Override pointing nowhere keeps the id but has no Yes choice.
        assert_eq!(roles.meal_plan_field_id.as_deref(), Some("not-in-schema"));
        assert_eq!(roles.meal_plan_yes_choice_id, None);
    }

    #[test]
    fn group_exclude_match_is_case_sensitive() {
        let defs = vec![definition("f1", "group/exclude", &[])];
        let roles = FieldRoles::resolve(&defs, &FieldOverrides::default());
        assert_eq!(roles.group_exclude_field_id, None);
    }

    #[test]
    fn meal_plan_name_must_match_exactly() {
        let defs = vec![definition("f1", "dbb included", &[])];
        let roles = FieldRoles::resolve(&defs, &FieldOverrides::default());
        assert_eq!(roles.meal_plan_field_id, None);
    }

    #[test]
    fn unresolved_roles_are_absent_not_errors() {
        let roles = FieldRoles::resolve(&[], &FieldOverrides::default());
        assert_eq!(roles.booking_ref_field_id, None);
        assert_eq!(roles.hotel_guest_field_id, None);
        assert_eq!(roles.group_exclude_field_id, None);
    }
}
