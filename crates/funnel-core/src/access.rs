//! # Access Policy
//!
//! Pure `(role, section)` permission table and the navigation fallback.
//!
//! | Role | sales | leads | opportunities | actions | employees |
//! |---|---|---|---|---|---|
//! | Super Admin | yes | yes | yes | yes | yes |
//! | Admin/Founder | yes | yes | yes | yes | no |
//! | Sales Head | yes | yes | yes | yes | no |
//! | Presales roles | no | yes | yes | yes | no |
//! | Delivery Manager | no | no | no | yes | no |

use crate::types::{Role, Section};

/// Whether `role` may view and mutate `section`.
#[must_use]
pub const fn can_access(role: Role, section: Section) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::AdminFounder | Role::SalesHead => !matches!(section, Section::Employees),
        Role::PresalesConsultant | Role::PresalesLead | Role::PresalesManager => matches!(
            section,
            Section::Leads | Section::Opportunities | Section::Actions
        ),
        Role::DeliveryManager => matches!(section, Section::Actions),
    }
}

/// Sections `role` may use, in navigation priority order.
#[must_use]
pub fn accessible_sections(role: Role) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|s| can_access(role, *s))
        .collect()
}

/// Keep `current` if `role` may use it, otherwise move to the first
/// accessible section (or `actions`).
#[must_use]
pub fn fallback_section(current: Section, role: Role) -> Section {
    if can_access(role, current) {
        return current;
    }
    Section::ALL
        .into_iter()
        .find(|s| can_access(role, *s))
        .unwrap_or(Section::Actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_open_to_every_role() {
        for role in Role::ALL {
            assert!(can_access(*role, Section::Actions), "{role}");
        }
    }

    #[test]
    fn only_super_admin_manages_employees() {
        let managers: Vec<Role> = Role::ALL
            .iter()
            .copied()
            .filter(|r| can_access(*r, Section::Employees))
            .collect();
        assert_eq!(managers, vec![Role::SuperAdmin]);
    }

    #[test]
    fn presales_cannot_see_sales() {
        assert_eq!(
            accessible_sections(Role::PresalesManager),
            vec![Section::Leads, Section::Opportunities, Section::Actions]
        );
    }

    #[test]
    fn sales_head_to_delivery_manager_lands_on_actions() {
        assert_eq!(
            fallback_section(Section::Opportunities, Role::DeliveryManager),
            Section::Actions
        );
    }

    #[test]
    fn fallback_keeps_accessible_section() {
        assert_eq!(
            fallback_section(Section::Opportunities, Role::PresalesLead),
            Section::Opportunities
        );
        assert_eq!(fallback_section(Section::Sales, Role::PresalesLead), Section::Leads);
        assert_eq!(fallback_section(Section::Employees, Role::SalesHead), Section::Sales);
    }
}
