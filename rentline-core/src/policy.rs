//! Role policy for every protected action.
//!
//! The table in [`Action::rule`] is the only place that knows which roles may
//! invoke what. Handlers call [`authorize`] once and then apply ownership
//! checks against ids returned by the repositories.

use crate::{CoreError, CoreResult, Role, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateEstate,
    UpdateEstate,
    DeleteEstate,
    CreateBooking,
    RetrieveBooking,
    UpdateBookingStatus,
    CreateReview,
    ListSearchHistory,
    ListVisitors,
}

/// What happens when the caller's role is not listed for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDenied {
    /// 403 with the rule's message.
    Forbid,
    /// The caller sees an empty scope: an empty list or a 404.
    EmptyScope,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// `None` admits any authenticated caller.
    pub roles: Option<&'static [Role]>,
    pub on_denied: OnDenied,
    pub message: &'static str,
}

/// Outcome of a successful policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Granted(Role),
    Empty,
}

impl Action {
    pub const fn rule(self) -> Rule {
        match self {
            Action::CreateEstate => Rule {
                roles: Some(&[Role::Landlord]),
                on_denied: OnDenied::Forbid,
                message: "Only landlords can create estates.",
            },
            Action::UpdateEstate | Action::DeleteEstate => Rule {
                roles: None,
                on_denied: OnDenied::Forbid,
                message: "You are not the owner of this estate.",
            },
            Action::CreateBooking => Rule {
                roles: Some(&[Role::Tenant]),
                on_denied: OnDenied::Forbid,
                message: "Only tenants can create bookings.",
            },
            Action::RetrieveBooking => Rule {
                roles: Some(&[Role::Tenant, Role::Landlord]),
                on_denied: OnDenied::EmptyScope,
                message: "No Booking matches the given query.",
            },
            Action::UpdateBookingStatus => Rule {
                roles: Some(&[Role::Tenant, Role::Landlord]),
                on_denied: OnDenied::Forbid,
                message: "Only tenants and landlords can change booking status.",
            },
            Action::CreateReview => Rule {
                roles: Some(&[Role::Tenant]),
                on_denied: OnDenied::Forbid,
                message: "Only tenants can create reviews.",
            },
            Action::ListSearchHistory => Rule {
                roles: Some(&[Role::Tenant]),
                on_denied: OnDenied::EmptyScope,
                message: "Only tenants keep a search history.",
            },
            Action::ListVisitors => Rule {
                roles: Some(&[Role::Landlord]),
                on_denied: OnDenied::EmptyScope,
                message: "Only landlords can list visitors.",
            },
        }
    }
}

pub fn authorize(action: Action, role: Role) -> CoreResult<Scope> {
    let rule = action.rule();
    let allowed = rule.roles.map_or(true, |roles| roles.contains(&role));

    if allowed {
        return Ok(Scope::Granted(role));
    }

    match rule.on_denied {
        OnDenied::Forbid => Err(CoreError::PermissionDenied(rule.message.to_string())),
        OnDenied::EmptyScope => Ok(Scope::Empty),
    }
}

/// Ownership half of the update/delete estate rule.
pub fn ensure_owner(action: Action, owner: UserId, caller: UserId) -> CoreResult<()> {
    if owner == caller {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied(action.rule().message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_estate_is_landlord_only() {
        assert_eq!(
            authorize(Action::CreateEstate, Role::Landlord).unwrap(),
            Scope::Granted(Role::Landlord)
        );
        for role in [Role::Tenant, Role::Root] {
            let err = authorize(Action::CreateEstate, role).unwrap_err();
            assert!(matches!(err, CoreError::PermissionDenied(_)));
        }
    }

    #[test]
    fn test_update_estate_admits_any_role_then_checks_owner() {
        for role in [Role::Tenant, Role::Root, Role::Landlord] {
            assert!(authorize(Action::UpdateEstate, role).is_ok());
        }
        assert!(ensure_owner(Action::UpdateEstate, 7, 7).is_ok());
        let err = ensure_owner(Action::DeleteEstate, 7, 8).unwrap_err();
        assert_eq!(err.to_string(), "You are not the owner of this estate.");
    }

    #[test]
    fn test_scoped_listings_degrade_to_empty() {
        assert_eq!(authorize(Action::ListSearchHistory, Role::Landlord).unwrap(), Scope::Empty);
        assert_eq!(authorize(Action::ListVisitors, Role::Tenant).unwrap(), Scope::Empty);
        assert_eq!(authorize(Action::RetrieveBooking, Role::Root).unwrap(), Scope::Empty);
        assert_eq!(
            authorize(Action::RetrieveBooking, Role::Landlord).unwrap(),
            Scope::Granted(Role::Landlord)
        );
    }

    #[test]
    fn test_reviews_and_bookings_are_tenant_only() {
        for action in [Action::CreateBooking, Action::CreateReview] {
            assert!(authorize(action, Role::Tenant).is_ok());
            assert!(authorize(action, Role::Landlord).is_err());
            assert!(authorize(action, Role::Root).is_err());
        }
    }
}
