//! Building blocks shared by the rule modules.

use super::engine::Actor;
use crate::error::{Error, Result};

/// True when every condition holds. Stops at the first false or error.
pub fn and(conditions: impl IntoIterator<Item = Result<bool>>) -> Result<bool> {
    for condition in conditions {
        if !condition? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True when any condition holds. Stops at the first true or error.
pub fn or(conditions: impl IntoIterator<Item = Result<bool>>) -> Result<bool> {
    for condition in conditions {
        if condition? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether the actor and the target belong to the same team.
#[must_use]
pub fn is_team_model(actor: &Actor<'_>, team_id: &str) -> bool {
    actor.user.team_id == team_id
}

#[must_use]
pub fn is_team_admin(actor: &Actor<'_>, team_id: &str) -> bool {
    is_team_model(actor, team_id) && actor.user.is_admin()
}

/// A same-team user who is neither a viewer nor a guest.
#[must_use]
pub fn is_team_member(actor: &Actor<'_>, team_id: &str) -> bool {
    is_team_model(actor, team_id) && !actor.user.is_viewer() && !actor.user.is_guest()
}

/// Like [`is_team_admin`], but fails with [`Error::AdminRequired`] instead
/// of returning false for a same-team non-admin.
pub fn admin_required(actor: &Actor<'_>, team_id: &str) -> Result<bool> {
    if !is_team_model(actor, team_id) {
        return Ok(false);
    }
    if actor.user.is_admin() {
        Ok(true)
    } else {
        Err(Error::AdminRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_short_circuits_before_errors() {
        assert!(!and([Ok(false), Err(Error::AdminRequired)]).unwrap());
        assert!(and([Ok(true), Ok(true)]).unwrap());
        assert!(matches!(
            and([Ok(true), Err(Error::AdminRequired)]),
            Err(Error::AdminRequired)
        ));
    }

    #[test]
    fn test_or_short_circuits_before_errors() {
        assert!(or([Ok(true), Err(Error::AdminRequired)]).unwrap());
        assert!(!or([Ok(false), Ok(false)]).unwrap());
        assert!(!or(std::iter::empty()).unwrap());
    }
}
