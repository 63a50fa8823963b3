//! Ministry membership check
//!
//! Membership policy lives outside this service. Mutations on a song that
//! belongs to a ministry ask a [`MembershipCheck`] whether the caller is a
//! member before touching the repository.

use futures::future::BoxFuture;
use louvor_common::{Error, Result};

/// Header carrying the authenticated user id, set by the auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Answers "is `user_id` a member of `ministry_id`?"
pub trait MembershipCheck: Send + Sync {
    fn is_member<'a>(&'a self, ministry_id: &'a str, user_id: &'a str) -> BoxFuture<'a, Result<bool>>;
}

/// Fixed answer for every pair
pub struct StaticMembership {
    allow: bool,
}

impl StaticMembership {
    pub fn allow_all() -> Self {
        Self { allow: true }
    }

    pub fn deny_all() -> Self {
        Self { allow: false }
    }
}

impl MembershipCheck for StaticMembership {
    fn is_member<'a>(&'a self, _ministry_id: &'a str, _user_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        let allow = self.allow;
        Box::pin(async move { Ok(allow) })
    }
}

/// Require membership for ministry-scoped songs
///
/// Songs without a ministry are not scoped and pass. A scoped song with no
/// caller identity is denied.
pub async fn authorize(
    check: &dyn MembershipCheck,
    ministry_id: Option<&str>,
    user_id: Option<&str>,
) -> Result<()> {
    let Some(ministry_id) = ministry_id else {
        return Ok(());
    };

    let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) else {
        return Err(Error::PermissionDenied(format!(
            "Authentication required for ministry {}",
            ministry_id
        )));
    };

    if check.is_member(ministry_id, user_id).await? {
        Ok(())
    } else {
        tracing::warn!(ministry_id, user_id, "Membership check denied");
        Err(Error::PermissionDenied(format!(
            "User {} is not a member of ministry {}",
            user_id, ministry_id
        )))
    }
}
