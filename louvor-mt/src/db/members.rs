//! Membership lookups against the `ministry_members` table

use futures::future::BoxFuture;
use louvor_common::Result;
use sqlx::SqlitePool;

use crate::access::MembershipCheck;

/// [`MembershipCheck`] backed by the shared database
#[derive(Clone)]
pub struct DbMembership {
    pool: SqlitePool,
}

impl DbMembership {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MembershipCheck for DbMembership {
    fn is_member<'a>(&'a self, ministry_id: &'a str, user_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM ministry_members WHERE ministry_id = ? AND user_id = ?",
            )
            .bind(ministry_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

            Ok(count > 0)
        })
    }
}
