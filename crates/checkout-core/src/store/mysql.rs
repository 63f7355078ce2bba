//! MySQL purchase store
//!
//! Expects `purchased_courses(user_id, course_id)` with a unique key over
//! both columns so repeated fulfilment is a no-op.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::{PurchaseRecordStore, in_request_order};
use crate::error::Result;
use crate::model::{CourseId, UserId};

pub struct MySqlPurchaseStore {
    pool: MySqlPool,
}

impl MySqlPurchaseStore {
    pub const fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connect with a small default pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PurchaseRecordStore for MySqlPurchaseStore {
    async fn purchased_among(
        &self,
        user: &UserId,
        course_ids: &[CourseId],
    ) -> Result<Vec<CourseId>> {
        // `IN ()` is not valid SQL
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<MySql>::new(
            "SELECT CAST(course_id AS SIGNED) FROM purchased_courses WHERE user_id = ",
        );
        query.push_bind(user.as_str());
        query.push(" AND course_id IN (");
        let mut ids = query.separated(", ");
        for id in course_ids {
            ids.push_bind(id.0);
        }
        ids.push_unseparated(")");

        let rows: Vec<(i64,)> = query.build_query_as().fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(user_id = %user, error = %e, "Purchased course lookup failed");
            e
        })?;

        let owned: HashSet<CourseId> = rows.into_iter().map(|(id,)| CourseId(id)).collect();
        Ok(in_request_order(course_ids, |id| owned.contains(&id)))
    }

    async fn record_purchases(&self, user: &UserId, course_ids: &[CourseId]) -> Result<()> {
        if course_ids.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<MySql>::new(
            "INSERT IGNORE INTO purchased_courses (user_id, course_id) ",
        );
        query.push_values(course_ids, |mut row, id| {
            row.push_bind(user.as_str()).push_bind(id.0);
        });
        query.build().execute(&self.pool).await?;

        tracing::info!(user_id = %user, count = course_ids.len(), "Recorded course purchases");
        Ok(())
    }
}
