//! Event repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::models::event::Event;
use domain::services::store::{EventStore, StoreError};

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;
use crate::repositories::store_error;

/// Repository for event lookups.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an event by its identifier.
    pub async fn find_by_id(&self, event_id: &str) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT * FROM events WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        let entity = self.find_by_id(event_id).await.map_err(store_error)?;
        Ok(entity.map(Event::from))
    }
}
