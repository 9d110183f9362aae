//! Weekly schedule repository.

use domain::models::SlotInput;
use sqlx::PgPool;
use uuid::Uuid;

use super::lock_professional;
use crate::entities::ScheduleSlotEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, professional_id: Uuid) -> Result<Vec<ScheduleSlotEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_schedule_slots");
        let result = sqlx::query_as::<_, ScheduleSlotEntity>(
            r#"
            SELECT id, professional_id, weekday, start_time, end_time
            FROM schedule_slots
            WHERE professional_id = $1
            ORDER BY weekday, start_time
            "#,
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replaces every slot of the professional in one transaction.
    pub async fn replace(
        &self,
        professional_id: Uuid,
        slots: &[SlotInput],
    ) -> Result<Vec<ScheduleSlotEntity>, sqlx::Error> {
        let timer = QueryTimer::new("replace_schedule_slots");
        let mut tx = self.pool.begin().await?;

        if !lock_professional(&mut tx, professional_id).await? {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("DELETE FROM schedule_slots WHERE professional_id = $1")
            .bind(professional_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(slots.len());
        for slot in slots {
            let row = sqlx::query_as::<_, ScheduleSlotEntity>(
                r#"
                INSERT INTO schedule_slots (professional_id, weekday, start_time, end_time)
                VALUES ($1, $2, $3, $4)
                RETURNING id, professional_id, weekday, start_time, end_time
                "#,
            )
            .bind(professional_id)
            .bind(slot.weekday)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        timer.record();
        Ok(stored)
    }
}
