//! Schedule slot entity (database row mapping).

use chrono::NaiveTime;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ScheduleSlotEntity {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<ScheduleSlotEntity> for domain::models::ScheduleSlot {
    fn from(entity: ScheduleSlotEntity) -> Self {
        Self {
            id: entity.id,
            professional_id: entity.professional_id,
            weekday: entity.weekday,
            start_time: entity.start_time,
            end_time: entity.end_time,
        }
    }
}
