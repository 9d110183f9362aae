//! Weekly schedule slots of a professional.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Maximum number of slots a professional can publish.
pub const MAX_SLOTS: usize = 42;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleSlot {
    pub id: Uuid,
    pub professional_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Slot as submitted by the professional.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq)]
pub struct SlotInput {
    #[validate(range(min = 0, max = 6, message = "Weekday must be between 0 and 6"))]
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceScheduleRequest {
    #[validate(length(max = 42, message = "Too many schedule slots"), nested)]
    pub slots: Vec<SlotInput>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Slot {index}: start time must be before end time")]
    InvalidRange { index: usize },

    #[error("Slot {index}: weekday must be between 0 and 6")]
    InvalidWeekday { index: usize },

    #[error("Slots {first} and {second} overlap on the same weekday")]
    Overlap { first: usize, second: usize },

    #[error("Too many schedule slots")]
    TooMany,
}

/// Checks ranges and overlaps and returns the slots ordered by weekday and start.
///
/// Slots that merely touch (`09:00-12:00` and `12:00-15:00`) do not overlap.
pub fn validate_slots(slots: &[SlotInput]) -> Result<Vec<SlotInput>, ScheduleError> {
    if slots.len() > MAX_SLOTS {
        return Err(ScheduleError::TooMany);
    }

    for (index, slot) in slots.iter().enumerate() {
        if !(0..=6).contains(&slot.weekday) {
            return Err(ScheduleError::InvalidWeekday { index });
        }
        if slot.start_time >= slot.end_time {
            return Err(ScheduleError::InvalidRange { index });
        }
    }

    let mut indexed: Vec<(usize, SlotInput)> = slots.iter().copied().enumerate().collect();
    indexed.sort_by_key(|(_, s)| (s.weekday, s.start_time));

    for pair in indexed.windows(2) {
        let (i, a) = pair[0];
        let (j, b) = pair[1];
        if a.weekday == b.weekday && b.start_time < a.end_time {
            return Err(ScheduleError::Overlap {
                first: i.min(j),
                second: i.max(j),
            });
        }
    }

    Ok(indexed.into_iter().map(|(_, s)| s).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(weekday: i16, start: &str, end: &str) -> SlotInput {
        SlotInput {
            weekday,
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    #[test]
    fn test_valid_schedule_is_sorted() {
        let slots = vec![
            slot(3, "14:00", "18:00"),
            slot(1, "08:00", "12:00"),
            slot(1, "12:00", "16:00"),
        ];
        let sorted = validate_slots(&slots).unwrap();
        assert_eq!(sorted[0], slots[1]);
        assert_eq!(sorted[1], slots[2]);
        assert_eq!(sorted[2], slots[0]);
    }

    #[test]
    fn test_start_must_precede_end() {
        let slots = vec![slot(2, "09:00", "09:00")];
        assert_eq!(
            validate_slots(&slots),
            Err(ScheduleError::InvalidRange { index: 0 })
        );
    }

    #[test]
    fn test_overlap_on_same_weekday_rejected() {
        let slots = vec![
            slot(5, "08:00", "12:00"),
            slot(2, "08:00", "12:00"),
            slot(5, "11:30", "13:00"),
        ];
        assert_eq!(
            validate_slots(&slots),
            Err(ScheduleError::Overlap { first: 0, second: 2 })
        );
    }

    #[test]
    fn test_weekday_out_of_range() {
        let slots = vec![slot(7, "08:00", "12:00")];
        assert_eq!(
            validate_slots(&slots),
            Err(ScheduleError::InvalidWeekday { index: 0 })
        );
    }

    #[test]
    fn test_empty_schedule_allowed() {
        assert!(validate_slots(&[]).unwrap().is_empty());
    }
}
