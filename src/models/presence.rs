use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Role;

/// Attendance status. The wire strings (`present`, `excused`, `sick`,
/// `noshow`) are stable and match the SQL CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PresenceStatus {
    Present,
    Excused,
    Sick,
    NoShow,
}

/// One attendance mark. At most one row exists per
/// (enrollment_id, schedule_date); repeated writes for the same pair
/// update the row in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PresenceRecord {
    pub id: String,
    pub enrollment_id: String,
    pub schedule_date: NaiveDate,
    pub status: PresenceStatus,
    pub lateness_minutes: i64,
    pub recorded_at: String,
}

/// The authenticated caller, as established by the boundary layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSetEntry {
    pub student_id: String,
    pub status: PresenceStatus,
    pub lateness_minutes: i64,
}

/// Presence write request. The variant is declared explicitly by the
/// caller rather than inferred from the payload shape, so a student
/// cannot reach the instructor path by submitting an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenceRequest {
    /// A student marks themselves present for today's meeting.
    SelfCheckIn,
    /// An instructor sets status and lateness for several students on
    /// one scheduled date.
    BulkSet {
        schedule_date: NaiveDate,
        entries: Vec<BulkSetEntry>,
    },
}
