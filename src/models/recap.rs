use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::PresenceStatus;

/// One expected meeting date joined with the stored record, if any.
/// `None` means "unmarked" and is distinct from an explicit `noshow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapEntry {
    pub schedule_date: NaiveDate,
    pub status: Option<PresenceStatus>,
    pub lateness_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentClassRecap {
    pub class_id: String,
    pub class_name: String,
    pub recap: Vec<RecapEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecap {
    pub accumulated_lateness: i64,
    pub per_class: Vec<StudentClassRecap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMember {
    pub enrollment_id: String,
    pub student_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentMark {
    pub student_id: String,
    pub status: Option<PresenceStatus>,
    pub lateness_minutes: Option<i64>,
}

/// One expected meeting date with a mark (possibly unmarked) for every
/// enrolled student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecapRow {
    pub schedule_date: NaiveDate,
    pub data: Vec<StudentMark>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecap {
    pub members: Vec<ClassMember>,
    pub recap: Vec<ClassRecapRow>,
}
