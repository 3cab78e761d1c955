use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A class together with its weekly meeting schedule. `weekday` is
/// Sunday-based (0 = Sunday .. 6 = Saturday); `activation_date` anchors
/// the term and is the earliest possible meeting date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub activation_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClass {
    pub name: String,
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub activation_date: NaiveDate,
}
