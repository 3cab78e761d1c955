use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Administrator,
}

/// The link between a person and a class. There is exactly one enrollment
/// per person per class; everything a person may do within a class is
/// scoped by it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub class_id: String,
    pub person_id: String,
    pub role: Role,
}
