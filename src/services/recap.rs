use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    ClassMember, ClassRecap, ClassRecapRow, PresenceRecord, RecapEntry, Role, StudentClassRecap,
    StudentMark, StudentRecap,
};
use crate::schedule;

/// Builds recap views by joining each class's generated meeting dates
/// with the stored presence records. Nothing here is persisted; every
/// view is computed freshly from the store.
pub struct RecapAggregator {
    db: SqlitePool,
}

impl RecapAggregator {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// A date with no record stays unmarked (null status and lateness),
    /// which is not the same as an explicit noshow. An unknown or
    /// unenrolled student id yields an empty recap.
    pub async fn get_student_recap(&self, student_id: &str) -> Result<StudentRecap, AppError> {
        let enrollments: Vec<_> =
            repository::list_enrollments_by_person(&self.db, student_id)
                .await?
                .into_iter()
                .filter(|e| e.role == Role::Student)
                .collect();

        let enrollment_ids: Vec<String> = enrollments.iter().map(|e| e.id.clone()).collect();
        let records =
            repository::find_presence_by_enrollment_ids(&self.db, &enrollment_ids).await?;

        let accumulated_lateness = records.iter().map(|r| r.lateness_minutes).sum();
        let by_key = index_records(records);

        let class_ids: Vec<String> = enrollments.iter().map(|e| e.class_id.clone()).collect();
        let classes: HashMap<String, _> =
            repository::find_classes_by_ids(&self.db, &class_ids)
                .await?
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect();

        let mut per_class = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let class = classes.get(&enrollment.class_id).ok_or_else(|| {
                AppError::NotFound(format!("class {} does not exist", enrollment.class_id))
            })?;

            let recap = schedule::term_occurrences(class.activation_date, class.weekday)
                .into_iter()
                .map(|date| {
                    let record = by_key.get(&(enrollment.id.clone(), date));
                    RecapEntry {
                        schedule_date: date,
                        status: record.map(|r| r.status),
                        lateness_minutes: record.map(|r| r.lateness_minutes),
                    }
                })
                .collect();

            per_class.push(StudentClassRecap {
                class_id: class.id.clone(),
                class_name: class.name.clone(),
                recap,
            });
        }

        Ok(StudentRecap {
            accumulated_lateness,
            per_class,
        })
    }

    /// One row per generated date, each carrying exactly one mark per
    /// currently enrolled student.
    pub async fn get_class_recap(&self, class_id: &str) -> Result<ClassRecap, AppError> {
        let class = repository::find_class_by_id(&self.db, class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("class {class_id} does not exist")))?;

        let students: Vec<_> = repository::list_enrollments_by_class(&self.db, class_id)
            .await?
            .into_iter()
            .filter(|e| e.role == Role::Student)
            .collect();

        let by_key = index_records(repository::find_presence_by_class(&self.db, class_id).await?);

        let recap = schedule::term_occurrences(class.activation_date, class.weekday)
            .into_iter()
            .map(|date| ClassRecapRow {
                schedule_date: date,
                data: students
                    .iter()
                    .map(|e| {
                        let record = by_key.get(&(e.id.clone(), date));
                        StudentMark {
                            student_id: e.person_id.clone(),
                            status: record.map(|r| r.status),
                            lateness_minutes: record.map(|r| r.lateness_minutes),
                        }
                    })
                    .collect(),
            })
            .collect();

        let members = students
            .into_iter()
            .map(|e| ClassMember {
                enrollment_id: e.id,
                student_id: e.person_id,
            })
            .collect();

        Ok(ClassRecap { members, recap })
    }
}

fn index_records(records: Vec<PresenceRecord>) -> HashMap<(String, NaiveDate), PresenceRecord> {
    records
        .into_iter()
        .map(|r| ((r.enrollment_id.clone(), r.schedule_date), r))
        .collect()
}
