use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use crate::clock::Clock;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    Actor, BulkSetEntry, ClassInfo, PresenceRecord, PresenceRequest, PresenceStatus, Role,
};
use crate::schedule;

/// Validates presence writes against the caller's role and performs the
/// idempotent upserts. Students may only check themselves in as present
/// for today; instructors may set status and lateness for any enrolled
/// student on a scheduled date, all-or-nothing per batch.
pub struct PresenceReconciler {
    db: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl PresenceReconciler {
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Returns the written records: one for a self check-in, one per
    /// entry for an instructor batch.
    pub async fn set_presence(
        &self,
        class_id: &str,
        actor: &Actor,
        request: PresenceRequest,
    ) -> Result<Vec<PresenceRecord>, AppError> {
        let class = repository::find_class_by_id(&self.db, class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("class {class_id} does not exist")))?;

        match (actor.role, request) {
            (Role::Student, PresenceRequest::SelfCheckIn) => {
                let record = self.self_check_in(&class, actor).await?;
                Ok(vec![record])
            }
            (Role::Instructor, PresenceRequest::BulkSet {
                schedule_date,
                entries,
            }) => self.bulk_set(&class, actor, schedule_date, entries).await,
            (Role::Student, PresenceRequest::BulkSet { .. }) => Err(AppError::Forbidden(
                "students may only check themselves in".to_string(),
            )),
            (_, PresenceRequest::SelfCheckIn) => Err(AppError::Forbidden(
                "self check-in is limited to students".to_string(),
            )),
            (Role::Administrator, PresenceRequest::BulkSet { .. }) => Err(AppError::Forbidden(
                "administrators do not record presence".to_string(),
            )),
        }
    }

    /// Student path: the only permitted transition is
    /// any-state -> present with zero lateness, for the caller's own
    /// enrollment, on today's meeting. The date comes from the injected
    /// clock, never from the payload.
    async fn self_check_in(
        &self,
        class: &ClassInfo,
        actor: &Actor,
    ) -> Result<PresenceRecord, AppError> {
        let enrollment =
            repository::find_enrollment(&self.db, &actor.id, &class.id, Role::Student)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "person {} is not enrolled in class {} as a student",
                        actor.id, class.id
                    ))
                })?;

        let today = self.clock.today();
        require_scheduled(class, today)?;

        let record = repository::upsert_presence(
            &self.db,
            &enrollment.id,
            today,
            PresenceStatus::Present,
            0,
        )
        .await?;

        info!(
            "self check-in: person {} class {} date {}",
            actor.id, class.id, today
        );
        Ok(record)
    }

    /// Instructor path: every entry is validated before any write, then
    /// all writes run in one transaction. A batch with one bad entry
    /// leaves no visible writes at all.
    async fn bulk_set(
        &self,
        class: &ClassInfo,
        actor: &Actor,
        schedule_date: NaiveDate,
        entries: Vec<BulkSetEntry>,
    ) -> Result<Vec<PresenceRecord>, AppError> {
        repository::find_enrollment(&self.db, &actor.id, &class.id, Role::Instructor)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!(
                    "person {} is not an instructor of class {}",
                    actor.id, class.id
                ))
            })?;

        if entries.is_empty() {
            return Err(AppError::Validation("entries must not be empty".to_string()));
        }
        require_scheduled(class, schedule_date)?;

        let mut resolved = Vec::with_capacity(entries.len());
        for entry in &entries {
            if entry.lateness_minutes < 0 {
                return Err(AppError::Validation(format!(
                    "negative lateness for student {}",
                    entry.student_id
                )));
            }
            let enrollment =
                repository::find_enrollment(&self.db, &entry.student_id, &class.id, Role::Student)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "student {} is not enrolled in class {}",
                            entry.student_id, class.id
                        ))
                    })?;
            resolved.push((enrollment, entry.status, entry.lateness_minutes));
        }

        let mut tx = self.db.begin().await?;
        let mut records = Vec::with_capacity(resolved.len());
        for (enrollment, status, lateness) in &resolved {
            let record =
                repository::upsert_presence(&mut *tx, &enrollment.id, schedule_date, *status, *lateness)
                    .await?;
            records.push(record);
        }
        tx.commit().await?;

        info!(
            "bulk presence set: instructor {} class {} date {} entries {}",
            actor.id,
            class.id,
            schedule_date,
            records.len()
        );
        Ok(records)
    }
}

/// Off-schedule dates are rejected rather than stored as ad-hoc makeup
/// sessions, so every record lines up with a generated occurrence.
fn require_scheduled(class: &ClassInfo, date: NaiveDate) -> Result<(), AppError> {
    let dates = schedule::term_occurrences(class.activation_date, class.weekday);
    if dates.contains(&date) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{} is not a scheduled meeting date of class {}",
            date, class.id
        )))
    }
}
