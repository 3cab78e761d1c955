use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{ClassInfo, Enrollment, NewClass, PresenceRecord, PresenceStatus, Role};

const CLASS_COLUMNS: &str = "id, name, weekday, start_time, end_time, activation_date";
const ENROLLMENT_COLUMNS: &str = "id, class_id, person_id, role";
const PRESENCE_COLUMNS: &str =
    "id, enrollment_id, schedule_date, status, lateness_minutes, recorded_at";

pub async fn insert_class(db: &SqlitePool, req: NewClass) -> Result<ClassInfo, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO classes (id, name, weekday, start_time, end_time, activation_date) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(req.weekday)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(req.activation_date)
    .execute(db)
    .await?;

    Ok(ClassInfo {
        id,
        name: req.name,
        weekday: req.weekday,
        start_time: req.start_time,
        end_time: req.end_time,
        activation_date: req.activation_date,
    })
}

pub async fn find_class_by_id(db: &SqlitePool, id: &str) -> Result<Option<ClassInfo>, sqlx::Error> {
    sqlx::query_as::<_, ClassInfo>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_classes_by_ids(
    db: &SqlitePool,
    ids: &[String],
) -> Result<Vec<ClassInfo>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id IN ("));
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(id);
    }
    sep.push_unseparated(")");

    qb.build_query_as::<ClassInfo>().fetch_all(db).await
}

pub async fn insert_enrollment(
    db: &SqlitePool,
    class_id: &str,
    person_id: &str,
    role: Role,
) -> Result<Enrollment, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO enrollments (id, class_id, person_id, role) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(class_id)
        .bind(person_id)
        .bind(role)
        .execute(db)
        .await?;

    Ok(Enrollment {
        id,
        class_id: class_id.to_string(),
        person_id: person_id.to_string(),
        role,
    })
}

pub async fn find_enrollment(
    db: &SqlitePool,
    person_id: &str,
    class_id: &str,
    role: Role,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
         WHERE person_id = ? AND class_id = ? AND role = ?"
    ))
    .bind(person_id)
    .bind(class_id)
    .bind(role)
    .fetch_optional(db)
    .await
}

pub async fn list_enrollments_by_class(
    db: &SqlitePool,
    class_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE class_id = ? ORDER BY id"
    ))
    .bind(class_id)
    .fetch_all(db)
    .await
}

pub async fn list_enrollments_by_person(
    db: &SqlitePool,
    person_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE person_id = ? ORDER BY id"
    ))
    .bind(person_id)
    .fetch_all(db)
    .await
}

/// Atomic find-or-insert for one attendance mark. The unique constraint
/// on (enrollment_id, schedule_date) plus ON CONFLICT keeps the row
/// count at one under concurrent callers; later values supersede
/// earlier ones. Takes any executor so batch writes can run inside a
/// transaction.
pub async fn upsert_presence<'e, E>(
    executor: E,
    enrollment_id: &str,
    schedule_date: NaiveDate,
    status: PresenceStatus,
    lateness_minutes: i64,
) -> Result<PresenceRecord, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query_as::<_, PresenceRecord>(&format!(
        "INSERT INTO presence_records \
             (id, enrollment_id, schedule_date, status, lateness_minutes, recorded_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT (enrollment_id, schedule_date) DO UPDATE SET \
             status = excluded.status, \
             lateness_minutes = excluded.lateness_minutes, \
             recorded_at = excluded.recorded_at \
         RETURNING {PRESENCE_COLUMNS}"
    ))
    .bind(id)
    .bind(enrollment_id)
    .bind(schedule_date)
    .bind(status)
    .bind(lateness_minutes)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn find_presence_by_enrollment_and_date(
    db: &SqlitePool,
    enrollment_id: &str,
    schedule_date: NaiveDate,
) -> Result<Option<PresenceRecord>, sqlx::Error> {
    sqlx::query_as::<_, PresenceRecord>(&format!(
        "SELECT {PRESENCE_COLUMNS} FROM presence_records \
         WHERE enrollment_id = ? AND schedule_date = ?"
    ))
    .bind(enrollment_id)
    .bind(schedule_date)
    .fetch_optional(db)
    .await
}

pub async fn find_presence_by_enrollment_ids(
    db: &SqlitePool,
    enrollment_ids: &[String],
) -> Result<Vec<PresenceRecord>, sqlx::Error> {
    if enrollment_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {PRESENCE_COLUMNS} FROM presence_records WHERE enrollment_id IN ("
    ));
    let mut sep = qb.separated(", ");
    for id in enrollment_ids {
        sep.push_bind(id);
    }
    sep.push_unseparated(")");
    qb.push(" ORDER BY schedule_date");

    qb.build_query_as::<PresenceRecord>().fetch_all(db).await
}

pub async fn find_presence_by_class(
    db: &SqlitePool,
    class_id: &str,
) -> Result<Vec<PresenceRecord>, sqlx::Error> {
    sqlx::query_as::<_, PresenceRecord>(
        "SELECT p.id, p.enrollment_id, p.schedule_date, p.status, p.lateness_minutes, \
                p.recorded_at \
         FROM presence_records p \
         JOIN enrollments e ON e.id = p.enrollment_id \
         WHERE e.class_id = ? \
         ORDER BY p.schedule_date",
    )
    .bind(class_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveTime, Weekday};

    async fn setup_test_db() -> SqlitePool {
        // One connection only: every connection to sqlite::memory: gets
        // its own database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn algebra_on_wednesdays() -> NewClass {
        NewClass {
            name: "Linear Algebra".to_string(),
            weekday: 3,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 40, 0).unwrap(),
            activation_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_class() {
        let pool = setup_test_db().await;

        let class = insert_class(&pool, algebra_on_wednesdays())
            .await
            .expect("Failed to insert class");

        let found = find_class_by_id(&pool, &class.id)
            .await
            .expect("Failed to query class")
            .expect("Class not found");
        assert_eq!(found.name, "Linear Algebra");
        assert_eq!(found.weekday, 3);
        assert_eq!(found.activation_date.weekday(), Weekday::Mon);
    }

    #[tokio::test]
    async fn test_enrollment_lookup_is_role_scoped() {
        let pool = setup_test_db().await;
        let class = insert_class(&pool, algebra_on_wednesdays()).await.unwrap();

        insert_enrollment(&pool, &class.id, "student-1", Role::Student)
            .await
            .expect("Failed to enroll");

        let as_student = find_enrollment(&pool, "student-1", &class.id, Role::Student)
            .await
            .unwrap();
        assert!(as_student.is_some());

        let as_instructor = find_enrollment(&pool, "student-1", &class.id, Role::Instructor)
            .await
            .unwrap();
        assert!(as_instructor.is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_enrollment_and_date() {
        let pool = setup_test_db().await;
        let class = insert_class(&pool, algebra_on_wednesdays()).await.unwrap();
        let enrollment = insert_enrollment(&pool, &class.id, "student-1", Role::Student)
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

        let first = upsert_presence(&pool, &enrollment.id, date, PresenceStatus::Present, 0)
            .await
            .expect("First upsert failed");
        let second = upsert_presence(&pool, &enrollment.id, date, PresenceStatus::Sick, 15)
            .await
            .expect("Second upsert failed");

        // Same row, superseded values.
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, PresenceStatus::Sick);
        assert_eq!(second.lateness_minutes, 15);

        let all = find_presence_by_enrollment_ids(&pool, &[enrollment.id.clone()])
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }
}
