//! Enrollment state changes: enroll, drop, grade recording, and the GPA
//! aggregate. Every write here runs as one IMMEDIATE transaction on the
//! shared connection, so the seat counter and the ledger row it mirrors
//! can never drift apart.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

use super::{parse_datetime, parse_time, parse_uuid, Database};
use crate::grading;
use crate::models::*;

/// Outcome of an enrollment operation that did not succeed.
///
/// All variants except `Internal` are ordinary business outcomes the API
/// maps to client-facing status codes. `Internal` carries its source chain
/// for logging and is never shown to callers verbatim.
#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("Not found")]
    NotFound,
    #[error("Already enrolled in this section")]
    AlreadyEnrolled,
    #[error("Schedule conflict with an existing enrollment")]
    ScheduleConflict,
    #[error("Section is full")]
    SectionFull,
    #[error("Not authorized to grade this enrollment")]
    Forbidden,
    #[error("Enrollment state does not allow this change")]
    InvalidState,
    #[error("Internal enrollment error")]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for EnrollError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl Database {
    /// Enroll a student into a section.
    ///
    /// Checks run in a fixed order inside a single transaction: duplicate
    /// pair, section existence, schedule conflict, then the seat
    /// reservation. The reservation is one conditional UPDATE, so two
    /// racing enrollments can never both take the last seat, and an insert
    /// failure after it rolls the seat back with the transaction.
    ///
    /// A dropped or graded row still counts as the pair existing: one
    /// enrollment per (student, section), for the lifetime of both.
    pub fn enroll(&self, student_id: Uuid, section_id: Uuid) -> Result<Enrollment, EnrollError> {
        self.with_retry(|conn| enroll_tx(conn, student_id, section_id))
    }

    /// Record a final grade and move the enrollment to a graded outcome.
    ///
    /// Only the instructor of record for the enrollment's section or an
    /// admin may grade. The current status must not be terminal and the
    /// requested status must be one grading can produce (`passed`,
    /// `failed`, `retake_pending`). Grade points are always derived from
    /// the letter via the grading policy; when the letter is omitted it is
    /// derived from the numeric score first. Leaving an active status
    /// releases the seat.
    pub fn record_grade(
        &self,
        enrollment_id: Uuid,
        input: RecordGradeInput,
        actor: Actor,
    ) -> Result<Enrollment, EnrollError> {
        self.with_retry(|conn| record_grade_tx(conn, enrollment_id, &input, actor))
    }

    /// Drop an active enrollment, releasing its seat.
    ///
    /// The row is kept with `status = dropped` (and still blocks
    /// re-enrollment in the same section). Grade fields are untouched.
    /// Dropping a row that is not active is `InvalidState`.
    pub fn drop_enrollment(
        &self,
        student_id: Uuid,
        section_id: Uuid,
    ) -> Result<Enrollment, EnrollError> {
        self.with_retry(|conn| drop_enrollment_tx(conn, student_id, section_id))
    }

    pub fn get_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, student_id, section_id, status, numeric_grade, final_grade, grade_points, enrolled_at, updated_at
             FROM enrollments WHERE id = ?",
        )?;

        let enrollment = stmt
            .query_row([id.to_string()], enrollment_from_row)
            .optional()?;
        Ok(enrollment)
    }

    /// Cumulative GPA: sum of grade points over sum of course credits,
    /// across `passed` enrollments only. 0.0 when nothing has been passed.
    /// Unrounded; display rounding happens at the API boundary.
    pub fn student_gpa(&self, student_id: Uuid) -> Result<f64> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let (points, credits): (Option<f64>, Option<i64>) = conn.query_row(
            "SELECT SUM(e.grade_points), SUM(c.credits)
             FROM enrollments e
             JOIN sections sec ON e.section_id = sec.id
             JOIN courses c ON sec.course_id = c.id
             WHERE e.student_id = ? AND e.status = 'passed'",
            [student_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        match (points, credits) {
            (Some(points), Some(credits)) if credits > 0 => Ok(points / credits as f64),
            _ => Ok(0.0),
        }
    }

    /// Run a transactional operation, retrying once when SQLite reports a
    /// competing writer (another connection holds the file lock). A second
    /// failure surfaces as the `Internal` it already is.
    fn with_retry<T>(
        &self,
        op: impl Fn(&mut Connection) -> Result<T, EnrollError>,
    ) -> Result<T, EnrollError> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        match op(&mut conn) {
            Err(err) if is_busy(&err) => op(&mut conn),
            result => result,
        }
    }
}

fn enroll_tx(
    conn: &mut Connection,
    student_id: Uuid,
    section_id: Uuid,
) -> Result<Enrollment, EnrollError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let pair_exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM enrollments WHERE student_id = ? AND section_id = ?",
            [student_id.to_string(), section_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if pair_exists.is_some() {
        return Err(EnrollError::AlreadyEnrolled);
    }

    let term_id: Option<String> = tx
        .query_row(
            "SELECT term_id FROM sections WHERE id = ?",
            [section_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let Some(term_id) = term_id else {
        return Err(EnrollError::NotFound);
    };

    if has_schedule_conflict(&tx, student_id, section_id, &term_id)? {
        return Err(EnrollError::ScheduleConflict);
    }

    // The seat check and increment are one statement; 0 rows means the
    // section was full under this transaction's view.
    let reserved = tx.execute(
        "UPDATE sections SET seats_taken = seats_taken + 1 WHERE id = ? AND seats_taken < capacity",
        [section_id.to_string()],
    )?;
    if reserved == 0 {
        return Err(EnrollError::SectionFull);
    }

    let enrollment = Enrollment {
        id: Uuid::new_v4(),
        student_id,
        section_id,
        status: EnrollmentStatus::Enrolled,
        numeric_grade: None,
        final_grade: None,
        grade_points: None,
        enrolled_at: Utc::now(),
        updated_at: Utc::now(),
    };

    tx.execute(
        "INSERT INTO enrollments (id, student_id, section_id, status, enrolled_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            enrollment.id.to_string(),
            student_id.to_string(),
            section_id.to_string(),
            enrollment.status.as_str(),
            enrollment.enrolled_at.to_rfc3339(),
            enrollment.updated_at.to_rfc3339(),
        ),
    )?;

    tx.commit()?;
    Ok(enrollment)
}

fn record_grade_tx(
    conn: &mut Connection,
    enrollment_id: Uuid,
    input: &RecordGradeInput,
    actor: Actor,
) -> Result<Enrollment, EnrollError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let found: Option<(Enrollment, String)> = tx
        .query_row(
            "SELECT e.id, e.student_id, e.section_id, e.status, e.numeric_grade, e.final_grade,
                    e.grade_points, e.enrolled_at, e.updated_at, i.user_id
             FROM enrollments e
             JOIN sections sec ON e.section_id = sec.id
             JOIN instructors i ON sec.instructor_id = i.id
             WHERE e.id = ?",
            [enrollment_id.to_string()],
            |row| Ok((enrollment_from_row(row)?, row.get::<_, String>(9)?)),
        )
        .optional()?;
    let Some((enrollment, instructor_user_id)) = found else {
        return Err(EnrollError::NotFound);
    };

    if !actor.is_admin() && actor.user_id != parse_uuid(instructor_user_id) {
        return Err(EnrollError::Forbidden);
    }

    if enrollment.status.is_terminal() || !input.status.is_graded_outcome() {
        return Err(EnrollError::InvalidState);
    }

    let final_grade = match (&input.final_grade, input.numeric_grade) {
        (Some(letter), _) => Some(letter.clone()),
        (None, Some(pct)) => Some(grading::letter_for_percentage(pct).to_string()),
        (None, None) => None,
    };
    let grade_points = final_grade.as_deref().map(grading::points_for);

    // Graded outcomes no longer hold a seat.
    if enrollment.status.is_active() {
        release_seat(&tx, enrollment.section_id)?;
    }

    let now = Utc::now();
    tx.execute(
        "UPDATE enrollments SET status = ?, numeric_grade = ?, final_grade = ?, grade_points = ?, updated_at = ?
         WHERE id = ?",
        (
            input.status.as_str(),
            input.numeric_grade,
            &final_grade,
            grade_points,
            now.to_rfc3339(),
            enrollment_id.to_string(),
        ),
    )?;

    tx.commit()?;
    Ok(Enrollment {
        status: input.status,
        numeric_grade: input.numeric_grade,
        final_grade,
        grade_points,
        updated_at: now,
        ..enrollment
    })
}

fn drop_enrollment_tx(
    conn: &mut Connection,
    student_id: Uuid,
    section_id: Uuid,
) -> Result<Enrollment, EnrollError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let found: Option<Enrollment> = tx
        .query_row(
            "SELECT id, student_id, section_id, status, numeric_grade, final_grade, grade_points, enrolled_at, updated_at
             FROM enrollments WHERE student_id = ? AND section_id = ?",
            [student_id.to_string(), section_id.to_string()],
            enrollment_from_row,
        )
        .optional()?;
    let Some(enrollment) = found else {
        return Err(EnrollError::NotFound);
    };

    if !enrollment.status.is_active() {
        return Err(EnrollError::InvalidState);
    }

    release_seat(&tx, section_id)?;

    let now = Utc::now();
    tx.execute(
        "UPDATE enrollments SET status = ?, updated_at = ? WHERE id = ?",
        (
            EnrollmentStatus::Dropped.as_str(),
            now.to_rfc3339(),
            enrollment.id.to_string(),
        ),
    )?;

    tx.commit()?;
    Ok(Enrollment {
        status: EnrollmentStatus::Dropped,
        updated_at: now,
        ..enrollment
    })
}

/// True iff the student already holds an active enrollment in the same term
/// whose weekly slots overlap the target section's. Runs under the enroll
/// transaction so the answer cannot race with a competing enrollment.
fn has_schedule_conflict(
    conn: &Connection,
    student_id: Uuid,
    section_id: Uuid,
    term_id: &str,
) -> Result<bool, EnrollError> {
    let target_slots = slot_rows(
        conn,
        "SELECT ts.id, ts.day_of_week, ts.start_time, ts.end_time
         FROM section_time_slots sts
         JOIN time_slots ts ON sts.time_slot_id = ts.id
         WHERE sts.section_id = ?",
        [section_id.to_string()],
    )?;
    if target_slots.is_empty() {
        return Ok(false);
    }

    let enrolled_slots = slot_rows(
        conn,
        "SELECT ts.id, ts.day_of_week, ts.start_time, ts.end_time
         FROM enrollments e
         JOIN sections sec ON e.section_id = sec.id
         JOIN section_time_slots sts ON sts.section_id = sec.id
         JOIN time_slots ts ON sts.time_slot_id = ts.id
         WHERE e.student_id = ? AND sec.term_id = ?
           AND e.status IN ('enrolling', 'enrolled')",
        [student_id.to_string(), term_id.to_string()],
    )?;

    Ok(target_slots
        .iter()
        .any(|target| enrolled_slots.iter().any(|held| slots_overlap(target, held))))
}

fn slot_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<TimeSlot>, EnrollError> {
    let mut stmt = conn.prepare(sql)?;
    let slots = stmt
        .query_map(params, |row| {
            Ok(TimeSlot {
                id: parse_uuid(row.get::<_, String>(0)?),
                day: DayOfWeek::from_str(&row.get::<_, String>(1)?).unwrap_or(DayOfWeek::Monday),
                start_time: parse_time(row.get::<_, String>(2)?),
                end_time: parse_time(row.get::<_, String>(3)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(slots)
}

/// Two weekly slots collide when they fall on the same day and their time
/// ranges intersect. Ranges are half-open, so back-to-back slots (one ends
/// exactly when the other starts) do not conflict.
fn slots_overlap(a: &TimeSlot, b: &TimeSlot) -> bool {
    a.day == b.day && a.start_time < b.end_time && b.start_time < a.end_time
}

/// Guarded seat decrement. Zero rows means the counter was already 0 while
/// an active enrollment existed, which the enrollment transactions are
/// supposed to make impossible, so it aborts the transaction rather than
/// letting the counter drift.
fn release_seat(conn: &Connection, section_id: Uuid) -> Result<(), EnrollError> {
    let released = conn.execute(
        "UPDATE sections SET seats_taken = seats_taken - 1 WHERE id = ? AND seats_taken > 0",
        [section_id.to_string()],
    )?;
    if released == 0 {
        return Err(EnrollError::Internal(anyhow::anyhow!(
            "no seat to release for section {section_id}"
        )));
    }
    Ok(())
}

fn enrollment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: parse_uuid(row.get::<_, String>(0)?),
        student_id: parse_uuid(row.get::<_, String>(1)?),
        section_id: parse_uuid(row.get::<_, String>(2)?),
        status: EnrollmentStatus::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(EnrollmentStatus::Enrolled),
        numeric_grade: row.get(4)?,
        final_grade: row.get(5)?,
        grade_points: row.get(6)?,
        enrolled_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn is_busy(err: &EnrollError) -> bool {
    let EnrollError::Internal(source) = err else {
        return false;
    };
    source.chain().any(|cause| {
        cause.downcast_ref::<rusqlite::Error>().is_some_and(|e| {
            matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            )
        })
    })
}
