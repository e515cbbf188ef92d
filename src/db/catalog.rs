//! Catalog reads and administrative writes: departments, terms, courses,
//! time slots, and sections. Enrollment state changes live in
//! [`super::enroll`]; everything here is either reference data or a join
//! view over it.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use super::{parse_date, parse_datetime, parse_time, parse_uuid, Database};
use crate::models::*;

impl Database {
    // ============================================================
    // Department operations
    // ============================================================

    pub fn create_department(&self, code: &str, name: &str) -> Result<Department> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO departments (id, code, name, created_at) VALUES (?, ?, ?, ?)",
            (id.to_string(), code, name, now.to_rfc3339()),
        )?;

        Ok(Department {
            id,
            code: code.to_string(),
            name: name.to_string(),
            created_at: now,
        })
    }

    pub fn get_departments(&self) -> Result<Vec<Department>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt =
            conn.prepare("SELECT id, code, name, created_at FROM departments ORDER BY code")?;

        let departments = stmt
            .query_map([], |row| {
                Ok(Department {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    code: row.get(1)?,
                    name: row.get(2)?,
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(departments)
    }

    // ============================================================
    // Term operations
    // ============================================================

    pub fn create_term(&self, input: CreateTermInput) -> Result<Term> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO terms (id, code, name, start_date, end_date, registration_start, registration_end, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
            (
                id.to_string(),
                &input.code,
                &input.name,
                input.start_date.to_string(),
                input.end_date.to_string(),
                input.registration_start.map(|d| d.to_string()),
                input.registration_end.map(|d| d.to_string()),
            ),
        )?;

        Ok(Term {
            id,
            code: input.code,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            registration_start: input.registration_start,
            registration_end: input.registration_end,
            is_active: false,
        })
    }

    pub fn get_terms(&self) -> Result<Vec<Term>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, code, name, start_date, end_date, registration_start, registration_end, is_active
             FROM terms ORDER BY start_date DESC",
        )?;

        let terms = stmt
            .query_map([], |row| {
                Ok(Term {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    code: row.get(1)?,
                    name: row.get(2)?,
                    start_date: parse_date(row.get::<_, String>(3)?),
                    end_date: parse_date(row.get::<_, String>(4)?),
                    registration_start: row.get::<_, Option<String>>(5)?.map(parse_date),
                    registration_end: row.get::<_, Option<String>>(6)?.map(parse_date),
                    is_active: row.get::<_, i32>(7)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    pub fn get_active_term(&self) -> Result<Option<Term>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, code, name, start_date, end_date, registration_start, registration_end, is_active
             FROM terms WHERE is_active = 1",
        )?;

        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Term {
                id: parse_uuid(row.get::<_, String>(0)?),
                code: row.get(1)?,
                name: row.get(2)?,
                start_date: parse_date(row.get::<_, String>(3)?),
                end_date: parse_date(row.get::<_, String>(4)?),
                registration_start: row.get::<_, Option<String>>(5)?.map(parse_date),
                registration_end: row.get::<_, Option<String>>(6)?.map(parse_date),
                is_active: true,
            }))
        } else {
            Ok(None)
        }
    }

    /// Make `id` the active term, deactivating the current one in the same
    /// transaction so the single-active-term index is never violated.
    /// Returns false (and leaves the previous term active) when `id` does
    /// not exist.
    pub fn set_active_term(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        tx.execute("UPDATE terms SET is_active = 0 WHERE is_active = 1", [])?;
        let rows = tx.execute(
            "UPDATE terms SET is_active = 1 WHERE id = ?",
            [id.to_string()],
        )?;
        if rows == 0 {
            // Dropping the transaction rolls the deactivation back.
            return Ok(false);
        }

        tx.commit()?;
        Ok(true)
    }

    // ============================================================
    // Course operations
    // ============================================================

    pub fn create_course(&self, input: CreateCourseInput) -> Result<Course> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO courses (id, code, title, description, credits, dept_id, kind, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.code,
                &input.title,
                &input.description,
                input.credits,
                input.dept_id.to_string(),
                input.kind.as_str(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Course {
            id,
            code: input.code,
            title: input.title,
            description: input.description,
            credits: input.credits,
            dept_id: input.dept_id,
            kind: input.kind,
            created_at: now,
        })
    }

    pub fn get_courses(&self) -> Result<Vec<CourseWithDepartment>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT c.id, c.code, c.title, c.description, c.credits, c.dept_id, c.kind, c.created_at,
                    d.name, d.code
             FROM courses c
             JOIN departments d ON c.dept_id = d.id
             ORDER BY c.code",
        )?;

        let courses = stmt
            .query_map([], |row| {
                Ok(CourseWithDepartment {
                    course: Course {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        code: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        credits: row.get(4)?,
                        dept_id: parse_uuid(row.get::<_, String>(5)?),
                        kind: CourseKind::from_str(&row.get::<_, String>(6)?)
                            .unwrap_or(CourseKind::UniversityElective),
                        created_at: parse_datetime(row.get::<_, String>(7)?),
                    },
                    dept_name: row.get(8)?,
                    dept_code: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(courses)
    }

    /// Single-course view with department fields and prerequisite edges.
    pub fn get_course(&self, id: Uuid) -> Result<Option<CourseDetail>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT c.id, c.code, c.title, c.description, c.credits, c.dept_id, c.kind, c.created_at,
                    d.name, d.code
             FROM courses c
             JOIN departments d ON c.dept_id = d.id
             WHERE c.id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let course = CourseWithDepartment {
            course: Course {
                id: parse_uuid(row.get::<_, String>(0)?),
                code: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                credits: row.get(4)?,
                dept_id: parse_uuid(row.get::<_, String>(5)?),
                kind: CourseKind::from_str(&row.get::<_, String>(6)?)
                    .unwrap_or(CourseKind::UniversityElective),
                created_at: parse_datetime(row.get::<_, String>(7)?),
            },
            dept_name: row.get(8)?,
            dept_code: row.get(9)?,
        };

        let mut stmt = conn.prepare(
            "SELECT p.prerequisite_course_id, c.code, c.title, p.minimum_grade
             FROM course_prerequisites p
             JOIN courses c ON p.prerequisite_course_id = c.id
             WHERE p.course_id = ?
             ORDER BY c.code",
        )?;

        let prerequisites = stmt
            .query_map([id.to_string()], |row| {
                Ok(Prerequisite {
                    course_id: parse_uuid(row.get::<_, String>(0)?),
                    code: row.get(1)?,
                    title: row.get(2)?,
                    minimum_grade: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CourseDetail {
            course,
            prerequisites,
        }))
    }

    pub fn update_course(&self, id: Uuid, input: UpdateCourseInput) -> Result<Option<Course>> {
        let Some(existing) = self.course_by_id(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let title = input.title.unwrap_or(existing.title);
        let description = input.description.or(existing.description);
        let credits = input.credits.unwrap_or(existing.credits);
        let dept_id = input.dept_id.unwrap_or(existing.dept_id);
        let kind = input.kind.unwrap_or(existing.kind);

        conn.execute(
            "UPDATE courses SET title = ?, description = ?, credits = ?, dept_id = ?, kind = ? WHERE id = ?",
            (
                &title,
                &description,
                credits,
                dept_id.to_string(),
                kind.as_str(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Course {
            id,
            code: existing.code,
            title,
            description,
            credits,
            dept_id,
            kind,
            created_at: existing.created_at,
        }))
    }

    /// Delete a course. Prerequisite edges, sections, and their enrollments
    /// go with it via foreign key cascades.
    pub fn delete_course(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM courses WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn add_prerequisite(
        &self,
        course_id: Uuid,
        prerequisite_course_id: Uuid,
        minimum_grade: &str,
    ) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO course_prerequisites (id, course_id, prerequisite_course_id, minimum_grade)
             VALUES (?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                course_id.to_string(),
                prerequisite_course_id.to_string(),
                minimum_grade,
            ),
        )?;
        Ok(())
    }

    fn course_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, code, title, description, credits, dept_id, kind, created_at
             FROM courses WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Course {
                id: parse_uuid(row.get::<_, String>(0)?),
                code: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                credits: row.get(4)?,
                dept_id: parse_uuid(row.get::<_, String>(5)?),
                kind: CourseKind::from_str(&row.get::<_, String>(6)?)
                    .unwrap_or(CourseKind::UniversityElective),
                created_at: parse_datetime(row.get::<_, String>(7)?),
            }))
        } else {
            Ok(None)
        }
    }

    // ============================================================
    // Time slot operations
    // ============================================================

    pub fn create_time_slot(&self, input: CreateTimeSlotInput) -> Result<TimeSlot> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO time_slots (id, day_of_week, start_time, end_time) VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                input.day.as_str(),
                input.start_time.format("%H:%M").to_string(),
                input.end_time.format("%H:%M").to_string(),
            ),
        )?;

        Ok(TimeSlot {
            id,
            day: input.day,
            start_time: input.start_time,
            end_time: input.end_time,
        })
    }

    pub fn add_section_slot(&self, section_id: Uuid, time_slot_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO section_time_slots (id, section_id, time_slot_id) VALUES (?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                section_id.to_string(),
                time_slot_id.to_string(),
            ),
        )?;
        Ok(())
    }

    pub fn get_section_slots(&self, section_id: Uuid) -> Result<Vec<TimeSlot>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        section_slots(&conn, section_id)
    }

    // ============================================================
    // Section operations
    // ============================================================

    pub fn create_section(&self, input: CreateSectionInput) -> Result<Section> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO sections (id, section_code, course_id, term_id, instructor_id, capacity, seats_taken, room, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                &input.section_code,
                input.course_id.to_string(),
                input.term_id.to_string(),
                input.instructor_id.to_string(),
                input.capacity,
                &input.room,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Section {
            id,
            section_code: input.section_code,
            course_id: input.course_id,
            term_id: input.term_id,
            instructor_id: input.instructor_id,
            capacity: input.capacity,
            seats_taken: 0,
            room: input.room,
            created_at: now,
        })
    }

    pub fn get_section(&self, id: Uuid) -> Result<Option<Section>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, section_code, course_id, term_id, instructor_id, capacity, seats_taken, room, created_at
             FROM sections WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Section {
                id: parse_uuid(row.get::<_, String>(0)?),
                section_code: row.get(1)?,
                course_id: parse_uuid(row.get::<_, String>(2)?),
                term_id: parse_uuid(row.get::<_, String>(3)?),
                instructor_id: parse_uuid(row.get::<_, String>(4)?),
                capacity: row.get(5)?,
                seats_taken: row.get(6)?,
                room: row.get(7)?,
                created_at: parse_datetime(row.get::<_, String>(8)?),
            }))
        } else {
            Ok(None)
        }
    }

    /// Sections of a course offered in the active term, with instructor
    /// names and weekly slots for the catalog view.
    pub fn get_course_sections(&self, course_id: Uuid) -> Result<Vec<SectionDetail>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT sec.id, sec.section_code, sec.course_id, sec.term_id, sec.instructor_id,
                    sec.capacity, sec.seats_taken, sec.room, sec.created_at,
                    c.code, c.title, c.credits, t.name, u.name
             FROM sections sec
             JOIN courses c ON sec.course_id = c.id
             JOIN terms t ON sec.term_id = t.id
             JOIN instructors i ON sec.instructor_id = i.id
             JOIN users u ON i.user_id = u.id
             WHERE sec.course_id = ? AND t.is_active = 1
             ORDER BY sec.section_code",
        )?;

        let sections = stmt
            .query_map([course_id.to_string()], section_detail_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        attach_slots(&conn, sections)
    }

    /// Every section an instructor teaches, across terms.
    pub fn get_instructor_sections(&self, instructor_id: Uuid) -> Result<Vec<SectionDetail>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT sec.id, sec.section_code, sec.course_id, sec.term_id, sec.instructor_id,
                    sec.capacity, sec.seats_taken, sec.room, sec.created_at,
                    c.code, c.title, c.credits, t.name, u.name
             FROM sections sec
             JOIN courses c ON sec.course_id = c.id
             JOIN terms t ON sec.term_id = t.id
             JOIN instructors i ON sec.instructor_id = i.id
             JOIN users u ON i.user_id = u.id
             WHERE sec.instructor_id = ?
             ORDER BY t.start_date DESC, sec.section_code",
        )?;

        let sections = stmt
            .query_map([instructor_id.to_string()], section_detail_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        attach_slots(&conn, sections)
    }

    /// A student's enrollment rows joined with course, section, term, and
    /// instructor context: the transcript view.
    pub fn get_student_enrollments(&self, student_id: Uuid) -> Result<Vec<EnrollmentDetail>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT e.id, e.student_id, e.section_id, e.status, e.numeric_grade, e.final_grade,
                    e.grade_points, e.enrolled_at, e.updated_at,
                    sec.section_code, c.code, c.title, c.credits, t.code, t.name, u.name, sec.room
             FROM enrollments e
             JOIN sections sec ON e.section_id = sec.id
             JOIN courses c ON sec.course_id = c.id
             JOIN terms t ON sec.term_id = t.id
             JOIN instructors i ON sec.instructor_id = i.id
             JOIN users u ON i.user_id = u.id
             WHERE e.student_id = ?
             ORDER BY t.start_date DESC, c.code",
        )?;

        let enrollments = stmt
            .query_map([student_id.to_string()], |row| {
                Ok(EnrollmentDetail {
                    enrollment: Enrollment {
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
                    },
                    section_code: row.get(9)?,
                    course_code: row.get(10)?,
                    course_title: row.get(11)?,
                    credits: row.get(12)?,
                    term_code: row.get(13)?,
                    term_name: row.get(14)?,
                    instructor_name: row.get(15)?,
                    room: row.get(16)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(enrollments)
    }
}

fn section_detail_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SectionDetail> {
    Ok(SectionDetail {
        section: Section {
            id: parse_uuid(row.get::<_, String>(0)?),
            section_code: row.get(1)?,
            course_id: parse_uuid(row.get::<_, String>(2)?),
            term_id: parse_uuid(row.get::<_, String>(3)?),
            instructor_id: parse_uuid(row.get::<_, String>(4)?),
            capacity: row.get(5)?,
            seats_taken: row.get(6)?,
            room: row.get(7)?,
            created_at: parse_datetime(row.get::<_, String>(8)?),
        },
        course_code: row.get(9)?,
        course_title: row.get(10)?,
        credits: row.get(11)?,
        term_name: row.get(12)?,
        instructor_name: row.get(13)?,
        slots: Vec::new(),
    })
}

fn attach_slots(conn: &Connection, sections: Vec<SectionDetail>) -> Result<Vec<SectionDetail>> {
    let mut detailed = Vec::with_capacity(sections.len());
    for mut detail in sections {
        detail.slots = section_slots(conn, detail.section.id)?;
        detailed.push(detail);
    }
    Ok(detailed)
}

fn section_slots(conn: &Connection, section_id: Uuid) -> Result<Vec<TimeSlot>> {
    let mut stmt = conn.prepare(
        "SELECT ts.id, ts.day_of_week, ts.start_time, ts.end_time
         FROM section_time_slots sts
         JOIN time_slots ts ON sts.time_slot_id = ts.id
         WHERE sts.section_id = ?
         ORDER BY ts.day_of_week, ts.start_time",
    )?;

    let slots = stmt
        .query_map([section_id.to_string()], |row| {
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
