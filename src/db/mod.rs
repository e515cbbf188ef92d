mod catalog;
mod enroll;
mod schema;
mod seed;

pub use enroll::EnrollError;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Datelike, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::auth;
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "registrar")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("registrar.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Account operations
    // ============================================================

    /// Create an account plus its role profile row in one transaction.
    ///
    /// Students are approved immediately; instructor (and admin) accounts
    /// wait for approval before they can log in. Username and email
    /// uniqueness surface as constraint errors from here.
    pub fn register_account(&self, input: RegisterInput) -> Result<User> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let is_approved = input.role == Role::Student;
        let password_hash = auth::hash_password(&input.password);

        tx.execute(
            "INSERT INTO users (id, username, name, email, password_hash, role, phone, is_approved, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                user_id.to_string(),
                &input.username,
                &input.name,
                &input.email,
                &password_hash,
                input.role.as_str(),
                &input.phone,
                is_approved as i32,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        match input.role {
            Role::Student => {
                tx.execute(
                    "INSERT INTO students (id, user_id, student_no, college, major, year_of_study, enrollment_year)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        user_id.to_string(),
                        &input.username,
                        input.college.as_deref().unwrap_or("Engineering"),
                        input.major.as_deref().unwrap_or("Undeclared"),
                        input.year_of_study.unwrap_or(1),
                        now.year(),
                    ),
                )?;
            }
            Role::Instructor => {
                let dept_id = input
                    .dept_id
                    .ok_or_else(|| anyhow::anyhow!("Instructor registration requires dept_id"))?;
                tx.execute(
                    "INSERT INTO instructors (id, user_id, staff_no, dept_id, title, office_location, office_hours)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        user_id.to_string(),
                        &input.username,
                        dept_id.to_string(),
                        input.title.as_deref().unwrap_or("Instructor"),
                        &input.office_location,
                        &input.office_hours,
                    ),
                )?;
            }
            Role::Admin => {}
        }

        tx.commit()?;

        Ok(User {
            id: user_id,
            username: input.username,
            name: input.name,
            email: input.email,
            role: input.role,
            phone: input.phone,
            is_approved,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, username, name, email, role, phone, is_approved, created_at, updated_at
             FROM users WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(User {
                id: parse_uuid(row.get::<_, String>(0)?),
                username: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                role: Role::from_str(&row.get::<_, String>(4)?).unwrap_or(Role::Student),
                phone: row.get(5)?,
                is_approved: row.get::<_, i32>(6)? != 0,
                created_at: parse_datetime(row.get::<_, String>(7)?),
                updated_at: parse_datetime(row.get::<_, String>(8)?),
            }))
        } else {
            Ok(None)
        }
    }

    /// Fetch an account together with its stored password hash for a login
    /// check. The hash never leaves the login path.
    pub fn get_user_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, username, name, email, role, phone, is_approved, created_at, updated_at, password_hash
             FROM users WHERE username = ?",
        )?;

        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            let user = User {
                id: parse_uuid(row.get::<_, String>(0)?),
                username: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                role: Role::from_str(&row.get::<_, String>(4)?).unwrap_or(Role::Student),
                phone: row.get(5)?,
                is_approved: row.get::<_, i32>(6)? != 0,
                created_at: parse_datetime(row.get::<_, String>(7)?),
                updated_at: parse_datetime(row.get::<_, String>(8)?),
            };
            let password_hash: String = row.get(9)?;
            Ok(Some((user, password_hash)))
        } else {
            Ok(None)
        }
    }

    pub fn approve_user(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE users SET is_approved = 1, updated_at = ? WHERE id = ?",
            (Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Student operations
    // ============================================================

    pub fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, student_no, college, major, year_of_study, enrollment_year
             FROM students WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Student {
                id: parse_uuid(row.get::<_, String>(0)?),
                user_id: parse_uuid(row.get::<_, String>(1)?),
                student_no: row.get(2)?,
                college: row.get(3)?,
                major: row.get(4)?,
                year_of_study: row.get(5)?,
                enrollment_year: row.get(6)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_student_by_user(&self, user_id: Uuid) -> Result<Option<Student>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, student_no, college, major, year_of_study, enrollment_year
             FROM students WHERE user_id = ?",
        )?;

        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Student {
                id: parse_uuid(row.get::<_, String>(0)?),
                user_id: parse_uuid(row.get::<_, String>(1)?),
                student_no: row.get(2)?,
                college: row.get(3)?,
                major: row.get(4)?,
                year_of_study: row.get(5)?,
                enrollment_year: row.get(6)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_student_profile(&self, user_id: Uuid) -> Result<Option<StudentProfile>> {
        let found = {
            let conn = self.conn.lock().expect("database lock poisoned");
            let mut stmt = conn.prepare(
                "SELECT s.id, s.user_id, s.student_no, s.college, s.major, s.year_of_study, s.enrollment_year,
                        u.username, u.name, u.email, u.phone
                 FROM students s
                 JOIN users u ON s.user_id = u.id
                 WHERE u.id = ?",
            )?;

            let mut rows = stmt.query([user_id.to_string()])?;
            if let Some(row) = rows.next()? {
                Some((
                    Student {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        user_id: parse_uuid(row.get::<_, String>(1)?),
                        student_no: row.get(2)?,
                        college: row.get(3)?,
                        major: row.get(4)?,
                        year_of_study: row.get(5)?,
                        enrollment_year: row.get(6)?,
                    },
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, Option<String>>(10)?,
                ))
            } else {
                None
            }
        };

        let Some((student, username, name, email, phone)) = found else {
            return Ok(None);
        };
        let gpa = self.student_gpa(student.id)?;

        Ok(Some(StudentProfile {
            student,
            username,
            name,
            email,
            phone,
            gpa: round2(gpa),
        }))
    }

    pub fn list_students(&self) -> Result<Vec<StudentProfile>> {
        let students = {
            let conn = self.conn.lock().expect("database lock poisoned");
            let mut stmt = conn.prepare(
                "SELECT s.id, s.user_id, s.student_no, s.college, s.major, s.year_of_study, s.enrollment_year,
                        u.username, u.name, u.email, u.phone
                 FROM students s
                 JOIN users u ON s.user_id = u.id
                 ORDER BY s.student_no",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        Student {
                            id: parse_uuid(row.get::<_, String>(0)?),
                            user_id: parse_uuid(row.get::<_, String>(1)?),
                            student_no: row.get(2)?,
                            college: row.get(3)?,
                            major: row.get(4)?,
                            year_of_study: row.get(5)?,
                            enrollment_year: row.get(6)?,
                        },
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, Option<String>>(10)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut profiles = Vec::with_capacity(students.len());
        for (student, username, name, email, phone) in students {
            let gpa = self.student_gpa(student.id)?;
            profiles.push(StudentProfile {
                student,
                username,
                name,
                email,
                phone,
                gpa: round2(gpa),
            });
        }

        Ok(profiles)
    }

    pub fn update_student(
        &self,
        id: Uuid,
        input: UpdateStudentInput,
    ) -> Result<Option<StudentProfile>> {
        let Some(student) = self.get_student(id)? else {
            return Ok(None);
        };
        let Some(user) = self.get_user(student.user_id)? else {
            return Ok(None);
        };

        {
            let conn = self.conn.lock().expect("database lock poisoned");
            let now = Utc::now();
            let name = input.name.unwrap_or(user.name);
            let email = input.email.unwrap_or(user.email);
            let phone = input.phone.or(user.phone);

            conn.execute(
                "UPDATE users SET name = ?, email = ?, phone = ?, updated_at = ? WHERE id = ?",
                (&name, &email, &phone, now.to_rfc3339(), user.id.to_string()),
            )?;

            let college = input.college.unwrap_or(student.college);
            let major = input.major.unwrap_or(student.major);
            let year_of_study = input.year_of_study.unwrap_or(student.year_of_study);

            conn.execute(
                "UPDATE students SET college = ?, major = ?, year_of_study = ? WHERE id = ?",
                (&college, &major, year_of_study, id.to_string()),
            )?;
        }

        self.get_student_profile(student.user_id)
    }

    // ============================================================
    // Instructor operations
    // ============================================================

    pub fn get_instructor(&self, id: Uuid) -> Result<Option<Instructor>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, staff_no, dept_id, title, office_location, office_hours
             FROM instructors WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Instructor {
                id: parse_uuid(row.get::<_, String>(0)?),
                user_id: parse_uuid(row.get::<_, String>(1)?),
                staff_no: row.get(2)?,
                dept_id: parse_uuid(row.get::<_, String>(3)?),
                title: row.get(4)?,
                office_location: row.get(5)?,
                office_hours: row.get(6)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_instructor_by_user(&self, user_id: Uuid) -> Result<Option<Instructor>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, staff_no, dept_id, title, office_location, office_hours
             FROM instructors WHERE user_id = ?",
        )?;

        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Instructor {
                id: parse_uuid(row.get::<_, String>(0)?),
                user_id: parse_uuid(row.get::<_, String>(1)?),
                staff_no: row.get(2)?,
                dept_id: parse_uuid(row.get::<_, String>(3)?),
                title: row.get(4)?,
                office_location: row.get(5)?,
                office_hours: row.get(6)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_instructor_profile(&self, user_id: Uuid) -> Result<Option<InstructorProfile>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT i.id, i.user_id, i.staff_no, i.dept_id, i.title, i.office_location, i.office_hours,
                    u.username, u.name, u.email, u.phone, d.name
             FROM instructors i
             JOIN users u ON i.user_id = u.id
             JOIN departments d ON i.dept_id = d.id
             WHERE u.id = ?",
        )?;

        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(InstructorProfile {
                instructor: Instructor {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    user_id: parse_uuid(row.get::<_, String>(1)?),
                    staff_no: row.get(2)?,
                    dept_id: parse_uuid(row.get::<_, String>(3)?),
                    title: row.get(4)?,
                    office_location: row.get(5)?,
                    office_hours: row.get(6)?,
                },
                username: row.get(7)?,
                name: row.get(8)?,
                email: row.get(9)?,
                phone: row.get(10)?,
                dept_name: row.get(11)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn list_instructors(&self) -> Result<Vec<InstructorProfile>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT i.id, i.user_id, i.staff_no, i.dept_id, i.title, i.office_location, i.office_hours,
                    u.username, u.name, u.email, u.phone, d.name
             FROM instructors i
             JOIN users u ON i.user_id = u.id
             JOIN departments d ON i.dept_id = d.id
             ORDER BY i.staff_no",
        )?;

        let instructors = stmt
            .query_map([], |row| {
                Ok(InstructorProfile {
                    instructor: Instructor {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        user_id: parse_uuid(row.get::<_, String>(1)?),
                        staff_no: row.get(2)?,
                        dept_id: parse_uuid(row.get::<_, String>(3)?),
                        title: row.get(4)?,
                        office_location: row.get(5)?,
                        office_hours: row.get(6)?,
                    },
                    username: row.get(7)?,
                    name: row.get(8)?,
                    email: row.get(9)?,
                    phone: row.get(10)?,
                    dept_name: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(instructors)
    }

    pub fn update_instructor(
        &self,
        id: Uuid,
        input: UpdateInstructorInput,
    ) -> Result<Option<InstructorProfile>> {
        let Some(instructor) = self.get_instructor(id)? else {
            return Ok(None);
        };
        let Some(user) = self.get_user(instructor.user_id)? else {
            return Ok(None);
        };

        {
            let conn = self.conn.lock().expect("database lock poisoned");
            let now = Utc::now();
            let name = input.name.unwrap_or(user.name);
            let email = input.email.unwrap_or(user.email);
            let phone = input.phone.or(user.phone);

            conn.execute(
                "UPDATE users SET name = ?, email = ?, phone = ?, updated_at = ? WHERE id = ?",
                (&name, &email, &phone, now.to_rfc3339(), user.id.to_string()),
            )?;

            let dept_id = input.dept_id.unwrap_or(instructor.dept_id);
            let title = input.title.unwrap_or(instructor.title);
            let office_location = input.office_location.or(instructor.office_location);
            let office_hours = input.office_hours.or(instructor.office_hours);

            conn.execute(
                "UPDATE instructors SET dept_id = ?, title = ?, office_location = ?, office_hours = ? WHERE id = ?",
                (
                    dept_id.to_string(),
                    &title,
                    &office_location,
                    &office_hours,
                    id.to_string(),
                ),
            )?;
        }

        self.get_instructor_profile(instructor.user_id)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_default()
}

fn parse_time(s: String) -> chrono::NaiveTime {
    chrono::NaiveTime::parse_from_str(&s, "%H:%M").unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
