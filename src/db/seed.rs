//! Demo data for a fresh database: departments, demo accounts, an active
//! term, a small course catalog with sections, and a few enrollments so
//! transcript and GPA queries return something out of the box.

use anyhow::Result;
use chrono::NaiveTime;
use uuid::Uuid;

use super::Database;
use crate::models::*;

impl Database {
    /// Load the demo data set. Returns false without touching anything when
    /// any account already exists, so it is safe to run on every startup.
    ///
    /// Demo logins: admin 99999/admin123, student 10001/student123,
    /// instructor 20001/instructor123.
    pub fn seed_demo(&self) -> Result<bool> {
        {
            let conn = self.conn.lock().expect("database lock poisoned");
            let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            if users > 0 {
                return Ok(false);
            }
        }

        let cse = self.create_department("CSE", "Computer Science and Engineering")?;
        let ee = self.create_department("EE", "Electrical Engineering")?;
        self.create_department("ME", "Mechanical Engineering")?;
        let math = self.create_department("MATH", "Mathematics")?;
        let phys = self.create_department("PHYS", "Physics")?;

        let admin = self.register_account(RegisterInput {
            username: "99999".to_string(),
            name: "System Administrator".to_string(),
            email: "admin@university.edu".to_string(),
            password: "admin123".to_string(),
            role: Role::Admin,
            phone: None,
            college: None,
            major: None,
            year_of_study: None,
            dept_id: None,
            title: None,
            office_location: None,
            office_hours: None,
        })?;
        self.approve_user(admin.id)?;

        let alice = self.register_account(RegisterInput {
            phone: Some("+1234567890".to_string()),
            ..student_input(
                "10001",
                "Alice Johnson",
                "alice.student@university.edu",
                "Computer Science",
                3,
            )
        })?;
        let bob = self.register_account(student_input(
            "10002",
            "Bob Smith",
            "bob.smith@university.edu",
            "Electrical Engineering",
            2,
        ))?;
        let charlie = self.register_account(student_input(
            "10003",
            "Charlie Brown",
            "charlie.brown@university.edu",
            "Mechanical Engineering",
            4,
        ))?;
        self.set_enrollment_year(alice.id, 2022)?;
        self.set_enrollment_year(bob.id, 2023)?;
        self.set_enrollment_year(charlie.id, 2021)?;

        let emily = self.register_account(RegisterInput {
            phone: Some("+1987654321".to_string()),
            ..instructor_input(
                "20001",
                "Dr. Emily Chen",
                "emily.chen@university.edu",
                cse.id,
                "Professor",
                "Building A, Room 301",
                "Mon-Wed 2-4 PM",
            )
        })?;
        let michael = self.register_account(instructor_input(
            "20002",
            "Prof. Michael Davis",
            "michael.davis@university.edu",
            cse.id,
            "Associate Professor",
            "Building B, Room 205",
            "Tue-Thu 3-5 PM",
        ))?;
        let sarah = self.register_account(instructor_input(
            "20003",
            "Dr. Sarah Wilson",
            "sarah.wilson@university.edu",
            ee.id,
            "Assistant Professor",
            "Building C, Room 102",
            "Mon-Fri 1-2 PM",
        ))?;
        for user in [&emily, &michael, &sarah] {
            self.approve_user(user.id)?;
        }

        let term = self.create_term(CreateTermInput {
            code: "2025S1".to_string(),
            name: "Spring 2025".to_string(),
            start_date: "2025-01-15".parse()?,
            end_date: "2025-05-30".parse()?,
            registration_start: Some("2024-12-01".parse()?),
            registration_end: Some("2025-01-10".parse()?),
        })?;
        self.set_active_term(term.id)?;

        let mon_early = self.create_time_slot(slot_input(DayOfWeek::Monday, "08:00", "09:30")?)?;
        let mon_late = self.create_time_slot(slot_input(DayOfWeek::Monday, "10:00", "11:30")?)?;
        let wed_early = self.create_time_slot(slot_input(DayOfWeek::Wednesday, "08:00", "09:30")?)?;
        let wed_late = self.create_time_slot(slot_input(DayOfWeek::Wednesday, "10:00", "11:30")?)?;
        self.create_time_slot(slot_input(DayOfWeek::Friday, "14:00", "15:30")?)?;

        let cs101 = self.create_course(course_input(
            "CS101",
            "Introduction to Computer Science",
            "Basic programming concepts and problem solving",
            3,
            cse.id,
            CourseKind::GeneralRequired,
        ))?;
        let cs201 = self.create_course(course_input(
            "CS201",
            "Data Structures and Algorithms",
            "Advanced data structures and algorithm analysis",
            4,
            cse.id,
            CourseKind::MajorRequired,
        ))?;
        let cs301 = self.create_course(course_input(
            "CS301",
            "Database Systems",
            "Design and implementation of database systems",
            3,
            cse.id,
            CourseKind::MajorRequired,
        ))?;
        let math101 = self.create_course(course_input(
            "MATH101",
            "Calculus I",
            "Differential and integral calculus",
            4,
            math.id,
            CourseKind::GeneralRequired,
        ))?;
        let phys101 = self.create_course(course_input(
            "PHYS101",
            "Physics I",
            "Mechanics and thermodynamics",
            4,
            phys.id,
            CourseKind::GeneralRequired,
        ))?;

        self.add_prerequisite(cs201.id, cs101.id, "C")?;
        self.add_prerequisite(cs301.id, cs201.id, "C")?;

        let emily_id = self.instructor_id_for(&emily)?;
        let michael_id = self.instructor_id_for(&michael)?;
        let sarah_id = self.instructor_id_for(&sarah)?;

        let cs101_sec = self.create_section(section_input(
            "CS101-01", cs101.id, term.id, emily_id, 35, "Room A101",
        ))?;
        let cs201_sec = self.create_section(section_input(
            "CS201-01", cs201.id, term.id, michael_id, 30, "Room B205",
        ))?;
        let cs301_sec = self.create_section(section_input(
            "CS301-01", cs301.id, term.id, emily_id, 25, "Room C301",
        ))?;
        let math101_sec = self.create_section(section_input(
            "MATH101-01", math101.id, term.id, sarah_id, 40, "Room D102",
        ))?;
        let phys101_sec = self.create_section(section_input(
            "PHYS101-01", phys101.id, term.id, sarah_id, 35, "Lab E201",
        ))?;

        self.add_section_slot(cs101_sec.id, mon_early.id)?;
        self.add_section_slot(cs101_sec.id, wed_early.id)?;
        self.add_section_slot(cs201_sec.id, mon_late.id)?;
        self.add_section_slot(cs201_sec.id, wed_late.id)?;

        // Alice's history: two courses passed in earlier sessions and one
        // current registration, run through the real enrollment paths so
        // grade points come from the policy.
        let alice_id = self.student_id_for(&alice)?;
        let registrar = Actor {
            user_id: admin.id,
            role: Role::Admin,
        };

        let passed_cs101 = self.enroll(alice_id, cs101_sec.id)?;
        self.record_grade(
            passed_cs101.id,
            graded(88.0, "A-", EnrollmentStatus::Passed),
            registrar,
        )?;
        let passed_math = self.enroll(alice_id, math101_sec.id)?;
        self.record_grade(
            passed_math.id,
            graded(92.0, "A", EnrollmentStatus::Passed),
            registrar,
        )?;
        self.enroll(alice_id, cs201_sec.id)?;

        // Seat counters reflect a mid-registration snapshot; most of those
        // seats belong to students who are not demo accounts.
        self.set_seats_taken(cs101_sec.id, 15)?;
        self.set_seats_taken(cs201_sec.id, 12)?;
        self.set_seats_taken(cs301_sec.id, 8)?;
        self.set_seats_taken(math101_sec.id, 20)?;
        self.set_seats_taken(phys101_sec.id, 18)?;

        Ok(true)
    }

    fn student_id_for(&self, user: &User) -> Result<Uuid> {
        let student = self
            .get_student_by_user(user.id)?
            .ok_or_else(|| anyhow::anyhow!("no student profile for {}", user.username))?;
        Ok(student.id)
    }

    fn instructor_id_for(&self, user: &User) -> Result<Uuid> {
        let instructor = self
            .get_instructor_by_user(user.id)?
            .ok_or_else(|| anyhow::anyhow!("no instructor profile for {}", user.username))?;
        Ok(instructor.id)
    }

    fn set_enrollment_year(&self, user_id: Uuid, year: i32) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE students SET enrollment_year = ? WHERE user_id = ?",
            (year, user_id.to_string()),
        )?;
        Ok(())
    }

    fn set_seats_taken(&self, section_id: Uuid, seats: i32) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE sections SET seats_taken = ? WHERE id = ?",
            (seats, section_id.to_string()),
        )?;
        Ok(())
    }
}

fn student_input(
    username: &str,
    name: &str,
    email: &str,
    major: &str,
    year_of_study: i32,
) -> RegisterInput {
    RegisterInput {
        username: username.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: "student123".to_string(),
        role: Role::Student,
        phone: None,
        college: Some("Engineering".to_string()),
        major: Some(major.to_string()),
        year_of_study: Some(year_of_study),
        dept_id: None,
        title: None,
        office_location: None,
        office_hours: None,
    }
}

fn instructor_input(
    username: &str,
    name: &str,
    email: &str,
    dept_id: Uuid,
    title: &str,
    office_location: &str,
    office_hours: &str,
) -> RegisterInput {
    RegisterInput {
        username: username.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: "instructor123".to_string(),
        role: Role::Instructor,
        phone: None,
        college: None,
        major: None,
        year_of_study: None,
        dept_id: Some(dept_id),
        title: Some(title.to_string()),
        office_location: Some(office_location.to_string()),
        office_hours: Some(office_hours.to_string()),
    }
}

fn slot_input(day: DayOfWeek, start: &str, end: &str) -> Result<CreateTimeSlotInput> {
    Ok(CreateTimeSlotInput {
        day,
        start_time: NaiveTime::parse_from_str(start, "%H:%M")?,
        end_time: NaiveTime::parse_from_str(end, "%H:%M")?,
    })
}

fn course_input(
    code: &str,
    title: &str,
    description: &str,
    credits: i32,
    dept_id: Uuid,
    kind: CourseKind,
) -> CreateCourseInput {
    CreateCourseInput {
        code: code.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        credits,
        dept_id,
        kind,
    }
}

fn section_input(
    section_code: &str,
    course_id: Uuid,
    term_id: Uuid,
    instructor_id: Uuid,
    capacity: i32,
    room: &str,
) -> CreateSectionInput {
    CreateSectionInput {
        section_code: section_code.to_string(),
        course_id,
        term_id,
        instructor_id,
        capacity,
        room: Some(room.to_string()),
    }
}

fn graded(numeric: f64, letter: &str, status: EnrollmentStatus) -> RecordGradeInput {
    RecordGradeInput {
        numeric_grade: Some(numeric),
        final_grade: Some(letter.to_string()),
        status,
    }
}
