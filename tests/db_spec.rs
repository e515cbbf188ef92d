use chrono::NaiveTime;
use registrar::auth;
use registrar::db::Database;
use registrar::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn student_input(username: &str) -> RegisterInput {
    RegisterInput {
        username: username.to_string(),
        name: format!("Student {username}"),
        email: format!("{username}@university.edu"),
        password: "student123".to_string(),
        role: Role::Student,
        phone: None,
        college: None,
        major: None,
        year_of_study: None,
        dept_id: None,
        title: None,
        office_location: None,
        office_hours: None,
    }
}

fn instructor_input(username: &str, dept_id: Option<Uuid>) -> RegisterInput {
    RegisterInput {
        name: format!("Dr. {username}"),
        role: Role::Instructor,
        dept_id,
        ..student_input(username)
    }
}

fn term_input(code: &str, start: &str, end: &str) -> CreateTermInput {
    CreateTermInput {
        code: code.to_string(),
        name: format!("Term {code}"),
        start_date: start.parse().expect("Bad start date"),
        end_date: end.parse().expect("Bad end date"),
        registration_start: None,
        registration_end: None,
    }
}

fn course_input(code: &str, credits: i32, dept_id: Uuid) -> CreateCourseInput {
    CreateCourseInput {
        code: code.to_string(),
        title: format!("Course {code}"),
        description: None,
        credits,
        dept_id,
        kind: CourseKind::MajorRequired,
    }
}

/// Register an instructor account and return the teaching profile used as
/// the section's instructor of record.
fn register_instructor(db: &Database, username: &str, name: &str, dept_id: Uuid) -> Instructor {
    let user = db
        .register_account(RegisterInput {
            name: name.to_string(),
            ..instructor_input(username, Some(dept_id))
        })
        .expect("Failed to register instructor");

    db.get_instructor_by_user(user.id)
        .expect("Query failed")
        .expect("Instructor profile missing")
}

fn section_input(
    code: &str,
    course_id: Uuid,
    term_id: Uuid,
    instructor_id: Uuid,
    capacity: i32,
) -> CreateSectionInput {
    CreateSectionInput {
        section_code: code.to_string(),
        course_id,
        term_id,
        instructor_id,
        capacity,
        room: None,
    }
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("Bad time")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "accounts" {
        describe "register_account" {
            it "approves students immediately and creates their profile" {
                let user = db
                    .register_account(student_input("10001"))
                    .expect("Failed to register");

                assert_eq!(user.username, "10001");
                assert_eq!(user.role, Role::Student);
                assert!(user.is_approved);

                let profile = db
                    .get_student_profile(user.id)
                    .expect("Query failed")
                    .expect("Profile missing");
                assert_eq!(profile.student.student_no, "10001");
                assert_eq!(profile.student.college, "Engineering");
                assert_eq!(profile.student.major, "Undeclared");
                assert_eq!(profile.student.year_of_study, 1);
                assert_eq!(profile.gpa, 0.0);
            }

            it "honors provided profile fields" {
                let user = db
                    .register_account(RegisterInput {
                        phone: Some("+15550100".to_string()),
                        college: Some("Science".to_string()),
                        major: Some("Physics".to_string()),
                        year_of_study: Some(2),
                        ..student_input("10002")
                    })
                    .expect("Failed to register");

                assert_eq!(user.phone.as_deref(), Some("+15550100"));

                let profile = db
                    .get_student_profile(user.id)
                    .expect("Query failed")
                    .expect("Profile missing");
                assert_eq!(profile.student.college, "Science");
                assert_eq!(profile.student.major, "Physics");
                assert_eq!(profile.student.year_of_study, 2);
            }

            it "leaves instructors pending approval" {
                let dept = db
                    .create_department("CSE", "Computer Science and Engineering")
                    .expect("Failed to create department");

                let user = db
                    .register_account(instructor_input("20001", Some(dept.id)))
                    .expect("Failed to register");

                assert!(!user.is_approved);

                let profile = db
                    .get_instructor_profile(user.id)
                    .expect("Query failed")
                    .expect("Profile missing");
                assert_eq!(profile.instructor.staff_no, "20001");
                assert_eq!(profile.instructor.title, "Instructor");
                assert_eq!(profile.dept_name, "Computer Science and Engineering");
            }

            it "rejects instructors without a department" {
                let err = db
                    .register_account(instructor_input("20001", None))
                    .expect_err("Registration should fail");

                assert!(err.to_string().contains("dept_id"));
            }

            it "creates no profile rows for admins" {
                let user = db
                    .register_account(RegisterInput {
                        role: Role::Admin,
                        ..student_input("99999")
                    })
                    .expect("Failed to register");

                assert!(!user.is_approved);
                assert!(db.get_student_profile(user.id).expect("Query failed").is_none());
                assert!(db.get_instructor_profile(user.id).expect("Query failed").is_none());
            }

            it "rejects duplicate usernames" {
                db.register_account(student_input("10001")).expect("Failed to register");

                let err = db
                    .register_account(RegisterInput {
                        email: "other@university.edu".to_string(),
                        ..student_input("10001")
                    })
                    .expect_err("Duplicate username should fail");

                assert!(err.to_string().contains("UNIQUE constraint failed"));
            }

            it "rejects duplicate emails" {
                db.register_account(student_input("10001")).expect("Failed to register");

                let err = db
                    .register_account(RegisterInput {
                        username: "10002".to_string(),
                        ..student_input("10001")
                    })
                    .expect_err("Duplicate email should fail");

                assert!(err.to_string().contains("UNIQUE constraint failed"));
            }
        }

        describe "get_user" {
            it "returns the stored account" {
                let user = db
                    .register_account(student_input("10001"))
                    .expect("Failed to register");

                let found = db
                    .get_user(user.id)
                    .expect("Query failed")
                    .expect("User missing");
                assert_eq!(found.username, "10001");
                assert_eq!(found.email, "10001@university.edu");
            }

            it "returns none for an unknown id" {
                assert!(db.get_user(Uuid::new_v4()).expect("Query failed").is_none());
            }
        }

        describe "get_user_credentials" {
            it "returns the account with a verifiable hash" {
                db.register_account(student_input("10001")).expect("Failed to register");

                let (user, hash) = db
                    .get_user_credentials("10001")
                    .expect("Query failed")
                    .expect("User missing");

                assert_eq!(user.username, "10001");
                assert!(auth::verify_password("student123", &hash));
                assert!(!auth::verify_password("wrong-password", &hash));
            }

            it "returns none for an unknown username" {
                assert!(db
                    .get_user_credentials("nobody")
                    .expect("Query failed")
                    .is_none());
            }
        }

        describe "approve_user" {
            it "flips the approval flag" {
                let dept = db
                    .create_department("CSE", "Computer Science and Engineering")
                    .expect("Failed to create department");
                let user = db
                    .register_account(instructor_input("20001", Some(dept.id)))
                    .expect("Failed to register");
                assert!(!user.is_approved);

                assert!(db.approve_user(user.id).expect("Approval failed"));

                let refreshed = db
                    .get_user(user.id)
                    .expect("Query failed")
                    .expect("User missing");
                assert!(refreshed.is_approved);
            }

            it "returns false for a missing account" {
                assert!(!db.approve_user(Uuid::new_v4()).expect("Approval failed"));
            }
        }
    }

    describe "departments" {
        it "lists departments ordered by code" {
            db.create_department("ME", "Mechanical Engineering")
                .expect("Failed to create department");
            db.create_department("CSE", "Computer Science and Engineering")
                .expect("Failed to create department");
            db.create_department("EE", "Electrical Engineering")
                .expect("Failed to create department");

            let departments = db.get_departments().expect("Query failed");

            let codes: Vec<&str> = departments.iter().map(|d| d.code.as_str()).collect();
            assert_eq!(codes, ["CSE", "EE", "ME"]);
        }
    }

    describe "terms" {
        it "creates terms inactive" {
            let term = db
                .create_term(term_input("2025S1", "2025-01-15", "2025-05-30"))
                .expect("Failed to create term");

            assert!(!term.is_active);
            assert!(db.get_active_term().expect("Query failed").is_none());
        }

        it "activates exactly one term at a time" {
            let spring = db
                .create_term(term_input("2025S1", "2025-01-15", "2025-05-30"))
                .expect("Failed to create term");
            let fall = db
                .create_term(term_input("2025F1", "2025-09-01", "2025-12-20"))
                .expect("Failed to create term");

            assert!(db.set_active_term(spring.id).expect("Activation failed"));
            assert!(db.set_active_term(fall.id).expect("Activation failed"));

            let active = db
                .get_active_term()
                .expect("Query failed")
                .expect("No active term");
            assert_eq!(active.code, "2025F1");

            let active_count = db
                .get_terms()
                .expect("Query failed")
                .iter()
                .filter(|t| t.is_active)
                .count();
            assert_eq!(active_count, 1);
        }

        it "keeps the current term when activating a missing id" {
            let spring = db
                .create_term(term_input("2025S1", "2025-01-15", "2025-05-30"))
                .expect("Failed to create term");
            db.set_active_term(spring.id).expect("Activation failed");

            assert!(!db.set_active_term(Uuid::new_v4()).expect("Activation failed"));

            let active = db
                .get_active_term()
                .expect("Query failed")
                .expect("No active term");
            assert_eq!(active.code, "2025S1");
        }
    }

    describe "courses" {
        before {
            let dept = db
                .create_department("CSE", "Computer Science and Engineering")
                .expect("Failed to create department");
        }

        it "lists the catalog with department context ordered by code" {
            db.create_course(course_input("MATH101", 4, dept.id))
                .expect("Failed to create course");
            db.create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");

            let courses = db.get_courses().expect("Query failed");

            assert_eq!(courses.len(), 2);
            assert_eq!(courses[0].course.code, "CS101");
            assert_eq!(courses[1].course.code, "MATH101");
            assert_eq!(courses[0].dept_code, "CSE");
            assert_eq!(courses[0].dept_name, "Computer Science and Engineering");
        }

        it "returns one course with its prerequisites" {
            let cs101 = db
                .create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");
            let cs201 = db
                .create_course(course_input("CS201", 4, dept.id))
                .expect("Failed to create course");
            db.add_prerequisite(cs201.id, cs101.id, "C")
                .expect("Failed to add prerequisite");

            let detail = db
                .get_course(cs201.id)
                .expect("Query failed")
                .expect("Course missing");

            assert_eq!(detail.course.course.code, "CS201");
            assert_eq!(detail.course.dept_name, "Computer Science and Engineering");
            assert_eq!(detail.prerequisites.len(), 1);
            assert_eq!(detail.prerequisites[0].code, "CS101");
            assert_eq!(detail.prerequisites[0].minimum_grade, "C");
        }

        it "orders prerequisites by course code" {
            let cs101 = db
                .create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");
            let cs201 = db
                .create_course(course_input("CS201", 4, dept.id))
                .expect("Failed to create course");
            let cs301 = db
                .create_course(course_input("CS301", 3, dept.id))
                .expect("Failed to create course");
            db.add_prerequisite(cs301.id, cs201.id, "C")
                .expect("Failed to add prerequisite");
            db.add_prerequisite(cs301.id, cs101.id, "D")
                .expect("Failed to add prerequisite");

            let detail = db
                .get_course(cs301.id)
                .expect("Query failed")
                .expect("Course missing");

            let codes: Vec<&str> = detail
                .prerequisites
                .iter()
                .map(|p| p.code.as_str())
                .collect();
            assert_eq!(codes, ["CS101", "CS201"]);
        }

        it "returns none for a missing course" {
            db.create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");

            assert!(db.get_course(Uuid::new_v4()).expect("Query failed").is_none());
        }

        it "applies partial updates" {
            let course = db
                .create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");

            let updated = db
                .update_course(
                    course.id,
                    UpdateCourseInput {
                        title: Some("Introduction to Computer Science".to_string()),
                        description: None,
                        credits: Some(4),
                        dept_id: None,
                        kind: None,
                    },
                )
                .expect("Update failed")
                .expect("Course missing");

            assert_eq!(updated.title, "Introduction to Computer Science");
            assert_eq!(updated.credits, 4);
            assert_eq!(updated.code, "CS101");
            assert_eq!(updated.kind, CourseKind::MajorRequired);
        }

        it "returns none when updating a missing course" {
            db.create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");

            let result = db
                .update_course(
                    Uuid::new_v4(),
                    UpdateCourseInput {
                        title: Some("Ghost".to_string()),
                        description: None,
                        credits: None,
                        dept_id: None,
                        kind: None,
                    },
                )
                .expect("Update failed");

            assert!(result.is_none());
        }

        it "deletes a course and its sections" {
            let course = db
                .create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");
            let term = db
                .create_term(term_input("2025S1", "2025-01-15", "2025-05-30"))
                .expect("Failed to create term");
            let instructor = register_instructor(&db, "20001", "Dr. Emily Chen", dept.id);
            let section = db
                .create_section(section_input("CS101-01", course.id, term.id, instructor.id, 30))
                .expect("Failed to create section");

            assert!(db.delete_course(course.id).expect("Delete failed"));

            assert!(db.get_course(course.id).expect("Query failed").is_none());
            assert!(db.get_section(section.id).expect("Query failed").is_none());
        }

        it "returns false when deleting a missing course" {
            db.create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");

            assert!(!db.delete_course(Uuid::new_v4()).expect("Delete failed"));

            assert_eq!(db.get_courses().expect("Query failed").len(), 1);
        }
    }

    describe "sections" {
        before {
            let dept = db
                .create_department("CSE", "Computer Science and Engineering")
                .expect("Failed to create department");
            let course = db
                .create_course(course_input("CS101", 3, dept.id))
                .expect("Failed to create course");
            let term = db
                .create_term(term_input("2025S1", "2025-01-15", "2025-05-30"))
                .expect("Failed to create term");
            db.set_active_term(term.id).expect("Activation failed");
            let instructor = register_instructor(&db, "20001", "Dr. Emily Chen", dept.id);
        }

        it "creates sections with an empty seat count" {
            let section = db
                .create_section(section_input("CS101-01", course.id, term.id, instructor.id, 35))
                .expect("Failed to create section");

            assert_eq!(section.section_code, "CS101-01");
            assert_eq!(section.capacity, 35);
            assert_eq!(section.seats_taken, 0);
        }

        it "attaches weekly time slots ordered by day and start" {
            let section = db
                .create_section(section_input("CS101-01", course.id, term.id, instructor.id, 35))
                .expect("Failed to create section");

            let wednesday = db
                .create_time_slot(CreateTimeSlotInput {
                    day: DayOfWeek::Wednesday,
                    start_time: time("10:00"),
                    end_time: time("11:30"),
                })
                .expect("Failed to create time slot");
            let monday = db
                .create_time_slot(CreateTimeSlotInput {
                    day: DayOfWeek::Monday,
                    start_time: time("08:00"),
                    end_time: time("09:30"),
                })
                .expect("Failed to create time slot");
            db.add_section_slot(section.id, wednesday.id)
                .expect("Failed to attach slot");
            db.add_section_slot(section.id, monday.id)
                .expect("Failed to attach slot");

            let slots = db.get_section_slots(section.id).expect("Query failed");

            assert_eq!(slots.len(), 2);
            assert_eq!(slots[0].day, DayOfWeek::Monday);
            assert_eq!(slots[0].start_time, time("08:00"));
            assert_eq!(slots[1].day, DayOfWeek::Wednesday);
            assert_eq!(slots[1].end_time, time("11:30"));
        }

        it "lists course sections for the active term only" {
            let fall = db
                .create_term(term_input("2025F1", "2025-09-01", "2025-12-20"))
                .expect("Failed to create term");

            db.create_section(section_input("CS101-02", course.id, term.id, instructor.id, 30))
                .expect("Failed to create section");
            db.create_section(section_input("CS101-01", course.id, term.id, instructor.id, 30))
                .expect("Failed to create section");
            db.create_section(section_input("CS101-03", course.id, fall.id, instructor.id, 30))
                .expect("Failed to create section");

            let sections = db.get_course_sections(course.id).expect("Query failed");

            let codes: Vec<&str> = sections
                .iter()
                .map(|s| s.section.section_code.as_str())
                .collect();
            assert_eq!(codes, ["CS101-01", "CS101-02"]);
            assert_eq!(sections[0].instructor_name, "Dr. Emily Chen");
            assert_eq!(sections[0].course_code, "CS101");
            assert_eq!(sections[0].credits, 3);
        }

        it "lists instructor sections across terms newest first" {
            let fall = db
                .create_term(term_input("2025F1", "2025-09-01", "2025-12-20"))
                .expect("Failed to create term");

            db.create_section(section_input("CS101-01", course.id, term.id, instructor.id, 30))
                .expect("Failed to create section");
            db.create_section(section_input("CS101-51", course.id, fall.id, instructor.id, 30))
                .expect("Failed to create section");

            let sections = db
                .get_instructor_sections(instructor.id)
                .expect("Query failed");

            assert_eq!(sections.len(), 2);
            assert_eq!(sections[0].section.section_code, "CS101-51");
            assert_eq!(sections[0].term_name, "Term 2025F1");
            assert_eq!(sections[1].section.section_code, "CS101-01");
        }
    }

    describe "students" {
        it "returns none for accounts without a student profile" {
            let dept = db
                .create_department("CSE", "Computer Science and Engineering")
                .expect("Failed to create department");
            let user = db
                .register_account(instructor_input("20001", Some(dept.id)))
                .expect("Failed to register");

            assert!(db.get_student_profile(user.id).expect("Query failed").is_none());
        }

        it "applies partial updates to account and profile" {
            let user = db
                .register_account(student_input("10001"))
                .expect("Failed to register");
            let student = db
                .get_student_by_user(user.id)
                .expect("Query failed")
                .expect("Profile missing");

            let updated = db
                .update_student(
                    student.id,
                    UpdateStudentInput {
                        name: Some("Alice Johnson".to_string()),
                        email: None,
                        phone: None,
                        college: None,
                        major: Some("Physics".to_string()),
                        year_of_study: Some(3),
                    },
                )
                .expect("Update failed")
                .expect("Student missing");

            assert_eq!(updated.name, "Alice Johnson");
            assert_eq!(updated.email, "10001@university.edu");
            assert_eq!(updated.student.major, "Physics");
            assert_eq!(updated.student.year_of_study, 3);
            assert_eq!(updated.student.college, "Engineering");
        }

        it "returns none when updating a missing student" {
            let result = db
                .update_student(
                    Uuid::new_v4(),
                    UpdateStudentInput {
                        name: None,
                        email: None,
                        phone: None,
                        college: None,
                        major: Some("Physics".to_string()),
                        year_of_study: None,
                    },
                )
                .expect("Update failed");

            assert!(result.is_none());
        }

        it "lists students ordered by student number" {
            db.register_account(student_input("10002")).expect("Failed to register");
            db.register_account(student_input("10001")).expect("Failed to register");

            let students = db.list_students().expect("Query failed");

            let numbers: Vec<&str> = students
                .iter()
                .map(|s| s.student.student_no.as_str())
                .collect();
            assert_eq!(numbers, ["10001", "10002"]);
        }
    }

    describe "instructors" {
        before {
            let dept = db
                .create_department("CSE", "Computer Science and Engineering")
                .expect("Failed to create department");
        }

        it "moves an instructor to another department" {
            let ee = db
                .create_department("EE", "Electrical Engineering")
                .expect("Failed to create department");
            let instructor = register_instructor(&db, "20001", "Dr. Emily Chen", dept.id);

            let updated = db
                .update_instructor(
                    instructor.id,
                    UpdateInstructorInput {
                        name: None,
                        email: None,
                        phone: None,
                        dept_id: Some(ee.id),
                        title: Some("Associate Professor".to_string()),
                        office_location: None,
                        office_hours: None,
                    },
                )
                .expect("Update failed")
                .expect("Instructor missing");

            assert_eq!(updated.dept_name, "Electrical Engineering");
            assert_eq!(updated.instructor.title, "Associate Professor");
            assert_eq!(updated.name, "Dr. Emily Chen");
        }

        it "returns none when updating a missing instructor" {
            register_instructor(&db, "20001", "Dr. Emily Chen", dept.id);

            let result = db
                .update_instructor(
                    Uuid::new_v4(),
                    UpdateInstructorInput {
                        name: None,
                        email: None,
                        phone: None,
                        dept_id: None,
                        title: Some("Professor".to_string()),
                        office_location: None,
                        office_hours: None,
                    },
                )
                .expect("Update failed");

            assert!(result.is_none());
        }

        it "lists instructors ordered by staff number" {
            register_instructor(&db, "20002", "Prof. Michael Davis", dept.id);
            register_instructor(&db, "20001", "Dr. Emily Chen", dept.id);

            let instructors = db.list_instructors().expect("Query failed");

            let numbers: Vec<&str> = instructors
                .iter()
                .map(|i| i.instructor.staff_no.as_str())
                .collect();
            assert_eq!(numbers, ["20001", "20002"]);
        }
    }

    describe "demo data" {
        it "seeds once" {
            assert!(db.seed_demo().expect("Seeding failed"));
            assert!(!db.seed_demo().expect("Seeding failed"));
        }

        it "creates working demo credentials" {
            db.seed_demo().expect("Seeding failed");

            let (student, hash) = db
                .get_user_credentials("10001")
                .expect("Query failed")
                .expect("Demo student missing");
            assert!(student.is_approved);
            assert!(auth::verify_password("student123", &hash));

            let (admin, hash) = db
                .get_user_credentials("99999")
                .expect("Query failed")
                .expect("Demo admin missing");
            assert_eq!(admin.role, Role::Admin);
            assert!(auth::verify_password("admin123", &hash));
        }

        it "gives the demo student a transcript and gpa" {
            db.seed_demo().expect("Seeding failed");

            let (user, _) = db
                .get_user_credentials("10001")
                .expect("Query failed")
                .expect("Demo student missing");
            let profile = db
                .get_student_profile(user.id)
                .expect("Query failed")
                .expect("Profile missing");

            // Two passed courses: A- over 3 credits and A over 4 credits.
            assert_eq!(profile.gpa, 1.1);

            let student = db
                .get_student_by_user(user.id)
                .expect("Query failed")
                .expect("Profile missing");
            let transcript = db
                .get_student_enrollments(student.id)
                .expect("Query failed");
            assert_eq!(transcript.len(), 3);
        }

        it "fills the catalog for the active term" {
            db.seed_demo().expect("Seeding failed");

            let active = db
                .get_active_term()
                .expect("Query failed")
                .expect("No active term");
            assert_eq!(active.code, "2025S1");

            let courses = db.get_courses().expect("Query failed");
            assert_eq!(courses.len(), 5);

            let cs201 = courses
                .iter()
                .find(|c| c.course.code == "CS201")
                .expect("CS201 missing");
            let sections = db.get_course_sections(cs201.course.id).expect("Query failed");
            assert_eq!(sections.len(), 1);
            assert_eq!(sections[0].section.section_code, "CS201-01");
            assert_eq!(sections[0].section.seats_taken, 12);
        }
    }

    describe "persistence" {
        it "keeps data across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("registrar.db");

            {
                let db = Database::open(path.clone()).expect("Failed to open database");
                db.migrate().expect("Failed to run migrations");
                db.create_department("CSE", "Computer Science and Engineering")
                    .expect("Failed to create department");
            }

            let db = Database::open(path).expect("Failed to reopen database");
            db.migrate().expect("Failed to run migrations");

            let departments = db.get_departments().expect("Query failed");
            assert_eq!(departments.len(), 1);
            assert_eq!(departments[0].code, "CSE");
        }
    }
}
