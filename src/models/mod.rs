//! Domain models for the registrar.
//!
//! # Core Concepts
//!
//! ## Accounts
//!
//! - [`User`]: One login account with a [`Role`]. Students and instructors
//!   carry an extra profile row ([`Student`], [`Instructor`]) keyed by
//!   `user_id`; admins are a bare account.
//!
//! ## Catalog
//!
//! - [`Department`], [`Course`]: the offering hierarchy. Courses know their
//!   credits and prerequisites.
//! - [`Term`]: an academic period. Exactly one term is active at a time.
//! - [`Section`]: a course offered in a term with a capacity, an instructor
//!   of record, and weekly [`TimeSlot`]s.
//!
//! ## Registration
//!
//! - [`Enrollment`]: a student's row in a section, moving through the
//!   [`EnrollmentStatus`] lifecycle. Rows are never hard-deleted; dropping
//!   is a status change.

mod course;
mod enrollment;
mod instructor;
mod section;
mod student;
mod term;
mod user;

pub use course::*;
pub use enrollment::*;
pub use instructor::*;
pub use section::*;
pub use student::*;
pub use term::*;
pub use user::*;
