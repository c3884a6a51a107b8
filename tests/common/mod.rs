//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::time::Duration;

use chrono::NaiveDate;
use student_records::logging::init_test_tracing;
use student_records::{Database, Student, StudentFields};

/// Fresh in-memory database with the student tables in place
pub async fn test_db() -> Database {
    let db = bare_db().await;
    db.ensure_schema().await.expect("schema should be created");
    db
}

/// In-memory database without any tables
pub async fn bare_db() -> Database {
    init_test_tracing();
    Database::connect("sqlite::memory:", 1, Duration::from_secs(5))
        .await
        .expect("in-memory database should connect")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn fields(fullname: &str, email: &str, sat_score: i64, birthdate: &str) -> StudentFields {
    StudentFields {
        fullname: fullname.to_string(),
        birthdate: date(birthdate),
        sat_score,
        graduation_score: 3.0,
        phone: "555-0100".to_string(),
        email: email.to_string(),
    }
}

/// (fullname, sat_score, birthdate, graduation_score, course scores)
const ROSTER: &[(&str, i64, &str, f64, &[f64])] = &[
    ("Ann Smith", 1400, "2004-03-01", 3.2, &[80.0, 90.0]),
    ("Bob Jones", 1600, "2003-11-20", 3.9, &[70.0]),
    ("Carla SMITHERS", 1399, "2005-01-15", 2.8, &[]),
    ("dave o'neil", 1050, "2004-03-01", 3.0, &[]),
    ("Eve Adams", 1601, "2002-07-07", 3.5, &[100.0, 60.0, 95.0]),
    ("Frank 100%_Real", 1200, "2006-12-31", 2.1, &[]),
    ("Grace Hopper", 1500, "2003-12-09", 4.0, &[88.0]),
    ("Hank Smith", 1400, "2005-06-30", 3.3, &[]),
    ("Ivy Chen", 980, "2004-09-09", 3.7, &[75.5]),
    ("Jose Alvarez", 1550, "2002-02-02", 3.1, &[]),
    ("Kim Lee", 1600, "2006-01-01", 3.6, &[64.0, 66.0]),
    ("Liam Smithson", 1250, "2003-05-05", 2.9, &[]),
];

/// Insert the standard roster (with grades) and return the stored students
pub async fn seed_roster(db: &Database) -> Vec<Student> {
    let repo = db.students();
    let mut students = Vec::new();

    for (i, (name, sat_score, birthdate, graduation_score, grades)) in ROSTER.iter().enumerate() {
        let student = repo
            .create(StudentFields {
                fullname: name.to_string(),
                birthdate: date(birthdate),
                sat_score: *sat_score,
                graduation_score: *graduation_score,
                phone: format!("555-01{:02}", ROSTER.len() - i),
                email: format!("student{}@x.com", i + 1),
            })
            .await
            .expect("roster student should be created");

        for score in grades.iter() {
            repo.record_grade(student.id, *score)
                .await
                .expect("grade should be recorded");
        }
        students.push(student);
    }

    students
}

/// Mean of the roster grades for a student name, as the listing reports it
pub fn expected_avg(fullname: &str) -> Option<f64> {
    let (_, _, _, _, grades) = ROSTER.iter().find(|(name, ..)| *name == fullname)?;
    if grades.is_empty() {
        None
    } else {
        Some(grades.iter().sum::<f64>() / grades.len() as f64)
    }
}
