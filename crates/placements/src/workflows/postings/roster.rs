use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{Gender, StudentId, StudentRecord};

/// Error raised while importing a student roster export.
#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("unable to read roster file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed roster row: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognized gender '{value}'")]
    InvalidGender { row: usize, value: String },
}

/// Parse a registrar CSV export into student records for the directory.
///
/// Expected headers: `Register No`, `Name`, `CGPA`, `Current Arrears`,
/// `History Arrears`, `Gender`, `Batch`, `Department`.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<StudentRecord>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut students = Vec::new();
    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = record?;
        let gender = parse_gender(&row.gender).ok_or_else(|| RosterImportError::InvalidGender {
            row: index + 2,
            value: row.gender.clone(),
        })?;

        students.push(StudentRecord {
            id: StudentId(row.register_no),
            name: row.name,
            cgpa: row.cgpa,
            current_arrears: row.current_arrears,
            history_arrears: row.history_arrears,
            gender,
            batch: row.batch,
            department: row.department,
        });
    }

    Ok(students)
}

pub fn load_roster(path: &Path) -> Result<Vec<StudentRecord>, RosterImportError> {
    let file = File::open(path)?;
    parse_roster(file)
}

fn parse_gender(raw: &str) -> Option<Gender> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "m" | "male" => Some(Gender::Male),
        "f" | "female" => Some(Gender::Female),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Register No")]
    register_no: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CGPA")]
    cgpa: f32,
    #[serde(rename = "Current Arrears", default)]
    current_arrears: u8,
    #[serde(rename = "History Arrears", default)]
    history_arrears: u8,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Batch")]
    batch: u16,
    #[serde(rename = "Department")]
    department: String,
}
