use std::fmt;

use super::domain::{EligibilityCriteria, StudentRecord};

/// Pure eligibility predicate: every configured rule must hold. Criteria left
/// unset place no restriction, so a blank posting admits everyone.
pub fn is_eligible(criteria: &EligibilityCriteria, student: &StudentRecord) -> bool {
    let cgpa_ok = match criteria.max_cgpa {
        Some(max) => student.cgpa >= criteria.min_cgpa && student.cgpa <= max,
        None => student.cgpa >= criteria.min_cgpa,
    };

    cgpa_ok
        && criteria
            .max_current_arrears
            .map_or(true, |max| student.current_arrears <= max)
        && criteria
            .max_history_arrears
            .map_or(true, |max| student.history_arrears <= max)
        && criteria.gender_preference.admits(student.gender)
        && (criteria.eligible_batches.is_empty()
            || criteria.eligible_batches.contains(&student.batch))
        && (criteria.eligible_departments.is_empty()
            || criteria.eligible_departments.contains(&student.department))
        && !criteria.excluded_students.contains(&student.id)
}

/// Why a student misses a posting, for the student-facing eligibility breakdown.
#[derive(Debug, Clone, PartialEq)]
pub enum IneligibilityReason {
    CgpaBelowMinimum { required: f32, actual: f32 },
    CgpaAboveMaximum { allowed: f32, actual: f32 },
    TooManyCurrentArrears { allowed: u8, actual: u8 },
    TooManyHistoryArrears { allowed: u8, actual: u8 },
    GenderRestricted,
    BatchNotEligible { batch: u16 },
    DepartmentNotEligible { department: String },
    ExplicitlyExcluded,
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibilityReason::CgpaBelowMinimum { required, actual } => {
                write!(f, "CGPA {actual:.2} below required {required:.2}")
            }
            IneligibilityReason::CgpaAboveMaximum { allowed, actual } => {
                write!(f, "CGPA {actual:.2} above allowed maximum {allowed:.2}")
            }
            IneligibilityReason::TooManyCurrentArrears { allowed, actual } => {
                write!(f, "{actual} current arrear(s) exceeds allowed {allowed}")
            }
            IneligibilityReason::TooManyHistoryArrears { allowed, actual } => {
                write!(f, "{actual} history arrear(s) exceeds allowed {allowed}")
            }
            IneligibilityReason::GenderRestricted => {
                write!(f, "posting restricted to a different gender")
            }
            IneligibilityReason::BatchNotEligible { batch } => {
                write!(f, "batch {batch} not in the eligible batches")
            }
            IneligibilityReason::DepartmentNotEligible { department } => {
                write!(f, "department {department} not in the eligible departments")
            }
            IneligibilityReason::ExplicitlyExcluded => {
                write!(f, "student excluded from this posting")
            }
        }
    }
}

/// Itemized counterpart of [`is_eligible`] used for display; an empty list means
/// the student qualifies.
pub fn ineligibility_reasons(
    criteria: &EligibilityCriteria,
    student: &StudentRecord,
) -> Vec<IneligibilityReason> {
    let mut reasons = Vec::new();

    if student.cgpa < criteria.min_cgpa {
        reasons.push(IneligibilityReason::CgpaBelowMinimum {
            required: criteria.min_cgpa,
            actual: student.cgpa,
        });
    }
    if let Some(max) = criteria.max_cgpa {
        if student.cgpa > max {
            reasons.push(IneligibilityReason::CgpaAboveMaximum {
                allowed: max,
                actual: student.cgpa,
            });
        }
    }
    if let Some(max) = criteria.max_current_arrears {
        if student.current_arrears > max {
            reasons.push(IneligibilityReason::TooManyCurrentArrears {
                allowed: max,
                actual: student.current_arrears,
            });
        }
    }
    if let Some(max) = criteria.max_history_arrears {
        if student.history_arrears > max {
            reasons.push(IneligibilityReason::TooManyHistoryArrears {
                allowed: max,
                actual: student.history_arrears,
            });
        }
    }
    if !criteria.gender_preference.admits(student.gender) {
        reasons.push(IneligibilityReason::GenderRestricted);
    }
    if !criteria.eligible_batches.is_empty() && !criteria.eligible_batches.contains(&student.batch)
    {
        reasons.push(IneligibilityReason::BatchNotEligible {
            batch: student.batch,
        });
    }
    if !criteria.eligible_departments.is_empty()
        && !criteria.eligible_departments.contains(&student.department)
    {
        reasons.push(IneligibilityReason::DepartmentNotEligible {
            department: student.department.clone(),
        });
    }
    if criteria.excluded_students.contains(&student.id) {
        reasons.push(IneligibilityReason::ExplicitlyExcluded);
    }

    reasons
}
