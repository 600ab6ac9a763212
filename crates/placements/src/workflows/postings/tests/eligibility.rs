use std::collections::BTreeSet;

use super::common::student;
use crate::workflows::postings::domain::{
    EligibilityCriteria, Gender, GenderPreference, StudentId,
};
use crate::workflows::postings::eligibility::{
    ineligibility_reasons, is_eligible, IneligibilityReason,
};

#[test]
fn blank_criteria_admit_everyone() {
    let criteria = EligibilityCriteria::default();

    let strong = student("s1", 9.8, 2024, "CSE");
    let weak = {
        let mut s = student("s2", 0.0, 1999, "ECE");
        s.current_arrears = 12;
        s.history_arrears = 20;
        s.gender = Gender::Male;
        s
    };

    assert!(is_eligible(&criteria, &strong));
    assert!(is_eligible(&criteria, &weak));
    assert!(ineligibility_reasons(&criteria, &weak).is_empty());
}

#[test]
fn minimum_cgpa_boundary_is_inclusive() {
    let criteria = EligibilityCriteria {
        min_cgpa: 7.5,
        ..EligibilityCriteria::default()
    };

    assert!(is_eligible(&criteria, &student("s1", 7.5, 2024, "CSE")));
    assert!(!is_eligible(&criteria, &student("s2", 7.49, 2024, "CSE")));
}

#[test]
fn cgpa_range_applies_both_bounds() {
    let criteria = EligibilityCriteria {
        min_cgpa: 6.0,
        max_cgpa: Some(8.0),
        ..EligibilityCriteria::default()
    };

    assert!(!is_eligible(&criteria, &student("s1", 5.9, 2024, "CSE")));
    assert!(is_eligible(&criteria, &student("s2", 6.0, 2024, "CSE")));
    assert!(is_eligible(&criteria, &student("s3", 8.0, 2024, "CSE")));
    assert!(!is_eligible(&criteria, &student("s4", 8.1, 2024, "CSE")));
}

#[test]
fn arrears_caps_are_inclusive_when_set() {
    let criteria = EligibilityCriteria {
        max_current_arrears: Some(1),
        max_history_arrears: Some(2),
        ..EligibilityCriteria::default()
    };

    let mut ok = student("s1", 8.0, 2024, "CSE");
    ok.current_arrears = 1;
    ok.history_arrears = 2;
    assert!(is_eligible(&criteria, &ok));

    let mut too_many = ok.clone();
    too_many.current_arrears = 2;
    assert!(!is_eligible(&criteria, &too_many));

    let mut history_heavy = ok.clone();
    history_heavy.history_arrears = 3;
    assert!(!is_eligible(&criteria, &history_heavy));
}

#[test]
fn gender_preference_restricts_only_when_specific() {
    let restricted = EligibilityCriteria {
        gender_preference: GenderPreference::Female,
        ..EligibilityCriteria::default()
    };

    let female = student("s1", 8.0, 2024, "CSE");
    let mut male = student("s2", 8.0, 2024, "CSE");
    male.gender = Gender::Male;

    assert!(is_eligible(&restricted, &female));
    assert!(!is_eligible(&restricted, &male));
    assert_eq!(
        ineligibility_reasons(&restricted, &male),
        vec![IneligibilityReason::GenderRestricted]
    );
}

#[test]
fn batch_and_department_sets_restrict_membership() {
    let criteria = EligibilityCriteria {
        eligible_batches: BTreeSet::from([2024, 2025]),
        eligible_departments: BTreeSet::from(["CSE".to_string()]),
        ..EligibilityCriteria::default()
    };

    assert!(is_eligible(&criteria, &student("s1", 8.0, 2024, "CSE")));
    assert!(!is_eligible(&criteria, &student("s2", 8.0, 2023, "CSE")));
    assert!(!is_eligible(&criteria, &student("s3", 8.0, 2024, "MECH")));
}

#[test]
fn excluded_students_are_rejected_regardless_of_merit() {
    let criteria = EligibilityCriteria {
        excluded_students: BTreeSet::from([StudentId("s1".to_string())]),
        ..EligibilityCriteria::default()
    };

    assert!(!is_eligible(&criteria, &student("s1", 10.0, 2024, "CSE")));
    assert!(is_eligible(&criteria, &student("s2", 10.0, 2024, "CSE")));
}

#[test]
fn reasons_accumulate_across_failing_rules() {
    let criteria = EligibilityCriteria {
        min_cgpa: 8.0,
        max_current_arrears: Some(0),
        eligible_batches: BTreeSet::from([2025]),
        ..EligibilityCriteria::default()
    };

    let mut candidate = student("s1", 6.5, 2024, "CSE");
    candidate.current_arrears = 2;

    let reasons = ineligibility_reasons(&criteria, &candidate);
    assert_eq!(reasons.len(), 3);
    assert!(reasons
        .iter()
        .any(|r| matches!(r, IneligibilityReason::CgpaBelowMinimum { .. })));
    assert!(reasons
        .iter()
        .any(|r| matches!(r, IneligibilityReason::TooManyCurrentArrears { .. })));
    assert!(reasons
        .iter()
        .any(|r| matches!(r, IneligibilityReason::BatchNotEligible { batch: 2024 })));
}
