use usecase_builder::model::{Priority, RequirementType, UseCase};
use usecase_builder::requirements::{
    finalize_requirements, parse_drafts, BannedWordFilter, RequirementError,
};

const DRAFTS: &str = r#"```json
{
  "requirements": [
    {"type": "functional", "description": "The gateway validates the OTP before login.", "priority": "high"},
    {"type": "non-functional", "description": "It is required that login completes within 2 seconds.", "priority": "medium"},
    {"type": "functional", "description": "", "priority": "low"}
  ]
}
```"#;

#[test]
fn test_drafts_are_normalized() {
    let drafts = parse_drafts(DRAFTS).unwrap();
    let requirements = finalize_requirements("uc-1", drafts, &BannedWordFilter::default()).unwrap();

    assert_eq!(requirements.len(), 3);
    assert_eq!(
        requirements[0].description,
        "It is required that The gateway validates the OTP before login."
    );
    assert_eq!(
        requirements[1].description,
        "It is recommended that login completes within 2 seconds."
    );
    assert_eq!(
        requirements[2].description,
        "It optionally can the actor performs the required operation."
    );
    assert_eq!(requirements[1].kind, RequirementType::NonFunctional);
    assert_eq!(requirements[2].priority, Priority::Low);
    assert!(requirements.iter().all(|r| r.use_case_id == "uc-1" && !r.selected));
}

#[test]
fn test_requirement_ids_are_unique() {
    let drafts = parse_drafts(DRAFTS).unwrap();
    let requirements = finalize_requirements("uc-1", drafts, &BannedWordFilter::default()).unwrap();

    let mut ids: Vec<&str> = requirements.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_banned_words_reject_the_batch() {
    let drafts = parse_drafts(
        r#"{"requirements": [
            {"type": "functional", "description": "The user should log in.", "priority": "high"},
            {"type": "functional", "description": "The gateway logs access.", "priority": "low"},
            {"type": "functional", "description": "Sessions MAY expire.", "priority": "low"}
        ]}"#,
    )
    .unwrap();

    match finalize_requirements("uc-2", drafts, &BannedWordFilter::default()) {
        Err(RequirementError::BannedWords { offending, .. }) => {
            assert_eq!(offending, vec!["The user should log in.", "Sessions MAY expire."]);
        }
        other => panic!("expected banned word rejection, got {other:?}"),
    }
}

#[test]
fn test_custom_banned_words() {
    let filter = BannedWordFilter::new(&["must", " "]).unwrap();
    assert_eq!(filter.words(), ["must"]);
    assert!(filter.is_banned("The system must respond"));
    assert!(!filter.is_banned("The user should log in"));

    let permissive = BannedWordFilter::new::<&str>(&[]).unwrap();
    assert!(!permissive.is_banned("anything may go"));
}

#[test]
fn test_selection_toggles() {
    let mut use_case = UseCase::from_json(r#"{"id": "uc-3", "title": "T", "flow": []}"#).unwrap();
    let drafts = parse_drafts(DRAFTS).unwrap();
    use_case.requirements = finalize_requirements(&use_case.id, drafts, &BannedWordFilter::default()).unwrap();

    let id = use_case.requirements[1].id.clone();
    assert!(use_case.toggle_requirement(&id));
    assert_eq!(use_case.selected_requirements().count(), 1);

    assert!(use_case.toggle_requirement(&id));
    assert_eq!(use_case.selected_requirements().count(), 0);

    assert!(!use_case.toggle_requirement("missing"));
}

#[test]
fn test_malformed_drafts_fail_to_parse() {
    assert!(matches!(parse_drafts("not json"), Err(RequirementError::Parse(_))));
}
