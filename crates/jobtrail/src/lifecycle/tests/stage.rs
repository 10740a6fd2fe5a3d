use crate::lifecycle::stage::{
    format_interview_round, parse_interview_round, Milestone, Stage, StageError, StandardStage,
};

#[test]
fn parses_every_standard_stage() {
    for stage in StandardStage::ordered() {
        assert_eq!(Stage::parse(stage.id()), Ok(Stage::Standard(stage)));
    }
}

#[test]
fn parses_interview_round_identifiers() {
    assert_eq!(
        Stage::parse("interview_round_1"),
        Ok(Stage::InterviewRound(1))
    );
    assert_eq!(
        Stage::parse("interview_round_12"),
        Ok(Stage::InterviewRound(12))
    );
}

#[test]
fn rejects_free_text_and_malformed_rounds() {
    for raw in [
        "",
        "interviewing",
        "interview_round_",
        "interview_round_0",
        "interview_round_01",
        "interview_round_x",
        "interview_round_-1",
        "interview_round_1 ",
        "Interview_Round_1",
        "offer ",
    ] {
        match Stage::parse(raw) {
            Err(StageError::InvalidStage(rejected)) => assert_eq!(rejected, raw),
            other => panic!("expected '{raw}' to be rejected, got {other:?}"),
        }
        assert!(!Stage::is_valid(raw));
    }
}

#[test]
fn interview_round_round_trips_through_format_and_parse() {
    for round in [1_u32, 2, 7, 40, 1042] {
        let formatted = format_interview_round(round).expect("positive round formats");
        assert_eq!(parse_interview_round(&formatted), Some(round));
        assert_eq!(format_interview_round(round).unwrap(), formatted);
    }
}

#[test]
fn parse_interview_round_is_empty_for_standard_stages() {
    for stage in StandardStage::ordered() {
        assert_eq!(parse_interview_round(stage.id()), None);
    }
}

#[test]
fn round_zero_is_a_caller_error() {
    assert_eq!(
        format_interview_round(0),
        Err(StageError::InvalidRound(0))
    );
    assert_eq!(Stage::interview_round(0), Err(StageError::InvalidRound(0)));
}

#[test]
fn display_matches_the_persisted_identifier() {
    assert_eq!(Stage::wishlist().to_string(), "wishlist");
    assert_eq!(
        Stage::Standard(StandardStage::HmShortlist).to_string(),
        "hm_shortlist"
    );
    assert_eq!(Stage::InterviewRound(3).to_string(), "interview_round_3");
}

#[test]
fn serializes_as_the_raw_stage_string() {
    let value = serde_json::to_value(Stage::InterviewRound(2)).expect("serializes");
    assert_eq!(value, serde_json::json!("interview_round_2"));

    let parsed: Stage =
        serde_json::from_value(serde_json::json!("hr_shortlist")).expect("deserializes");
    assert_eq!(parsed, Stage::Standard(StandardStage::HrShortlist));

    assert!(serde_json::from_value::<Stage>(serde_json::json!("daydreaming")).is_err());
}

#[test]
fn milestone_derivation_follows_the_stage() {
    assert_eq!(Stage::wishlist().milestone(), Milestone::Active);
    assert_eq!(Stage::InterviewRound(4).milestone(), Milestone::Active);
    assert_eq!(
        Stage::Standard(StandardStage::Offer).milestone(),
        Milestone::Offer
    );
}

#[test]
fn labels_are_human_readable() {
    assert_eq!(Stage::InterviewRound(3).label(), "Interview Round 3");
    assert_eq!(
        Stage::Standard(StandardStage::RecruiterReachout).label(),
        "Recruiter Reachout"
    );
}
