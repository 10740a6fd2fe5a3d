use serde_json::json;

use super::common::*;
use crate::lifecycle::domain::{InterviewType, RoundStatus};
use crate::lifecycle::stage::{Stage, StandardStage};
use crate::lifecycle::wire::{StageKind, StageView};

#[test]
fn standard_stages_carry_no_interview_fields() {
    let view = StageView::from_stage(&Stage::Standard(StandardStage::HrShortlist), None);

    assert_eq!(view.id, "hr_shortlist");
    assert_eq!(view.name, "HR Shortlist");
    assert_eq!(view.kind, StageKind::Standard);
    assert_eq!(view.interview_round_number, None);
    assert_eq!(view.interview_data, None);

    let payload = serde_json::to_value(&view).expect("serializes");
    assert_eq!(
        payload,
        json!({ "id": "hr_shortlist", "name": "HR Shortlist", "type": "standard" })
    );
}

#[test]
fn interview_stage_embeds_the_matching_round() {
    let id = crate::lifecycle::domain::ApplicationId("app-wire".to_string());
    let mut round = unscheduled_round(&id, 2);
    round.interview_type = InterviewType::Technical;
    round.status = RoundStatus::Scheduled;
    round.scheduled_at = Some(ts(12, 0));

    let view = StageView::from_stage(&Stage::InterviewRound(2), Some(&round));
    assert_eq!(view.id, "interview_round_2");
    assert_eq!(view.kind, StageKind::InterviewRound);
    assert_eq!(view.interview_round_number, Some(2));
    let data = view.interview_data.as_ref().expect("interview data");
    assert_eq!(data.status, RoundStatus::Scheduled);
    assert_eq!(data.scheduled_at, Some(ts(12, 0)));
}

#[test]
fn mismatched_round_records_are_not_embedded() {
    let id = crate::lifecycle::domain::ApplicationId("app-wire".to_string());
    let round = unscheduled_round(&id, 3);

    let view = StageView::from_stage(&Stage::InterviewRound(2), Some(&round));
    assert_eq!(view.interview_round_number, Some(2));
    assert_eq!(view.interview_data, None);
}

#[test]
fn wire_views_reduce_back_to_the_raw_stage() {
    for stage in [
        Stage::wishlist(),
        Stage::Standard(StandardStage::Offer),
        Stage::InterviewRound(5),
    ] {
        let view = StageView::from_stage(&stage, None);
        assert_eq!(view.stage(), Ok(stage));
    }
}
