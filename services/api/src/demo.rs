use chrono::{DateTime, Duration, Utc};
use clap::Args;
use jobtrail::error::AppError;
use jobtrail::lifecycle::{
    Actor, ApplicationStore, ApplicationView, InMemoryTrackerStore, InterviewType,
    NewApplication, RetryPolicy, TrackerState, UserId,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Owner recorded on the demo application
    #[arg(long, default_value = "demo-user")]
    pub(crate) owner: String,
    /// Timestamp the scripted timeline starts at (RFC 3339, defaults to now)
    #[arg(long, value_parser = crate::infra::parse_datetime)]
    pub(crate) start: Option<DateTime<Utc>>,
}

/// Scripted walk through the lifecycle: create, advance stages, schedule and
/// complete an interview round, ingest a message, then print the audit trail
/// and the derived activity timeline.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(Utc::now);
    let actor = Actor(args.owner.clone());

    let store = Arc::new(InMemoryTrackerStore::default());
    let tracker = TrackerState::with_store(store.clone(), RetryPolicy::default());

    println!("Jobtrail lifecycle demo");

    let application = match tracker.machine().create(
        NewApplication {
            owner: UserId(args.owner),
            company_ref: Some("company-demo".to_string()),
            platform_ref: Some("linkedin".to_string()),
        },
        start,
    ) {
        Ok(application) => application,
        Err(err) => {
            println!("  Creation failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- Created {} at stage '{}' ({})",
        application.id.0, application.stage, start
    );

    let steps = [
        ("recruiter_reachout", start + Duration::hours(2)),
        ("hr_shortlist", start + Duration::days(1)),
        ("interview_round_1", start + Duration::days(3)),
    ];
    for (stage, at) in steps {
        match tracker
            .machine()
            .transition(&application.id, stage, actor.clone(), at)
        {
            Ok(outcome) if outcome.applied() => {
                println!("- Moved to '{stage}' at {at}")
            }
            Ok(_) => println!("- Already at '{stage}', nothing written"),
            Err(err) => println!("  Transition to '{stage}' rejected: {err}"),
        }
    }

    let scheduled_at = start + Duration::days(5);
    match tracker.rounds().schedule(
        &application.id,
        1,
        InterviewType::PhoneScreen,
        None,
        scheduled_at,
    ) {
        Ok(round) => println!(
            "- Scheduled interview round {} ({}) for {scheduled_at}",
            round.round,
            round.interview_type.label()
        ),
        Err(err) => println!("  Scheduling rejected: {err}"),
    }

    let completed_at = scheduled_at + Duration::hours(1);
    match tracker.rounds().complete(
        &application.id,
        1,
        completed_at,
        Some("advanced to round 2".to_string()),
    ) {
        Ok(round) => println!(
            "- Completed round {} at {completed_at} ({})",
            round.round,
            round.result.as_deref().unwrap_or("no result recorded")
        ),
        Err(err) => println!("  Completion rejected: {err}"),
    }

    let message_at = completed_at + Duration::hours(3);
    match tracker.record_conversation(&application.id, message_at) {
        Ok(()) => println!("- Ingested recruiter reply at {message_at}"),
        Err(err) => println!("  Conversation event rejected: {err}"),
    }

    match tracker.machine().history(&application.id) {
        Ok(history) => {
            println!("\nStage history");
            for transition in &history {
                println!(
                    "- {} -> {} by {} at {}",
                    transition.from_stage,
                    transition.to_stage,
                    transition.actor.0,
                    transition.changed_at
                );
            }
        }
        Err(err) => println!("  History unavailable: {err}"),
    }

    let stored = match ApplicationStore::fetch(store.as_ref(), &application.id) {
        Ok(Some(application)) => application,
        Ok(None) => {
            println!("  Store lookup returned no record");
            return Ok(());
        }
        Err(err) => {
            println!("  Store unavailable: {err}");
            return Ok(());
        }
    };
    println!(
        "\nDerived activity: {} (created {})",
        stored.last_activity_at, stored.created_at
    );

    let round = match tracker.rounds().round(&application.id, 1) {
        Ok(round) => round,
        Err(err) => {
            println!("  Round lookup failed: {err}");
            None
        }
    };
    let view = ApplicationView::new(&stored, round.as_ref());
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("\nPublic application payload:\n{json}"),
        Err(err) => println!("  Payload unavailable: {err}"),
    }

    Ok(())
}
