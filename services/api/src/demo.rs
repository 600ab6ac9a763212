use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Args;

use crate::infra::{InMemoryJobStore, InMemoryNotificationSink, InMemoryStudentDirectory};
use placements::error::AppError;
use placements::workflows::postings::{
    load_roster, parse_roster, EligibilityCriteria, FanoutDispatcher, JobDetails, JobDraft,
    JobLifecycleService, LifecycleReconciler, PublishMode, PublishSchedule,
};

/// Roster used when no CSV export is supplied on the command line.
const SAMPLE_ROSTER: &str = "\
Register No,Name,CGPA,Current Arrears,History Arrears,Gender,Batch,Department
2024CS001,Anita Raghavan,8.9,0,0,F,2024,CSE
2024CS014,Vikram Iyer,7.1,1,2,M,2024,CSE
2024EC007,Meera Pillai,8.2,0,1,F,2024,ECE
2023ME021,Rahul Nair,6.4,2,4,M,2023,MECH
2023CS030,Divya Menon,9.3,0,0,F,2023,CSE
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Student roster CSV to fan out against (defaults to a built-in sample)
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let students = match args.roster {
        Some(path) => load_roster(&path)?,
        None => parse_roster(Cursor::new(SAMPLE_ROSTER))?,
    };
    println!("Loaded {} students into the directory", students.len());

    let store = Arc::new(InMemoryJobStore::default());
    let directory = Arc::new(InMemoryStudentDirectory::default());
    directory.seed(students);
    let sink = Arc::new(InMemoryNotificationSink::default());

    let dispatcher = FanoutDispatcher::new(directory, sink.clone());
    let service = Arc::new(JobLifecycleService::new(store.clone(), dispatcher.clone()));
    let reconciler = LifecycleReconciler::new(store, dispatcher);

    let now = Utc::now();
    let deadline = now + Duration::days(14);

    let immediate = service
        .create_job(
            demo_draft(
                "Aurora Systems",
                "Graduate Engineer",
                PublishMode::Immediate,
                None,
                deadline,
                EligibilityCriteria {
                    min_cgpa: 7.0,
                    ..EligibilityCriteria::default()
                },
            ),
            now,
        )
        .await?;
    print_outcome("Immediate posting", &immediate);

    let overdue = service
        .create_job(
            demo_draft(
                "Northwind Analytics",
                "Data Analyst",
                PublishMode::Scheduled,
                Some(now - Duration::minutes(5)),
                deadline,
                EligibilityCriteria {
                    eligible_batches: BTreeSet::from([2024]),
                    ..EligibilityCriteria::default()
                },
            ),
            now,
        )
        .await?;
    print_outcome("Past-dated scheduled posting", &overdue);

    let pending = service
        .create_job(
            demo_draft(
                "Helios Labs",
                "Research Intern",
                PublishMode::Scheduled,
                Some(now + Duration::hours(2)),
                deadline,
                EligibilityCriteria::default(),
            ),
            now,
        )
        .await?;
    print_outcome("Future scheduled posting", &pending);

    let report = reconciler
        .run_tick(now + Duration::hours(3))
        .await
        .map_err(placements::workflows::postings::LifecycleError::Store)?;
    println!(
        "\nReconciler tick (clock advanced 3h): due={} published={} lost_races={} errors={}",
        report.due,
        report.published,
        report.lost_races,
        report.errors.len()
    );

    println!("\nNotifications delivered:");
    for notification in sink.all() {
        println!("  {} <- {}", notification.recipient, notification.title);
    }

    Ok(())
}

fn demo_draft(
    company: &str,
    position: &str,
    mode: PublishMode,
    publish_at: Option<chrono::DateTime<Utc>>,
    deadline: chrono::DateTime<Utc>,
    criteria: EligibilityCriteria,
) -> JobDraft {
    JobDraft {
        details: JobDetails {
            company: company.to_string(),
            position: position.to_string(),
            description: format!("{position} opening at {company}"),
            location: Some("Chennai".to_string()),
            salary: None,
        },
        schedule: PublishSchedule {
            mode,
            scheduled_publish_at: publish_at,
            scheduled_close_at: None,
            application_deadline: deadline,
        },
        criteria,
    }
}

fn print_outcome(label: &str, outcome: &placements::workflows::postings::PublishOutcome) {
    match &outcome.fanout {
        Some(fanout) => println!(
            "{label}: {} is {} (eligible {}, delivered {}, failed {})",
            outcome.job.id,
            outcome.job.status,
            fanout.eligible,
            fanout.delivered,
            fanout.failures.len()
        ),
        None => println!(
            "{label}: {} is {} (no fan-out yet)",
            outcome.job.id, outcome.job.status
        ),
    }
}
