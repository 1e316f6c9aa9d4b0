use chrono::{Duration, Utc};
use clap::Args;

use crate::infra::build_marketplace;
use hearthwork::error::AppError;
use hearthwork::marketplace::events::{Actor, DomainEvent};
use hearthwork::marketplace::jobs::domain::{
    ApplicationDraft, JobBenefits, JobDraft, PayFrequency, UserId,
};
use hearthwork::marketplace::messaging::domain::MessageKind;
use hearthwork::marketplace::messaging::MessageDraft;
use hearthwork::marketplace::notifications::repository::NotificationRepository;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Household id used for the scripted walkthrough
    #[arg(long, default_value = "household-demo")]
    pub(crate) household: String,
    /// Worker id used for the scripted walkthrough
    #[arg(long, default_value = "worker-demo")]
    pub(crate) worker: String,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let marketplace = build_marketplace();
    let household = UserId(args.household);
    let worker = UserId(args.worker);
    let household_actor = Actor::household(household.clone());
    let worker_actor = Actor::worker(worker.clone());

    println!("=== Hearthwork marketplace demo ===\n");

    let draft = JobDraft {
        title: "House cleaning help".to_string(),
        service_type: "cleaning".to_string(),
        description: "Weekly deep clean of a two-bedroom apartment".to_string(),
        schedule: "Saturdays 09:00-13:00".to_string(),
        salary: 5000,
        pay_frequency: PayFrequency::Monthly,
        household_id: household.clone(),
        household_name: "Demo Household".to_string(),
        location: "Des Moines".to_string(),
        benefits: JobBenefits {
            meals: true,
            ..JobBenefits::default()
        },
    };
    let job = marketplace.engine.create_job(draft, &household_actor)?.job;
    println!("posted job {} ({})", job.id, job.status);

    marketplace.registry.apply(
        &job.id,
        ApplicationDraft {
            worker_id: worker.clone(),
            worker_name: "Demo Worker".to_string(),
            cover_letter: Some("Five years of experience".to_string()),
            proposed_rate: Some(4800),
        },
    )?;
    println!("{worker} applied");

    marketplace.messaging.send_message(MessageDraft {
        sender_id: worker.clone(),
        receiver_id: household.clone(),
        content: "I can start this Saturday".to_string(),
        kind: MessageKind::Text,
        job_id: Some(job.id.clone()),
    })?;
    println!("{worker} messaged the household");

    let job = marketplace
        .engine
        .assign_worker(&job.id, &worker, &household_actor)?
        .job;
    println!("assigned -> {}", job.status);

    let job = marketplace
        .engine
        .update_eta(
            &job.id,
            Utc::now() + Duration::minutes(45),
            "Ingersoll Ave".to_string(),
            &worker_actor,
        )?
        .job;
    println!("eta reported -> {}", job.status);

    let job = marketplace
        .engine
        .confirm_arrival(&job.id, "Front porch".to_string(), &worker_actor)?
        .job;
    println!("arrived -> {}", job.status);

    marketplace.engine.start_work(&job.id, &worker_actor)?;
    let job = marketplace.engine.complete_job(&job.id, &worker_actor)?.job;
    println!("completed -> {}\n", job.status);

    // payments settle outside the lifecycle engine; the dispatcher still
    // fans the confirmation out to the worker
    marketplace
        .dispatcher
        .dispatch(&DomainEvent::PaymentCompleted {
            payment_id: format!("pay-{}", job.id),
            job_id: Some(job.id.clone()),
            worker_id: worker.clone(),
            amount: job.salary,
        })?;

    render_inbox(marketplace.notifications.as_ref(), "household inbox", &household)?;
    render_inbox(marketplace.notifications.as_ref(), "worker inbox", &worker)?;

    Ok(())
}

fn render_inbox<N>(store: &N, heading: &str, user: &UserId) -> Result<(), AppError>
where
    N: NotificationRepository,
{
    let notifications = store.list_for_user(user, 20)?;

    println!("--- {heading} ({}) ---", notifications.len());
    for notification in notifications {
        println!("  [{}] {}", notification.kind.label(), notification.title);
        println!("      {}", notification.body);
    }
    println!();
    Ok(())
}
