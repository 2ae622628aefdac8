use std::time::Duration;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::mailer::Mailer;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Seconds between scheduled runs; 0 disables the in-process worker.
    pub interval_secs: u64,
    pub batch_limit: i64,
    pub reminder_window_hours: i64,
}

/// Rows attempted (not necessarily delivered) in one pass.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmailRunSummary {
    pub confirmaciones: usize,
    pub recordatorios: usize,
}

/// One pass of the pending-email job: confirmations first, then 48-hour
/// reminders. A failed send is logged and left for the next cycle; the
/// sent flag is only flipped after a successful send, which is what makes
/// re-runs safe. A store error aborts the rest of the pass.
pub async fn process_pending_emails(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    cfg: &JobConfig,
) -> Result<EmailRunSummary, sqlx::Error> {
    let pendientes = db::find_pending_confirmation(pool, cfg.batch_limit).await?;
    for cita in &pendientes {
        let Some(email) = cita.email.as_deref() else {
            continue;
        };
        match mailer.send_confirmation(email, cita).await {
            Ok(()) => db::mark_email_sent(pool, cita.id).await?,
            Err(err) => log::warn!("confirmation for cita {} failed: {err}", cita.id),
        }
    }

    let por_recordar =
        db::find_due_reminders(pool, cfg.reminder_window_hours, cfg.batch_limit).await?;
    for cita in &por_recordar {
        let Some(email) = cita.email.as_deref() else {
            continue;
        };
        match mailer.send_reminder(email, cita).await {
            Ok(()) => db::mark_reminder_sent(pool, cita.id).await?,
            Err(err) => log::warn!("reminder for cita {} failed: {err}", cita.id),
        }
    }

    Ok(EmailRunSummary {
        confirmaciones: pendientes.len(),
        recordatorios: por_recordar.len(),
    })
}

/// Repeating worker sharing the same entry point as the cron route. The
/// returned handle can be aborted to stop the schedule.
pub fn spawn_email_worker(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(state.job.interval_secs));
        loop {
            ticker.tick().await;
            match process_pending_emails(&state.db, state.mailer.as_ref(), &state.job).await {
                Ok(summary) => log::info!(
                    "email job: {} confirmations, {} reminders",
                    summary.confirmaciones,
                    summary.recordatorios
                ),
                Err(err) => log::error!("email job pass failed: {err}"),
            }
        }
    })
}
