use std::env;

use thiserror::Error;

use crate::jobs::JobConfig;
use crate::mailer::SmtpConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    Invalid(&'static str),
}

/// Runtime configuration, assembled from environment variables at startup
/// and handed to every component explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub smtp: SmtpConfig,
    pub job: JobConfig,
    pub n8n: N8nConfig,
}

/// Fixed upstream webhook URLs for the chat proxy routes.
#[derive(Debug, Clone)]
pub struct N8nConfig {
    pub service_url: String,
    pub quotes_url: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/citamed.db".to_string());
        let port = parse_var("PORT", 3000)?;

        let smtp = SmtpConfig {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.ionos.com".to_string()),
            port: parse_var("SMTP_PORT", 587)?,
            user: env::var("EMAIL_USER").unwrap_or_default(),
            pass: env::var("EMAIL_PASS").unwrap_or_default(),
            from_name: env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| "Clínica Dr. Quiroz".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "https://agentes-theta.vercel.app".to_string()),
        };

        // Interval 0 disables the in-process worker; the cron route stays
        // available for externally-triggered deployments.
        let job = JobConfig {
            interval_secs: parse_var("EMAIL_JOB_INTERVAL_SECS", 600)?,
            batch_limit: parse_var("EMAIL_BATCH_LIMIT", 10)?,
            reminder_window_hours: parse_var("REMINDER_WINDOW_HOURS", 48)?,
        };
        if job.batch_limit <= 0 {
            return Err(ConfigError::Invalid("EMAIL_BATCH_LIMIT"));
        }
        if job.reminder_window_hours <= 0 {
            return Err(ConfigError::Invalid("REMINDER_WINDOW_HOURS"));
        }

        let n8n = N8nConfig {
            service_url: env::var("N8N_SERVICE_URL")
                .unwrap_or_else(|_| "https://dmncrt.app.n8n.cloud/webhook/chat/asistente".to_string()),
            quotes_url: env::var("N8N_QUOTES_URL")
                .unwrap_or_else(|_| "https://dmncrt.app.n8n.cloud/webhook/chat/cotizaciones".to_string()),
        };

        Ok(Config {
            database_url,
            port,
            smtp,
            job,
            n8n,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}
