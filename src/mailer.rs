use async_trait::async_trait;
use chrono::DateTime;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::models::CitaRow;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from_name: String,
    pub frontend_url: String,
}

impl SmtpConfig {
    pub fn enabled(&self) -> bool {
        !(self.user.trim().is_empty() || self.pass.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP no configurado")]
    Disabled,
    #[error("dirección inválida: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error(transparent)]
    Build(#[from] lettre::error::Error),
    #[error(transparent)]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sends the two appointment emails. Behind a trait so the batch job can
/// run against a recording stub in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, to: &str, cita: &CitaRow) -> Result<(), MailError>;
    async fn send_reminder(&self, to: &str, cita: &CitaRow) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let transport = if config.enabled() {
            let creds = Credentials::new(config.user.clone(), config.pass.clone());
            Some(
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
                    .port(config.port)
                    .credentials(creds)
                    .build(),
            )
        } else {
            log::warn!("EMAIL_USER/EMAIL_PASS not set; email sending disabled");
            None
        };
        Ok(SmtpMailer { config, transport })
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), MailError> {
        let Some(transport) = &self.transport else {
            return Err(MailError::Disabled);
        };

        let from: Mailbox = format!("\"{}\" <{}>", self.config.from_name, self.config.user).parse()?;
        let to: Mailbox = to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(&self, to: &str, cita: &CitaRow) -> Result<(), MailError> {
        self.send(to, "📅 Confirmación de tu Cita Médica", confirmation_body(cita))
            .await?;
        log::info!("confirmation email sent to {to} for cita {}", cita.id);
        Ok(())
    }

    async fn send_reminder(&self, to: &str, cita: &CitaRow) -> Result<(), MailError> {
        let link = format!("{}/?confirmar_id={}", self.config.frontend_url, cita.id);
        self.send(
            to,
            "⏰ Recordatorio: Tu cita es en 48 horas - ¡Confirma tu asistencia!",
            reminder_body(cita, &link),
        )
        .await?;
        log::info!("reminder email sent to {to} for cita {}", cita.id);
        Ok(())
    }
}

fn display_fecha(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn confirmation_body(cita: &CitaRow) -> String {
    let motivo = cita.motivo.as_deref().unwrap_or("Consulta General");
    format!(
        r#"<div style="font-family: Helvetica, Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #0d9488;">¡Cita Confirmada!</h1>
  <p>Hola <strong>{nombre}</strong>,</p>
  <p>Nos complace confirmarte que tu cita ha sido agendada exitosamente.</p>
  <table style="border-left: 4px solid #0d9488; padding-left: 12px;">
    <tr><td><strong>🗓️ Fecha:</strong></td><td>{fecha}</td></tr>
    <tr><td><strong>🩺 Motivo:</strong></td><td>{motivo}</td></tr>
    <tr><td><strong>👨‍⚕️ Doctor:</strong></td><td>Dr. Rubén Quiroz</td></tr>
  </table>
  <p style="color: #334155;">Clínica de Cardiología - Dr. Rubén Quiroz</p>
</div>"#,
        nombre = cita.paciente_nombre,
        fecha = display_fecha(&cita.fecha_hora),
        motivo = motivo,
    )
}

fn reminder_body(cita: &CitaRow, confirm_link: &str) -> String {
    format!(
        r#"<div style="font-family: Helvetica, Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #d97706;">Recordatorio de Cita</h1>
  <p>Hola <strong>{nombre}</strong>,</p>
  <p>Este es un recordatorio amable de que tienes una cita programada con nosotros próximamente.</p>
  <table style="border-left: 4px solid #d97706; padding-left: 12px;">
    <tr><td><strong>🗓️ Fecha:</strong></td><td>{fecha}</td></tr>
    <tr><td><strong>👨‍⚕️ Doctor:</strong></td><td>Dr. Rubén Quiroz</td></tr>
  </table>
  <p><strong>¿Podrás asistir?</strong></p>
  <p><a href="{link}" style="background-color: #d97706; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none;">✅ CONFIRMAR SI ASISTIRÉ</a></p>
  <p style="color: #334155;">Clínica de Cardiología - Dr. Rubén Quiroz</p>
</div>"#,
        nombre = cita.paciente_nombre,
        fecha = display_fecha(&cita.fecha_hora),
        link = confirm_link,
    )
}
