use serde::Serialize;

pub const STATUS_PENDIENTE: &str = "pendiente";
pub const STATUS_CONFIRMADA: &str = "confirmada";
pub const STATUS_CANCELADA: &str = "cancelada";

/// Maps a client-supplied status (Spanish or English) to its stored form.
/// Returns `None` for anything outside the three known states.
pub fn normalize_status(raw: &str) -> Option<&'static str> {
    match raw.trim() {
        "pendiente" | "pending" => Some(STATUS_PENDIENTE),
        "confirmada" | "confirmed" => Some(STATUS_CONFIRMADA),
        "cancelada" | "cancelled" => Some(STATUS_CANCELADA),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CitaRow {
    pub id: i64,
    pub paciente_nombre: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub fecha_hora: String,
    pub motivo: Option<String>,
    pub status: String,
    pub email_sent: bool,
    pub reminder_sent: bool,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CotizacionRow {
    pub id: i64,
    pub paciente: String,
    pub procedimiento: String,
    pub monto: f64,
    pub fecha: Option<String>,
    pub descripcion: Option<String>,
    pub documento: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
    pub edited_at: Option<String>,
    pub deleted_at: Option<String>,
}

/// Fields accepted when inserting a new appointment. `fecha_hora` must
/// already be normalized to RFC 3339 UTC before it reaches the store.
#[derive(Debug, Clone)]
pub struct NuevaCita {
    pub paciente_nombre: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub fecha_hora: String,
    pub motivo: Option<String>,
    pub status: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct CitaUpdate {
    pub fecha_hora: Option<String>,
    pub motivo: Option<String>,
    pub telefono: Option<String>,
}

impl CitaUpdate {
    pub fn is_empty(&self) -> bool {
        self.fecha_hora.is_none() && self.motivo.is_none() && self.telefono.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NuevaCotizacion {
    pub paciente: String,
    pub procedimiento: String,
    pub monto: f64,
    pub fecha: Option<String>,
    pub descripcion: Option<String>,
    pub documento: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CotizacionUpdate {
    pub paciente: Option<String>,
    pub procedimiento: Option<String>,
    pub monto: Option<f64>,
    pub fecha: Option<String>,
    pub descripcion: Option<String>,
    pub documento: Option<String>,
    pub email: Option<String>,
}

impl CotizacionUpdate {
    pub fn is_empty(&self) -> bool {
        self.paciente.is_none()
            && self.procedimiento.is_none()
            && self.monto.is_none()
            && self.fecha.is_none()
            && self.descripcion.is_none()
            && self.documento.is_none()
            && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_aliases_normalize() {
        assert_eq!(normalize_status("cancelada"), Some(STATUS_CANCELADA));
        assert_eq!(normalize_status("cancelled"), Some(STATUS_CANCELADA));
        assert_eq!(normalize_status(" confirmed "), Some(STATUS_CONFIRMADA));
        assert_eq!(normalize_status("pending"), Some(STATUS_PENDIENTE));
        assert_eq!(normalize_status("archived"), None);
    }
}
