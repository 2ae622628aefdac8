use std::{fs, path::Path};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::models::{
    CitaRow, CitaUpdate, CotizacionRow, CotizacionUpdate, NuevaCita, NuevaCotizacion,
    STATUS_CANCELADA, STATUS_CONFIRMADA,
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// All stored timestamps share this format so string comparison in SQL
/// orders them chronologically.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn now_utc() -> String {
    format_datetime(Utc::now())
}

// --- citas ---

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<CitaRow>, sqlx::Error> {
    sqlx::query_as::<_, CitaRow>(
        r#"SELECT id, paciente_nombre, telefono, email, fecha_hora, motivo, status,
                  email_sent, reminder_sent, created_at, deleted_at
           FROM citas
           WHERE status != 'cancelada'
           ORDER BY fecha_hora ASC"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_cancelled(pool: &SqlitePool) -> Result<Vec<CitaRow>, sqlx::Error> {
    sqlx::query_as::<_, CitaRow>(
        r#"SELECT id, paciente_nombre, telefono, email, fecha_hora, motivo, status,
                  email_sent, reminder_sent, created_at, deleted_at
           FROM citas
           WHERE status = 'cancelada'
           ORDER BY deleted_at DESC, fecha_hora ASC"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_cita(pool: &SqlitePool, id: i64) -> Result<Option<CitaRow>, sqlx::Error> {
    sqlx::query_as::<_, CitaRow>(
        r#"SELECT id, paciente_nombre, telefono, email, fecha_hora, motivo, status,
                  email_sent, reminder_sent, created_at, deleted_at
           FROM citas
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_cita(pool: &SqlitePool, cita: &NuevaCita) -> Result<CitaRow, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO citas (paciente_nombre, telefono, email, fecha_hora, motivo, status,
                              email_sent, reminder_sent, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?)"#,
    )
    .bind(&cita.paciente_nombre)
    .bind(&cita.telefono)
    .bind(&cita.email)
    .bind(&cita.fecha_hora)
    .bind(&cita.motivo)
    .bind(cita.status)
    .bind(now_utc())
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    fetch_cita(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Status transition. Cancelling stamps `deleted_at`; confirming clears it
/// so a cancelled appointment can be brought back.
pub async fn update_cita_status(
    pool: &SqlitePool,
    id: i64,
    status: &str,
) -> Result<Option<CitaRow>, sqlx::Error> {
    let result = if status == STATUS_CANCELADA {
        sqlx::query("UPDATE citas SET status = ?, deleted_at = ? WHERE id = ?")
            .bind(status)
            .bind(now_utc())
            .bind(id)
            .execute(pool)
            .await?
    } else if status == STATUS_CONFIRMADA {
        sqlx::query("UPDATE citas SET status = ?, deleted_at = NULL WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?
    } else {
        sqlx::query("UPDATE citas SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?
    };

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_cita(pool, id).await
}

pub async fn update_cita_fields(
    pool: &SqlitePool,
    id: i64,
    update: &CitaUpdate,
) -> Result<Option<CitaRow>, sqlx::Error> {
    let mut sets = Vec::new();
    if update.fecha_hora.is_some() {
        sets.push("fecha_hora = ?");
    }
    if update.motivo.is_some() {
        sets.push("motivo = ?");
    }
    if update.telefono.is_some() {
        sets.push("telefono = ?");
    }

    let sql = format!("UPDATE citas SET {} WHERE id = ?", sets.join(", "));
    let mut query = sqlx::query(&sql);
    if let Some(value) = &update.fecha_hora {
        query = query.bind(value);
    }
    if let Some(value) = &update.motivo {
        query = query.bind(value);
    }
    if let Some(value) = &update.telefono {
        query = query.bind(value);
    }

    let result = query.bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_cita(pool, id).await
}

pub async fn find_pending_confirmation(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<CitaRow>, sqlx::Error> {
    sqlx::query_as::<_, CitaRow>(
        r#"SELECT id, paciente_nombre, telefono, email, fecha_hora, motivo, status,
                  email_sent, reminder_sent, created_at, deleted_at
           FROM citas
           WHERE email IS NOT NULL
             AND email_sent = 0
             AND status != 'cancelada'
           LIMIT ?"#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Appointments due a reminder: scheduled strictly in the future and no
/// further out than the window, not cancelled, not already reminded.
pub async fn find_due_reminders(
    pool: &SqlitePool,
    window_hours: i64,
    limit: i64,
) -> Result<Vec<CitaRow>, sqlx::Error> {
    let now = Utc::now();
    let horizon = now + Duration::hours(window_hours);

    sqlx::query_as::<_, CitaRow>(
        r#"SELECT id, paciente_nombre, telefono, email, fecha_hora, motivo, status,
                  email_sent, reminder_sent, created_at, deleted_at
           FROM citas
           WHERE email IS NOT NULL
             AND reminder_sent = 0
             AND status != 'cancelada'
             AND fecha_hora > ?
             AND fecha_hora <= ?
           LIMIT ?"#,
    )
    .bind(format_datetime(now))
    .bind(format_datetime(horizon))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn mark_email_sent(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE citas SET email_sent = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_reminder_sent(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE citas SET reminder_sent = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// --- cotizaciones ---

pub async fn list_cotizaciones(pool: &SqlitePool) -> Result<Vec<CotizacionRow>, sqlx::Error> {
    sqlx::query_as::<_, CotizacionRow>(
        r#"SELECT id, paciente, procedimiento, monto, fecha, descripcion, documento, email,
                  created_at, edited_at, deleted_at
           FROM cotizaciones
           WHERE deleted_at IS NULL
           ORDER BY fecha ASC"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_cotizacion(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<CotizacionRow>, sqlx::Error> {
    sqlx::query_as::<_, CotizacionRow>(
        r#"SELECT id, paciente, procedimiento, monto, fecha, descripcion, documento, email,
                  created_at, edited_at, deleted_at
           FROM cotizaciones
           WHERE id = ? AND deleted_at IS NULL
           LIMIT 1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_cotizacion(
    pool: &SqlitePool,
    quote: &NuevaCotizacion,
) -> Result<CotizacionRow, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO cotizaciones (paciente, procedimiento, monto, fecha, descripcion,
                                     documento, email, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&quote.paciente)
    .bind(&quote.procedimiento)
    .bind(quote.monto)
    .bind(&quote.fecha)
    .bind(&quote.descripcion)
    .bind(&quote.documento)
    .bind(&quote.email)
    .bind(now_utc())
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    fetch_cotizacion(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Partial update; `edited_at` is refreshed on every successful edit.
/// Soft-deleted quotes are not editable.
pub async fn update_cotizacion(
    pool: &SqlitePool,
    id: i64,
    update: &CotizacionUpdate,
) -> Result<Option<CotizacionRow>, sqlx::Error> {
    let mut sets = Vec::new();
    if update.paciente.is_some() {
        sets.push("paciente = ?");
    }
    if update.procedimiento.is_some() {
        sets.push("procedimiento = ?");
    }
    if update.monto.is_some() {
        sets.push("monto = ?");
    }
    if update.fecha.is_some() {
        sets.push("fecha = ?");
    }
    if update.descripcion.is_some() {
        sets.push("descripcion = ?");
    }
    if update.documento.is_some() {
        sets.push("documento = ?");
    }
    if update.email.is_some() {
        sets.push("email = ?");
    }
    sets.push("edited_at = ?");

    let sql = format!(
        "UPDATE cotizaciones SET {} WHERE id = ? AND deleted_at IS NULL",
        sets.join(", ")
    );
    let mut query = sqlx::query(&sql);
    if let Some(value) = &update.paciente {
        query = query.bind(value);
    }
    if let Some(value) = &update.procedimiento {
        query = query.bind(value);
    }
    if let Some(value) = update.monto {
        query = query.bind(value);
    }
    if let Some(value) = &update.fecha {
        query = query.bind(value);
    }
    if let Some(value) = &update.descripcion {
        query = query.bind(value);
    }
    if let Some(value) = &update.documento {
        query = query.bind(value);
    }
    if let Some(value) = &update.email {
        query = query.bind(value);
    }

    let result = query.bind(now_utc()).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_cotizacion(pool, id).await
}

/// Returns false when the quote does not exist or was already deleted.
pub async fn soft_delete_cotizacion(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE cotizaciones SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(now_utc())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
pub fn sample_cita(email: Option<&str>, hours_from_now: i64) -> NuevaCita {
    NuevaCita {
        paciente_nombre: "Ana Torres".to_string(),
        telefono: Some("555-0101".to_string()),
        email: email.map(str::to_string),
        fecha_hora: format_datetime(Utc::now() + Duration::hours(hours_from_now)),
        motivo: Some("Consulta general".to_string()),
        status: crate::models::STATUS_PENDIENTE,
    }
}
