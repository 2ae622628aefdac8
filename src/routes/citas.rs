use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    db,
    error::ApiError,
    models::{normalize_status, CitaUpdate, NuevaCita, STATUS_PENDIENTE},
    state::AppState,
};

#[derive(Deserialize)]
struct NuevaCitaInput {
    paciente_nombre: Option<String>,
    telefono: Option<String>,
    email: Option<String>,
    fecha_hora: Option<String>,
    motivo: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct StatusInput {
    status: Option<String>,
}

#[derive(Deserialize)]
struct CitaUpdateInput {
    fecha_hora: Option<String>,
    motivo: Option<String>,
    telefono: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/citas")
            .route(web::get().to(list_citas))
            .route(web::post().to(create_cita)),
    )
    .service(web::resource("/api/cancelaciones").route(web::get().to(list_cancelaciones)))
    .service(web::resource("/api/citas/{id}").route(web::put().to(update_cita)))
    .service(web::resource("/api/citas/{id}/status").route(web::put().to(update_status)));
}

async fn list_citas(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = db::list_active(&state.db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn list_cancelaciones(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = db::list_cancelled(&state.db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Normalizes any RFC 3339 offset to UTC so stored timestamps compare
/// correctly as strings.
fn parse_fecha_hora(raw: &str) -> Result<String, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| db::format_datetime(dt.with_timezone(&Utc)))
        .map_err(|_| ApiError::Validation("fecha_hora inválida (se espera RFC 3339)".to_string()))
}

async fn create_cita(
    state: web::Data<AppState>,
    payload: web::Json<NuevaCitaInput>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let paciente_nombre = payload
        .paciente_nombre
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let (Some(paciente_nombre), Some(fecha_hora)) = (paciente_nombre, payload.fecha_hora.as_deref())
    else {
        return Err(ApiError::Validation(
            "Nombre y fecha_hora son obligatorios".to_string(),
        ));
    };
    let fecha_hora = parse_fecha_hora(fecha_hora)?;

    let status = match payload.status.as_deref() {
        Some(raw) => normalize_status(raw)
            .ok_or_else(|| ApiError::Validation("status inválido".to_string()))?,
        None => STATUS_PENDIENTE,
    };

    let mut row = db::create_cita(
        &state.db,
        &NuevaCita {
            paciente_nombre: paciente_nombre.to_string(),
            telefono: payload.telefono,
            email: payload.email,
            fecha_hora,
            motivo: payload.motivo,
            status,
        },
    )
    .await?;
    log::info!("cita {} created", row.id);

    // Inline confirmation attempt; a failure is only visible in the logs
    // and in the unset flag, which the batch job retries later.
    if let Some(email) = row.email.clone() {
        match state.mailer.send_confirmation(&email, &row).await {
            Ok(()) => {
                db::mark_email_sent(&state.db, row.id).await?;
                if let Some(fresh) = db::fetch_cita(&state.db, row.id).await? {
                    row = fresh;
                }
            }
            Err(err) => log::warn!("confirmation for cita {} failed: {err}", row.id),
        }
    }

    Ok(HttpResponse::Created().json(row))
}

async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<StatusInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let status = payload
        .status
        .as_deref()
        .and_then(normalize_status)
        .ok_or_else(|| ApiError::Validation("status inválido".to_string()))?;

    let row = db::update_cita_status(&state.db, id, status)
        .await?
        .ok_or(ApiError::NotFound("Cita no encontrada"))?;
    Ok(HttpResponse::Ok().json(row))
}

async fn update_cita(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<CitaUpdateInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let payload = payload.into_inner();

    let update = CitaUpdate {
        fecha_hora: payload
            .fecha_hora
            .as_deref()
            .map(parse_fecha_hora)
            .transpose()?,
        motivo: payload.motivo,
        telefono: payload.telefono,
    };
    if update.is_empty() {
        return Err(ApiError::Validation(
            "No se enviaron campos para actualizar".to_string(),
        ));
    }

    let row = db::update_cita_fields(&state.db, id, &update)
        .await?
        .ok_or(ApiError::NotFound("Cita no encontrada"))?;
    Ok(HttpResponse::Ok().json(row))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::json;

    use crate::mailer::testing::MockMailer;
    use crate::routes::testing::test_state;

    #[actix_web::test]
    async fn create_with_email_returns_201_and_flags_sent() {
        let (state, mock) = test_state(MockMailer::default()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/citas")
            .set_json(json!({
                "paciente_nombre": "Ana",
                "email": "a@x.com",
                "fecha_hora": "2027-03-01T10:00:00Z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["paciente_nombre"], "Ana");
        assert_eq!(body["status"], "pendiente");
        assert_eq!(body["email_sent"], true);
        assert_eq!(body["reminder_sent"], false);
        assert_eq!(mock.sent_count(), 1);
    }

    #[actix_web::test]
    async fn create_without_required_fields_is_rejected() {
        let (state, mock) = test_state(MockMailer::default()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/citas")
            .set_json(json!({ "paciente_nombre": "Ana" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Nombre y fecha_hora son obligatorios");
        assert_eq!(mock.sent_count(), 0);
    }

    #[actix_web::test]
    async fn failed_inline_send_still_creates_the_row() {
        let (state, _mock) = test_state(MockMailer::failing()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/citas")
            .set_json(json!({
                "paciente_nombre": "Luis",
                "email": "l@x.com",
                "fecha_hora": "2027-03-01T10:00:00Z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["email_sent"], false);
    }

    #[actix_web::test]
    async fn status_update_on_unknown_id_is_404() {
        let (state, _mock) = test_state(MockMailer::default()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/citas/5/status")
            .set_json(json!({ "status": "cancelada" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Cita no encontrada");
    }

    #[actix_web::test]
    async fn cancel_then_confirm_moves_between_listings() {
        let (state, _mock) = test_state(MockMailer::default()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/citas")
            .set_json(json!({
                "paciente_nombre": "Eva",
                "fecha_hora": "2027-03-01T09:00:00Z"
            }))
            .to_request();
        let created: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/citas/{id}/status"))
            .set_json(json!({ "status": "cancelada" }))
            .to_request();
        let cancelled: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(cancelled["status"], "cancelada");
        assert!(!cancelled["deleted_at"].is_null());

        let req = test::TestRequest::get().uri("/api/citas").to_request();
        let active: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(active.as_array().unwrap().len(), 0);

        let req = test::TestRequest::get().uri("/api/cancelaciones").to_request();
        let gone: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(gone.as_array().unwrap().len(), 1);

        // English alias re-confirms and clears the soft-delete stamp.
        let req = test::TestRequest::put()
            .uri(&format!("/api/citas/{id}/status"))
            .set_json(json!({ "status": "confirmed" }))
            .to_request();
        let confirmed: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(confirmed["status"], "confirmada");
        assert!(confirmed["deleted_at"].is_null());
    }

    #[actix_web::test]
    async fn partial_update_requires_some_field() {
        let (state, _mock) = test_state(MockMailer::default()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/citas")
            .set_json(json!({
                "paciente_nombre": "Rosa",
                "fecha_hora": "2027-03-01T09:00:00Z"
            }))
            .to_request();
        let created: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/citas/{id}"))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&format!("/api/citas/{id}"))
            .set_json(json!({ "motivo": "Electrocardiograma" }))
            .to_request();
        let updated: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(updated["motivo"], "Electrocardiograma");
    }
}
