use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db,
    error::ApiError,
    models::{CotizacionUpdate, NuevaCotizacion},
    state::AppState,
};

#[derive(Deserialize)]
struct NuevaCotizacionInput {
    paciente: Option<String>,
    procedimiento: Option<String>,
    monto: Option<f64>,
    fecha: Option<String>,
    descripcion: Option<String>,
    documento: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct CotizacionUpdateInput {
    paciente: Option<String>,
    procedimiento: Option<String>,
    monto: Option<f64>,
    fecha: Option<String>,
    descripcion: Option<String>,
    documento: Option<String>,
    email: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/cotizaciones")
            .route(web::get().to(list_cotizaciones))
            .route(web::post().to(create_cotizacion)),
    )
    .service(
        web::resource("/api/cotizaciones/{id}")
            .route(web::get().to(get_cotizacion))
            .route(web::put().to(update_cotizacion))
            .route(web::delete().to(delete_cotizacion)),
    );
}

async fn list_cotizaciones(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = db::list_cotizaciones(&state.db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn get_cotizacion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let row = db::fetch_cotizacion(&state.db, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Cotización no encontrada"))?;
    Ok(HttpResponse::Ok().json(row))
}

fn validate_monto(monto: f64) -> Result<f64, ApiError> {
    if monto < 0.0 {
        return Err(ApiError::Validation(
            "monto no puede ser negativo".to_string(),
        ));
    }
    Ok(monto)
}

async fn create_cotizacion(
    state: web::Data<AppState>,
    payload: web::Json<NuevaCotizacionInput>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let paciente = payload
        .paciente
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let procedimiento = payload
        .procedimiento
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let (Some(paciente), Some(procedimiento), Some(monto)) =
        (paciente, procedimiento, payload.monto)
    else {
        return Err(ApiError::Validation(
            "paciente, procedimiento y monto son obligatorios".to_string(),
        ));
    };
    let monto = validate_monto(monto)?;

    let row = db::create_cotizacion(
        &state.db,
        &NuevaCotizacion {
            paciente: paciente.to_string(),
            procedimiento: procedimiento.to_string(),
            monto,
            fecha: payload.fecha,
            descripcion: payload.descripcion,
            documento: payload.documento,
            email: payload.email,
        },
    )
    .await?;
    log::info!("cotización {} created", row.id);

    Ok(HttpResponse::Created().json(row))
}

async fn update_cotizacion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<CotizacionUpdateInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let payload = payload.into_inner();

    let update = CotizacionUpdate {
        paciente: payload.paciente,
        procedimiento: payload.procedimiento,
        monto: payload.monto.map(validate_monto).transpose()?,
        fecha: payload.fecha,
        descripcion: payload.descripcion,
        documento: payload.documento,
        email: payload.email,
    };
    if update.is_empty() {
        return Err(ApiError::Validation(
            "No se enviaron campos para actualizar".to_string(),
        ));
    }

    let row = db::update_cotizacion(&state.db, id, &update)
        .await?
        .ok_or(ApiError::NotFound("Cotización no encontrada"))?;
    Ok(HttpResponse::Ok().json(row))
}

async fn delete_cotizacion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !db::soft_delete_cotizacion(&state.db, id).await? {
        return Err(ApiError::NotFound("Cotización no encontrada"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Cotización eliminada", "id": id })))
}
