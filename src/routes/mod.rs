pub mod citas;
pub mod cotizaciones;
pub mod cron;
pub mod n8n;

use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)));
    citas::configure(cfg);
    cotizaciones::configure(cfg);
    cron::configure(cfg);
    n8n::configure(cfg);
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "API de Citas Médicas",
        "endpoints": {
            "appointments": "/api/citas",
            "cancelations": "/api/cancelaciones",
            "quotes": "/api/cotizaciones"
        }
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use crate::config::N8nConfig;
    use crate::db;
    use crate::jobs::JobConfig;
    use crate::mailer::testing::MockMailer;
    use crate::state::AppState;

    /// State over an in-memory database with a recording mailer. The mock
    /// is returned separately so tests can inspect attempted sends.
    pub async fn test_state(mailer: MockMailer) -> (AppState, Arc<MockMailer>) {
        let mock = Arc::new(mailer);
        let state = AppState {
            db: db::test_pool().await,
            mailer: mock.clone(),
            http: reqwest::Client::new(),
            job: JobConfig {
                interval_secs: 0,
                batch_limit: 10,
                reminder_window_hours: 48,
            },
            n8n: N8nConfig {
                // Nothing listens here; proxy tests only exercise the failure path.
                service_url: "http://127.0.0.1:9/webhook/chat/asistente".to_string(),
                quotes_url: "http://127.0.0.1:9/webhook/chat/cotizaciones".to_string(),
            },
        };
        (state, mock)
    }
}
