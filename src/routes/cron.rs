use actix_web::{web, HttpResponse};

use crate::{error::ApiError, jobs, state::AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/cron/process-emails").route(web::get().to(run_job)));
}

/// On-demand trigger for the pending-email job; same code path as the
/// scheduled worker. Used by external cron in deployments without a
/// resident process.
async fn run_job(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let summary = jobs::process_pending_emails(&state.db, state.mailer.as_ref(), &state.job).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::json;

    use crate::mailer::testing::MockMailer;
    use crate::routes::testing::test_state;

    #[actix_web::test]
    async fn run_with_nothing_pending_returns_zero_counts() {
        let (state, _mock) = test_state(MockMailer::default()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/cron/process-emails")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "confirmaciones": 0, "recordatorios": 0 }));
    }

    #[actix_web::test]
    async fn run_reports_processed_counts() {
        let (state, mock) = test_state(MockMailer::default()).await;
        let pool = state.db.clone();
        crate::db::create_cita(&pool, &crate::db::sample_cita(Some("a@x.com"), 24))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/cron/process-emails")
            .to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body, json!({ "confirmaciones": 1, "recordatorios": 1 }));
        assert_eq!(mock.sent_count(), 2);
    }
}
