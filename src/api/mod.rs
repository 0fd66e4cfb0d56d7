mod chain;
mod health;
mod mining;
pub mod models;
mod stats;
mod tx;

use std::sync::{MutexGuard, PoisonError};

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::blockchain::Ledger;
use crate::error::LedgerError;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_check).service(
        web::scope("/api/v1")
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::get_difficulty)
            .service(mining::mine_block)
            .service(tx::post_transaction)
            .service(tx::post_raw_record)
            .service(tx::get_mempool)
            .service(stats::get_stats),
    );
}

impl AppState {
    pub(crate) fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Map a core error onto an HTTP status.
pub(crate) fn error_response(err: &LedgerError) -> HttpResponse {
    match err {
        LedgerError::InvalidTransaction(_)
        | LedgerError::InvalidBlock(_)
        | LedgerError::Validation { .. } => HttpResponse::BadRequest().body(err.to_string()),
        LedgerError::ProofNotFound { .. } => {
            HttpResponse::ServiceUnavailable().body(err.to_string())
        }
        LedgerError::InvalidDifficulty(_) | LedgerError::Codec(_) => {
            HttpResponse::InternalServerError().body(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::DifficultyPolicy;
    use crate::config::Config;
    use actix_web::{App, http::StatusCode, test};
    use models::{MineResponse, NewTxResponse, StatsResponse, ValidateResponse};
    use serde_json::json;

    fn low_state() -> web::Data<AppState> {
        let config = Config {
            policy: DifficultyPolicy::new(2, 1).unwrap(),
            ..Config::default()
        };
        web::Data::new(AppState::from_config(&config))
    }

    #[actix_web::test]
    async fn transfer_mine_validate() {
        let state = low_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/")
            .set_json(json!({ "sender": "alice", "recipient": "bob", "quantity": 10 }))
            .to_request();
        let queued: NewTxResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(queued.pending, 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({}))
            .to_request();
        let mined: MineResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mined.mined_index, 1);
        assert_eq!(mined.records, 1);
        assert!(mined.hash.starts_with("00"));

        let req = test::TestRequest::get().uri("/api/v1/validate/").to_request();
        let report: ValidateResponse = test::call_and_read_body_json(&app, req).await;
        assert!(report.valid);
        assert_eq!(report.length, 2);

        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let stats: StatsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats.height, 2);
        assert_eq!(stats.mempool_size, 0);
    }

    #[actix_web::test]
    async fn mine_without_body_uses_no_evidence() {
        let app = test::init_service(App::new().app_data(low_state()).configure(init_routes)).await;
        let req = test::TestRequest::post().uri("/api/v1/mine/").to_request();
        let mined: MineResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mined.difficulty, 2);
        assert_eq!(mined.records, 0);
    }

    #[actix_web::test]
    async fn malformed_mine_body_is_refused() {
        let state = low_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"evidence": {"descriptor": "img-001"}}"#)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_payload("not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.ledger().len(), 1);
    }

    #[actix_web::test]
    async fn mine_with_evidence_body_is_accepted() {
        let app = test::init_service(App::new().app_data(low_state()).configure(init_routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({ "evidence": { "descriptor": "img-001", "label": "cat" } }))
            .to_request();
        let mined: MineResponse = test::call_and_read_body_json(&app, req).await;
        // no classifier configured, so the base difficulty applies
        assert_eq!(mined.difficulty, 2);
    }

    #[actix_web::test]
    async fn invalid_records_are_bad_requests() {
        let app = test::init_service(App::new().app_data(low_state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/")
            .set_json(json!({ "sender": "", "recipient": "bob", "quantity": 1 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/raw/")
            .set_json(json!(["not", "an", "object"]))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn health_is_outside_the_scope_prefix() {
        let app = test::init_service(App::new().app_data(low_state()).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }
}
