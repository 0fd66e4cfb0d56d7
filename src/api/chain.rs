use actix_web::{HttpResponse, Responder, get, web};
use log::warn;

use super::models::{AppState, ChainResponse, DifficultyResponse, ValidateResponse};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger();
    HttpResponse::Ok().json(ChainResponse {
        length: ledger.len(),
        chain: ledger.chain(),
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger();
    let resp = match ledger.validate() {
        Ok(()) => ValidateResponse {
            valid: true,
            length: ledger.len(),
            failed_index: None,
            reason: None,
        },
        Err(e) => {
            warn!("GET /validate/ - {e}");
            ValidateResponse {
                valid: false,
                length: ledger.len(),
                failed_index: e.failed_index(),
                reason: Some(e.to_string()),
            }
        }
    };
    HttpResponse::Ok().json(resp)
}

/// Get the difficulty policy in force.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let policy = state.ledger().policy();
    HttpResponse::Ok().json(DifficultyResponse {
        base: policy.base(),
        reduced: policy.reduced(),
    })
}
