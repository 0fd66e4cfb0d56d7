use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};
use serde_json::Value;

use super::error_response;
use super::models::{AppState, MempoolResponse, NewTxRequest, NewTxResponse};

/// Queue a transfer.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        sender,
        recipient,
        quantity,
    } = body.into_inner();

    let mut ledger = state.ledger();
    let record = match ledger.enqueue(sender, recipient, quantity) {
        Ok(record) => record.clone(),
        Err(e) => {
            warn!("POST /tx/ - rejected: {e}");
            return error_response(&e);
        }
    };
    let pending = ledger.pool().len();
    debug!("POST /tx/ - accepted (pending: {pending})");
    HttpResponse::Ok().json(NewTxResponse { pending, record })
}

/// Queue an arbitrary JSON object.
#[post("/tx/raw/")]
pub async fn post_raw_record(state: web::Data<AppState>, body: web::Json<Value>) -> impl Responder {
    let mut ledger = state.ledger();
    let record = match ledger.enqueue_raw(body.into_inner()) {
        Ok(record) => record.clone(),
        Err(e) => {
            warn!("POST /tx/raw/ - rejected: {e}");
            return error_response(&e);
        }
    };
    let pending = ledger.pool().len();
    debug!("POST /tx/raw/ - accepted (pending: {pending})");
    HttpResponse::Ok().json(NewTxResponse { pending, record })
}

/// List pending records, oldest first.
#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger();
    HttpResponse::Ok().json(MempoolResponse {
        size: ledger.pool().len(),
        records: ledger.pool().iter().collect(),
    })
}
