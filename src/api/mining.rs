use actix_web::{HttpResponse, Responder, post, web};
use log::{error, info, warn};

use super::error_response;
use super::models::{AppState, MineRequest, MineResponse};

/// Mine a block from the pending pool:
/// - drain up to the configured number of records under the lock
/// - ask the oracle for the difficulty if evidence was supplied
/// - search for a nonce on the blocking pool, lock released
/// - append under the lock; a stale candidate is refused and its records requeued
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> impl Responder {
    // an empty body means no evidence; a malformed one is refused
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        MineRequest::default()
    } else {
        match serde_json::from_slice::<MineRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!("POST /mine/ - rejected request body: {e}");
                return HttpResponse::BadRequest().body(format!("invalid mine request: {e}"));
            }
        }
    };
    let evidence = request.evidence;

    let worker = state.clone();
    let outcome = web::block(move || worker.miner.mine_next(&worker.ledger, evidence)).await;

    match outcome {
        Ok(Ok(block)) => {
            info!(
                "POST /mine/ - sealed block #{} (hash={}, nonce={})",
                block.index, block.hash, block.nonce
            );
            HttpResponse::Ok().json(MineResponse {
                mined_index: block.index,
                hash: block.hash,
                nonce: block.nonce,
                difficulty: block.difficulty,
                records: block.payload.len(),
            })
        }
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!("POST /mine/ - mining task failed: {e}");
            HttpResponse::InternalServerError().body("mining task failed")
        }
    }
}
