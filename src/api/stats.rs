use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger();
    let chain = ledger.chain();

    let last_interval_secs = match chain {
        [.., older, newer] => Some((newer.timestamp - older.timestamp).num_seconds().max(0)),
        _ => None,
    };
    let policy = ledger.policy();

    HttpResponse::Ok().json(StatsResponse {
        height: ledger.len(),
        base_difficulty: policy.base(),
        reduced_difficulty: policy.reduced(),
        last_interval_secs,
        mempool_size: ledger.pool().len(),
        max_attempts: state.miner.limit().max_attempts,
    })
}
