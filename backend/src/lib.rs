use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lottery_core::{run_lottery, LotteryError, LotteryOutcome, Participant, ParticipantId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

mod store;

pub use store::{
    FileRoster, FileStore, MappingStore, MemoryStore, RosterProvider, StaticRoster, StoreError,
    StoreIoError,
};

#[derive(Clone)]
pub struct AppState {
    roster: Arc<dyn RosterProvider>,
    store: Arc<dyn MappingStore>,
    // Serializes the whole load-draw-save sequence for lottery requests, so
    // concurrent draws always see every prior commit in the used-target set.
    lottery_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(roster: Arc<dyn RosterProvider>, store: Arc<dyn MappingStore>) -> Self {
        Self {
            roster,
            store,
            lottery_gate: Arc::new(Mutex::new(())),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/list", get(list))
        .route("/picklist", get(picklist))
        .route("/test", get(health))
        .route("/lottery/:id", post(lottery))
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct AlreadyAssignedBody {
    error: String,
    result: Participant,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn internal_error(err: StoreError) -> Response {
    error!("{err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "OK" })
}

async fn list(State(state): State<AppState>) -> Response {
    match state.roster.load().await {
        Ok(roster) => (StatusCode::OK, Json(roster)).into_response(),
        Err(err) => internal_error(err),
    }
}

/// Roster members nobody has drawn yet.
async fn picklist(State(state): State<AppState>) -> Response {
    let roster = match state.roster.load().await {
        Ok(roster) => roster,
        Err(err) => return internal_error(err),
    };
    let mapping = match state.store.load().await {
        Ok(mapping) => mapping.unwrap_or_default(),
        Err(err) => return internal_error(err),
    };
    (StatusCode::OK, Json(mapping.unassigned(&roster))).into_response()
}

#[derive(Deserialize)]
struct LotteryParams {
    seed: Option<u64>,
}

async fn lottery(
    State(state): State<AppState>,
    Path(actor_id): Path<ParticipantId>,
    Query(params): Query<LotteryParams>,
) -> Response {
    // Held across load, draw and save; only this sequence mutates the table.
    let _gate = state.lottery_gate.lock().await;

    let roster = match state.roster.load().await {
        Ok(roster) => roster,
        Err(err) => return internal_error(err),
    };
    let mapping = match state.store.load().await {
        Ok(mapping) => mapping.unwrap_or_default(),
        Err(err) => return internal_error(err),
    };

    let mut rng = params
        .seed
        .map(ChaCha8Rng::seed_from_u64)
        .unwrap_or_else(ChaCha8Rng::from_entropy);

    match run_lottery(actor_id, &roster, &mapping, &mut rng) {
        Ok(LotteryOutcome::Assigned { target, mapping }) => {
            // The draw is only real once it is durably recorded.
            if let Err(err) = state.store.save(&mapping).await {
                return internal_error(err);
            }
            info!(actor_id, target_id = target.id, "lottery assigned");
            (StatusCode::OK, Json(target)).into_response()
        }
        Ok(LotteryOutcome::AlreadyAssigned { target }) => {
            info!(actor_id, target_id = target.id, "lottery repeated");
            (
                StatusCode::PRECONDITION_FAILED,
                Json(AlreadyAssignedBody {
                    error: "lottery already completed for this participant".to_string(),
                    result: target,
                }),
            )
                .into_response()
        }
        Err(LotteryError::ActorNotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(LotteryError::NoEligibleTarget) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "no eligible target".to_string(),
            }),
        )
            .into_response(),
    }
}
