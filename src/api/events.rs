use crate::api::AppState;
use crate::domain::LedgerEvent;
use crate::error::AppError;
use crate::orchestration::EventOutcome;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub processed: usize,
    pub faults: usize,
    pub outcomes: Vec<OutcomeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeDto {
    pub tx_hash: String,
    pub log_index: u64,
    pub block_number: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Apply a batch of events in chain order. Outcomes follow that order.
pub async fn post_events(
    State(state): State<AppState>,
    Json(mut events): Json<Vec<LedgerEvent>>,
) -> Result<Json<EventsResponse>, AppError> {
    let outcomes = {
        let ledger = state.ledger.lock().await;
        ledger.process_batch(&mut events).await?
    };

    let outcomes: Vec<OutcomeDto> = events
        .iter()
        .zip(outcomes)
        .map(|(event, outcome)| {
            let (status, fault) = match outcome {
                EventOutcome::Applied => ("applied", None),
                EventOutcome::Fault(fault) => ("fault", Some(fault.to_string())),
            };
            OutcomeDto {
                tx_hash: event.meta.tx_hash.to_string(),
                log_index: event.meta.log_index,
                block_number: event.meta.block_number,
                kind: event.payload.name(),
                status,
                fault,
            }
        })
        .collect();

    let faults = outcomes.iter().filter(|o| o.fault.is_some()).count();
    info!(processed = outcomes.len(), faults, "Event batch applied");

    Ok(Json(EventsResponse {
        processed: outcomes.len(),
        faults,
        outcomes,
    }))
}
