use crate::EXAM_COLLECTION;
use crate::change_engine::resolve_stop;
use crate::models::Bus;
use crate::store::{BusFilter, ChangeFilter, DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Optional narrowing for exam-partition lookups.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExamQuery<'a> {
    pub exam_title: Option<&'a str>,
    pub direction: Option<&'a str>,
}

/// One row of the rider-facing answer to "what serves this stop". One row
/// per bus, even when the stop appears on that bus more than once.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusAtStop {
    pub original_bus_number: String,
    pub new_bus_number: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

pub async fn get_stops<S: DocumentStore>(
    store: &S,
    collection: &str,
    exam: ExamQuery<'_>,
) -> Result<Vec<String>, StoreError> {
    store
        .distinct_stops(collection, exam.exam_title, exam.direction)
        .await
}

/// Buses serving `stop_name` in `collection`, with active temporary changes
/// applied. Exam collections are never subject to temporary changes and skip
/// the merge.
pub async fn get_buses<S: DocumentStore>(
    store: &S,
    collection: &str,
    stop_name: &str,
    exam: ExamQuery<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<BusAtStop>, StoreError> {
    if collection == EXAM_COLLECTION {
        let buses = store
            .find_buses(
                collection,
                BusFilter::AtStopForExam {
                    stop: stop_name,
                    exam_title: exam.exam_title,
                    direction: exam.direction,
                },
            )
            .await?;
        return Ok(buses.into_iter().map(exam_row).collect());
    }

    let buses = store
        .find_buses(collection, BusFilter::AtStop { stop: stop_name })
        .await?;
    let source_bus_ids: Vec<String> = buses.iter().map(|bus| bus.id.clone()).collect();
    let changes = store
        .find_changes(ChangeFilter::ActiveForStop {
            collection,
            stop: stop_name,
            source_bus_ids: &source_bus_ids,
            now,
        })
        .await?;

    Ok(buses
        .iter()
        .map(|bus| {
            let resolution = resolve_stop(bus, stop_name, &changes);
            match resolution.governing {
                Some(change) => BusAtStop {
                    original_bus_number: bus.bus_code.clone(),
                    new_bus_number: change.target_bus_number.clone(),
                    expires_at: Some(change.expires_at),
                    message: format!(
                        "Bus: {} instead of {} for {}",
                        change.target_bus_number,
                        bus.bus_code,
                        change.expires_at.format("%d/%m/%Y")
                    ),
                    direction: None,
                },
                None => BusAtStop {
                    original_bus_number: bus.bus_code.clone(),
                    new_bus_number: bus.bus_code.clone(),
                    expires_at: None,
                    message: format!("Bus: {}", bus.bus_code),
                    direction: None,
                },
            }
        })
        .collect())
}

fn exam_row(bus: Bus) -> BusAtStop {
    BusAtStop {
        message: format!("Bus: {}", bus.bus_code),
        original_bus_number: bus.bus_code.clone(),
        new_bus_number: bus.bus_code,
        expires_at: None,
        direction: bus.direction,
    }
}
