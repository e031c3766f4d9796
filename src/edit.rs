use crate::models::{Change, ChangeKind};
use crate::store::{BusFilter, ChangeFilter, DocumentStore, StoreError};
use ahash::AHashMap;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopStatus {
    Unchanged,
    /// Moved onto this bus by an active change targeting its code.
    Added,
    /// Moved off this bus by an active change sourced from it.
    Removed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedStop {
    pub name: String,
    pub status: StopStatus,
}

/// One bus of the admin editing view: either an original bus with its stop
/// list intact, or a synthetic destination bus created by active changes.
/// Change lists are always present, possibly empty.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableBus {
    pub id: String,
    pub bus_code: String,
    pub stops: Vec<AnnotatedStop>,
    pub is_temporary: bool,
    pub partial_changes: Vec<Change>,
    pub bulk_changes: Vec<Change>,
}

/// Builds the superset view for the editing UI: every original bus plus a
/// synthetic bus per change target code. Original buses are never mutated;
/// moved stops stay on the source and are disambiguated by the added/removed
/// status on each side.
pub async fn get_editable_data<S: DocumentStore>(
    store: &S,
    collection: &str,
    now: DateTime<Utc>,
) -> Result<Vec<EditableBus>, StoreError> {
    let (buses, changes) = tokio::join!(
        store.find_buses(collection, BusFilter::All),
        store.find_changes(ChangeFilter::ActiveInCollection { collection, now })
    );
    let buses = buses?;
    let mut changes = changes?;

    let stops_by_bus_id: AHashMap<String, Vec<String>> = buses
        .iter()
        .map(|bus| (bus.id.clone(), bus.stops.clone()))
        .collect();

    // Bulk changes display the full stop list of their source bus, refreshed
    // against the current snapshot on every read.
    for change in &mut changes {
        if change.kind == ChangeKind::Bulk {
            if let Some(stops) = stops_by_bus_id.get(&change.source_bus_id) {
                change.stops = stops.clone();
            }
        }
    }

    let mut editable: Vec<EditableBus> = buses
        .iter()
        .map(|bus| EditableBus {
            id: bus.id.clone(),
            bus_code: bus.bus_code.clone(),
            stops: bus
                .stops
                .iter()
                .map(|name| AnnotatedStop {
                    name: name.clone(),
                    status: StopStatus::Unchanged,
                })
                .collect(),
            is_temporary: false,
            partial_changes: Vec::new(),
            bulk_changes: Vec::new(),
        })
        .collect();

    let index_by_bus_id: AHashMap<String, usize> = editable
        .iter()
        .enumerate()
        .map(|(idx, bus)| (bus.id.clone(), idx))
        .collect();

    // Synthetic destination buses, keyed by target code, minted fresh per
    // read. Their ids are stable within this response only.
    let minted = now.timestamp_millis();
    let mut synthetic: Vec<EditableBus> = Vec::new();
    let mut synthetic_by_code: AHashMap<String, usize> = AHashMap::new();

    for change in &changes {
        // A change whose source bus disappeared (collection re-uploaded) is
        // ignored until it expires.
        let Some(&source_idx) = index_by_bus_id.get(&change.source_bus_id) else {
            continue;
        };

        match change.kind {
            ChangeKind::Partial => editable[source_idx].partial_changes.push(change.clone()),
            ChangeKind::Bulk => editable[source_idx].bulk_changes.push(change.clone()),
        }

        let dest_idx = *synthetic_by_code
            .entry(change.target_bus_number.clone())
            .or_insert_with(|| {
                synthetic.push(EditableBus {
                    id: format!("temp_{}_{}", change.target_bus_number, minted),
                    bus_code: change.target_bus_number.clone(),
                    stops: Vec::new(),
                    is_temporary: true,
                    partial_changes: Vec::new(),
                    bulk_changes: Vec::new(),
                });
                synthetic.len() - 1
            });

        let destination = &mut synthetic[dest_idx];
        destination
            .stops
            .extend(change.stops.iter().map(|name| AnnotatedStop {
                name: name.clone(),
                status: StopStatus::Added,
            }));
        match change.kind {
            ChangeKind::Partial => destination.partial_changes.push(change.clone()),
            ChangeKind::Bulk => destination.bulk_changes.push(change.clone()),
        }
    }

    // Per-stop disambiguation on the original buses.
    for bus in &mut editable {
        for stop in &mut bus.stops {
            let removed = changes.iter().any(|change| {
                change.source_bus_id == bus.id
                    && change.target_bus_number != bus.bus_code
                    && match change.kind {
                        ChangeKind::Bulk => true,
                        ChangeKind::Partial => change.stops.contains(&stop.name),
                    }
            });
            if removed {
                stop.status = StopStatus::Removed;
            } else if changes.iter().any(|change| {
                change.target_bus_number == bus.bus_code && change.stops.contains(&stop.name)
            }) {
                stop.status = StopStatus::Added;
            }
        }
    }

    editable.extend(synthetic);
    Ok(editable)
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempEditRequest {
    #[serde(rename = "busId")]
    pub source_bus_id: String,
    #[serde(rename = "newBusNumber")]
    pub target_bus_number: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub stops: Vec<String>,
    pub collection: String,
}

#[derive(thiserror::Error, Debug)]
pub enum EditError {
    #[error("invalid temp edit: {0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records a temporary change, expiring `ttl` from now. Bulk changes reuse
/// the source bus id so a repeat submission overwrites the previous record;
/// partial changes always insert a fresh record. Whether a partial change's
/// stops are really a subset of the source bus is the submitting UI's
/// responsibility.
pub async fn save_temp_edit<S: DocumentStore>(
    store: &S,
    request: TempEditRequest,
    ttl: TimeDelta,
    now: DateTime<Utc>,
) -> Result<Change, EditError> {
    if request.collection.is_empty() {
        return Err(EditError::Invalid("collection is required"));
    }
    if request.target_bus_number.trim().is_empty() {
        return Err(EditError::Invalid("new bus number is required"));
    }

    let expires_at = now + ttl;
    let change = match request.kind {
        ChangeKind::Bulk => {
            let buses = store
                .find_buses(&request.collection, BusFilter::All)
                .await
                .map_err(EditError::Store)?;
            let Some(source) = buses.into_iter().find(|bus| bus.id == request.source_bus_id)
            else {
                return Err(EditError::Invalid("source bus not found"));
            };
            Change::bulk(
                &request.source_bus_id,
                &request.target_bus_number,
                source.stops,
                &request.collection,
                expires_at,
            )
        }
        ChangeKind::Partial => {
            if request.stops.is_empty() {
                return Err(EditError::Invalid("partial change needs at least one stop"));
            }
            Change::partial(
                &request.source_bus_id,
                &request.target_bus_number,
                request.stops,
                &request.collection,
                now,
                expires_at,
            )
        }
    };

    store.upsert_change(change.clone()).await?;
    Ok(change)
}

/// Distinct bus codes across the given collections, for the edit UI's
/// target-code picker.
pub async fn all_bus_numbers<S: DocumentStore>(
    store: &S,
    collections: &[String],
) -> Result<Vec<String>, StoreError> {
    store.distinct_bus_codes(collections).await
}
