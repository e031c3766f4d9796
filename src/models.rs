use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bus of a base timetable collection. Created by the upload pipeline,
/// never written by this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bus {
    pub id: String,
    pub bus_code: String,
    /// Ordered service points. Duplicates are allowed and meaningful, each
    /// occurrence is a distinct service point.
    pub stops: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Bulk,
    Partial,
}

/// A pending, time-limited reroute of stops from one bus to another bus code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// Bulk changes reuse the source bus id, so upserting a second bulk
    /// change for the same bus overwrites the first. Partial changes get a
    /// fresh id per submission and can coexist.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(rename = "busId")]
    pub source_bus_id: String,
    #[serde(rename = "newBusNumber")]
    pub target_bus_number: String,
    /// For partial changes, exactly the moved subset. For bulk changes, a
    /// snapshot of the whole stop list at creation time, kept for display.
    pub stops: Vec<String>,
    pub original_collection: String,
    pub expires_at: DateTime<Utc>,
}

impl Change {
    pub fn bulk(
        source_bus_id: &str,
        target_bus_number: &str,
        stops: Vec<String>,
        collection: &str,
        expires_at: DateTime<Utc>,
    ) -> Change {
        Change {
            id: source_bus_id.to_string(),
            kind: ChangeKind::Bulk,
            source_bus_id: source_bus_id.to_string(),
            target_bus_number: target_bus_number.to_string(),
            stops,
            original_collection: collection.to_string(),
            expires_at,
        }
    }

    pub fn partial(
        source_bus_id: &str,
        target_bus_number: &str,
        stops: Vec<String>,
        collection: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Change {
        Change {
            id: format!("{}-{}", source_bus_id, created_at.timestamp_millis()),
            kind: ChangeKind::Partial,
            source_bus_id: source_bus_id.to_string(),
            target_bus_number: target_bus_number.to_string(),
            stops,
            original_collection: collection.to_string(),
            expires_at,
        }
    }

    /// Active strictly before the expiry instant. Inactive changes are
    /// logically void even before the reaper deletes them.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// An exam window. Exam-partition buses belong to the window via their
/// `exam_title`; the window itself bounds when the partition is served.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub exam_title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub direction: String,
    #[serde(default)]
    pub stops: Vec<String>,
}

impl Exam {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}
