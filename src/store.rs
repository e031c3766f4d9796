use crate::models::{Bus, Change, ChangeKind, Exam};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::sync::RwLock;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Typed queries over base timetable collections. Stop matching is exact and
/// case-sensitive, matching the ingestion-time normalization.
#[derive(Clone, Debug)]
pub enum BusFilter<'a> {
    All,
    AtStop {
        stop: &'a str,
    },
    AtStopForExam {
        stop: &'a str,
        exam_title: Option<&'a str>,
        direction: Option<&'a str>,
    },
}

impl BusFilter<'_> {
    fn matches(&self, bus: &Bus) -> bool {
        match self {
            BusFilter::All => true,
            BusFilter::AtStop { stop } => bus.stops.iter().any(|s| s == stop),
            BusFilter::AtStopForExam {
                stop,
                exam_title,
                direction,
            } => {
                bus.stops.iter().any(|s| s == stop)
                    && exam_title.is_none_or(|t| bus.exam_title.as_deref() == Some(t))
                    && direction.is_none_or(|d| bus.direction.as_deref() == Some(d))
            }
        }
    }
}

/// Typed queries over the temporary-change collection. Both variants filter
/// on `expires_at > now`, so expired records never reach the engine.
#[derive(Clone, Debug)]
pub enum ChangeFilter<'a> {
    ActiveInCollection {
        collection: &'a str,
        now: DateTime<Utc>,
    },
    /// Active changes that can govern `stop` on one of the given source
    /// buses: every bulk change for those buses, plus partial changes
    /// listing the stop.
    ActiveForStop {
        collection: &'a str,
        stop: &'a str,
        source_bus_ids: &'a [String],
        now: DateTime<Utc>,
    },
}

impl ChangeFilter<'_> {
    fn matches(&self, change: &Change) -> bool {
        match self {
            ChangeFilter::ActiveInCollection { collection, now } => {
                change.original_collection == *collection && change.is_active(*now)
            }
            ChangeFilter::ActiveForStop {
                collection,
                stop,
                source_bus_ids,
                now,
            } => {
                change.original_collection == *collection
                    && change.is_active(*now)
                    && source_bus_ids.contains(&change.source_bus_id)
                    && match change.kind {
                        ChangeKind::Bulk => true,
                        ChangeKind::Partial => change.stops.iter().any(|s| s == stop),
                    }
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub enum ExamFilter {
    All,
    ActiveAt(DateTime<Utc>),
}

/// The persistence seam. The storage engine itself is an external
/// collaborator; the core only ever issues these calls. Every method is a
/// potential suspension point.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync {
    async fn find_buses(
        &self,
        collection: &str,
        filter: BusFilter<'_>,
    ) -> Result<Vec<Bus>, StoreError>;

    /// Distinct stop names in a collection, sorted alphabetically.
    async fn distinct_stops(
        &self,
        collection: &str,
        exam_title: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Vec<String>, StoreError>;

    /// Distinct bus codes across several collections, sorted.
    async fn distinct_bus_codes(&self, collections: &[String]) -> Result<Vec<String>, StoreError>;

    async fn find_changes(&self, filter: ChangeFilter<'_>) -> Result<Vec<Change>, StoreError>;

    /// Identifier-keyed upsert. This is the sole concurrency-control
    /// mechanism for the change collection: two submissions with the same id
    /// leave exactly one record, last write wins.
    async fn upsert_change(&self, change: Change) -> Result<(), StoreError>;

    async fn delete_expired_changes(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn find_exams(&self, filter: ExamFilter) -> Result<Vec<Exam>, StoreError>;

    async fn delete_expired_exams(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[derive(Default)]
struct StoreInner {
    /// collection name -> buses
    buses: AHashMap<String, Vec<Bus>>,
    /// change id -> change
    changes: AHashMap<String, Change>,
    /// exam id -> exam
    exams: AHashMap<String, Exam>,
}

/// In-memory document store backing the server binary and the tests. Base
/// collections are hydrated from a JSON seed file at boot (the Excel upload
/// pipeline that feeds a real deployment is a separate service).
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

#[derive(serde::Deserialize)]
struct SeedFile {
    #[serde(default)]
    collections: AHashMap<String, Vec<Bus>>,
    #[serde(default)]
    exams: Vec<Exam>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            inner: RwLock::new(StoreInner::default()),
        }
    }

    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> anyhow::Result<MemoryStore> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedFile = serde_json::from_str(&raw)?;

        let mut exams = AHashMap::new();
        for exam in seed.exams {
            exams.insert(exam.id.clone(), exam);
        }
        let inner = StoreInner {
            buses: seed.collections,
            changes: AHashMap::new(),
            exams,
        };

        Ok(MemoryStore {
            inner: RwLock::new(inner),
        })
    }

    pub async fn insert_bus(&self, collection: &str, bus: Bus) {
        let mut inner = self.inner.write().await;
        inner
            .buses
            .entry(collection.to_string())
            .or_default()
            .push(bus);
    }

    pub async fn insert_exam(&self, exam: Exam) {
        let mut inner = self.inner.write().await;
        inner.exams.insert(exam.id.clone(), exam);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl DocumentStore for MemoryStore {
    async fn find_buses(
        &self,
        collection: &str,
        filter: BusFilter<'_>,
    ) -> Result<Vec<Bus>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .buses
            .get(collection)
            .map(|buses| {
                buses
                    .iter()
                    .filter(|bus| filter.matches(bus))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn distinct_stops(
        &self,
        collection: &str,
        exam_title: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        let mut distinct = BTreeSet::new();
        if let Some(buses) = inner.buses.get(collection) {
            for bus in buses {
                if exam_title.is_some() && bus.exam_title.as_deref() != exam_title {
                    continue;
                }
                if direction.is_some() && bus.direction.as_deref() != direction {
                    continue;
                }
                distinct.extend(bus.stops.iter().cloned());
            }
        }
        Ok(distinct.into_iter().collect())
    }

    async fn distinct_bus_codes(&self, collections: &[String]) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        let mut distinct = BTreeSet::new();
        for collection in collections {
            if let Some(buses) = inner.buses.get(collection) {
                distinct.extend(buses.iter().map(|bus| bus.bus_code.clone()));
            }
        }
        Ok(distinct.into_iter().collect())
    }

    async fn find_changes(&self, filter: ChangeFilter<'_>) -> Result<Vec<Change>, StoreError> {
        let inner = self.inner.read().await;
        let mut matched: Vec<Change> = inner
            .changes
            .values()
            .filter(|change| filter.matches(change))
            .cloned()
            .collect();
        // Deterministic read order; map iteration order is arbitrary.
        matched.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn upsert_change(&self, change: Change) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.changes.insert(change.id.clone(), change);
        Ok(())
    }

    async fn delete_expired_changes(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.changes.len();
        inner.changes.retain(|_, change| change.is_active(now));
        Ok(before - inner.changes.len())
    }

    async fn find_exams(&self, filter: ExamFilter) -> Result<Vec<Exam>, StoreError> {
        let inner = self.inner.read().await;
        let mut matched: Vec<Exam> = inner
            .exams
            .values()
            .filter(|exam| match filter {
                ExamFilter::All => true,
                ExamFilter::ActiveAt(now) => exam.is_active(now),
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn delete_expired_exams(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.exams.len();
        inner.exams.retain(|_, exam| exam.end_date >= now);
        Ok(before - inner.exams.len())
    }
}
