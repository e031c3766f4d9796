use crate::models::Exam;
use crate::store::{DocumentStore, ExamFilter, StoreError};
use ahash::AHashMap;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// An exam window as shown to riders: schedules become visible one day
/// before the exam starts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    #[serde(flatten)]
    pub exam: Exam,
    pub is_available: bool,
    pub available_from: DateTime<Utc>,
    pub available_from_formatted: String,
    pub start_date_formatted: String,
    pub end_date_formatted: String,
}

pub async fn get_active_exams<S: DocumentStore>(
    store: &S,
    now: DateTime<Utc>,
) -> Result<Vec<Exam>, StoreError> {
    store.find_exams(ExamFilter::ActiveAt(now)).await
}

/// All upcoming and running exams, one entry per title (the instance with
/// the most recent start date wins), ended exams dropped, sorted by start
/// date.
pub async fn get_all_exams<S: DocumentStore>(
    store: &S,
    now: DateTime<Utc>,
) -> Result<Vec<ExamSummary>, StoreError> {
    let exams = store.find_exams(ExamFilter::All).await?;

    let mut by_title: AHashMap<String, Exam> = AHashMap::new();
    for exam in exams {
        if now > exam.end_date {
            continue;
        }
        match by_title.get(&exam.exam_title) {
            Some(existing) if existing.start_date >= exam.start_date => {}
            _ => {
                by_title.insert(exam.exam_title.clone(), exam);
            }
        }
    }

    let mut summaries: Vec<ExamSummary> = by_title
        .into_values()
        .map(|exam| {
            let available_from = exam.start_date - TimeDelta::days(1);
            ExamSummary {
                is_available: now >= available_from && now <= exam.end_date,
                available_from,
                available_from_formatted: available_from.format("%m/%d/%Y").to_string(),
                start_date_formatted: exam.start_date.format("%m/%d/%Y").to_string(),
                end_date_formatted: exam.end_date.format("%m/%d/%Y").to_string(),
                exam,
            }
        })
        .collect();
    summaries.sort_by(|a, b| a.exam.start_date.cmp(&b.exam.start_date));
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn exam(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Exam {
        Exam {
            id: id.to_string(),
            exam_title: title.to_string(),
            start_date: start,
            end_date: end,
            direction: "incoming".to_string(),
            stops: vec![],
        }
    }

    #[tokio::test]
    async fn test_active_exams_window() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_exam(exam(
                "e1",
                "Finals Week 1",
                now - TimeDelta::days(1),
                now + TimeDelta::days(1),
            ))
            .await;
        store
            .insert_exam(exam(
                "e2",
                "Finals Week 2",
                now + TimeDelta::days(3),
                now + TimeDelta::days(5),
            ))
            .await;

        let active = get_active_exams(&store, now).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "e1");
    }

    #[tokio::test]
    async fn test_all_exams_groups_by_title_and_drops_ended() {
        let store = MemoryStore::new();
        let now = Utc::now();
        // Two instances of the same title; the later one should win.
        store
            .insert_exam(exam(
                "e1",
                "Midterms",
                now + TimeDelta::days(2),
                now + TimeDelta::days(4),
            ))
            .await;
        store
            .insert_exam(exam(
                "e2",
                "Midterms",
                now + TimeDelta::days(10),
                now + TimeDelta::days(12),
            ))
            .await;
        // Already over, must not appear.
        store
            .insert_exam(exam(
                "e3",
                "Placement",
                now - TimeDelta::days(5),
                now - TimeDelta::days(3),
            ))
            .await;

        let all = get_all_exams(&store, now).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].exam.id, "e2");
        assert!(!all[0].is_available);
    }

    #[tokio::test]
    async fn test_availability_opens_one_day_early() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_exam(exam(
                "e1",
                "Finals",
                now + TimeDelta::hours(12),
                now + TimeDelta::days(2),
            ))
            .await;

        let all = get_all_exams(&store, now).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_available);
        assert_eq!(
            all[0].available_from,
            now + TimeDelta::hours(12) - TimeDelta::days(1)
        );
    }
}
