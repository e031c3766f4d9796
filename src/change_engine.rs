use crate::models::{Bus, Change, ChangeKind};

/// Outcome of merging one bus with the active changes that reference it, for
/// one stop. When no change governs the stop, `governing` is `None` and the
/// effective code is the bus's own code.
#[derive(Clone, Debug, PartialEq)]
pub struct StopResolution<'a> {
    pub effective_code: &'a str,
    pub governing: Option<&'a Change>,
}

/// Decides which active change, if any, governs `stop_name` on `bus`.
///
/// Candidates are the bulk change for this bus (there is at most one, the
/// record id is the bus id) followed by every partial change listing the
/// stop. The stable sort by expiry descending means the most recently
/// extended change wins, with bulk winning ties only because it was listed
/// first. A partial change submitted after a bulk change therefore overrides
/// it for its subset of stops, while the bulk change keeps governing the
/// rest.
///
/// Pure computation over already-fetched data; callers are responsible for
/// passing only active (non-expired) changes.
pub fn resolve_stop<'a>(
    bus: &'a Bus,
    stop_name: &str,
    active_changes: &'a [Change],
) -> StopResolution<'a> {
    let mut candidates: Vec<&Change> = Vec::new();

    if let Some(bulk) = active_changes
        .iter()
        .find(|c| c.kind == ChangeKind::Bulk && c.source_bus_id == bus.id)
    {
        candidates.push(bulk);
    }

    candidates.extend(active_changes.iter().filter(|c| {
        c.kind == ChangeKind::Partial
            && c.source_bus_id == bus.id
            && c.stops.iter().any(|s| s == stop_name)
    }));

    candidates.sort_by(|a, b| b.expires_at.cmp(&a.expires_at));

    match candidates.first() {
        Some(winner) => StopResolution {
            effective_code: &winner.target_bus_number,
            governing: Some(winner),
        },
        None => StopResolution {
            effective_code: &bus.bus_code,
            governing: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn bus(id: &str, code: &str, stops: &[&str]) -> Bus {
        Bus {
            id: id.to_string(),
            bus_code: code.to_string(),
            stops: stops.iter().map(|s| s.to_string()).collect(),
            exam_title: None,
            direction: None,
        }
    }

    #[test]
    fn test_no_change_returns_own_code() {
        let bus = bus("b1", "KT - 5", &["Gate A", "Gate B"]);
        let resolution = resolve_stop(&bus, "Gate A", &[]);
        assert_eq!(resolution.effective_code, "KT - 5");
        assert!(resolution.governing.is_none());
    }

    #[test]
    fn test_bulk_change_governs_every_stop() {
        let bus = bus("b1", "KT - 5", &["Gate A", "Gate B", "Gate C"]);
        let now = Utc::now();
        let changes = vec![Change::bulk(
            "b1",
            "KT - 9",
            bus.stops.clone(),
            "admin_incoming",
            now + TimeDelta::hours(1),
        )];

        for stop in &bus.stops {
            let resolution = resolve_stop(&bus, stop, &changes);
            assert_eq!(resolution.effective_code, "KT - 9");
        }
    }

    #[test]
    fn test_other_buses_changes_are_ignored() {
        let bus = bus("b1", "KT - 5", &["Gate A"]);
        let now = Utc::now();
        let changes = vec![Change::bulk(
            "b2",
            "KT - 9",
            vec![],
            "admin_incoming",
            now + TimeDelta::hours(1),
        )];

        let resolution = resolve_stop(&bus, "Gate A", &changes);
        assert_eq!(resolution.effective_code, "KT - 5");
        assert!(resolution.governing.is_none());
    }

    #[test]
    fn test_newer_partial_overrides_bulk_for_its_subset_only() {
        let bus = bus("b1", "KT - 5", &["Gate A", "Gate B", "Gate C"]);
        let now = Utc::now();
        let changes = vec![
            Change::bulk(
                "b1",
                "KT - 7",
                bus.stops.clone(),
                "admin_incoming",
                now + TimeDelta::hours(1),
            ),
            Change::partial(
                "b1",
                "KT - 9",
                vec!["Gate B".to_string()],
                "admin_incoming",
                now,
                now + TimeDelta::hours(2),
            ),
        ];

        assert_eq!(resolve_stop(&bus, "Gate B", &changes).effective_code, "KT - 9");
        assert_eq!(resolve_stop(&bus, "Gate A", &changes).effective_code, "KT - 7");
        assert_eq!(resolve_stop(&bus, "Gate C", &changes).effective_code, "KT - 7");
    }

    #[test]
    fn test_bulk_wins_expiry_tie_by_candidate_order() {
        let bus = bus("b1", "KT - 5", &["Gate A"]);
        let now = Utc::now();
        let expiry = now + TimeDelta::hours(1);
        let changes = vec![
            Change::partial(
                "b1",
                "KT - 9",
                vec!["Gate A".to_string()],
                "admin_incoming",
                now,
                expiry,
            ),
            Change::bulk("b1", "KT - 7", vec!["Gate A".to_string()], "admin_incoming", expiry),
        ];

        // Stable sort keeps the bulk candidate ahead of same-expiry partials.
        assert_eq!(resolve_stop(&bus, "Gate A", &changes).effective_code, "KT - 7");
    }

    #[test]
    fn test_most_recent_partial_wins_among_partials() {
        let bus = bus("b1", "KT - 5", &["Gate A"]);
        let now = Utc::now();
        let changes = vec![
            Change::partial(
                "b1",
                "KT - 7",
                vec!["Gate A".to_string()],
                "admin_incoming",
                now,
                now + TimeDelta::minutes(30),
            ),
            Change::partial(
                "b1",
                "KT - 9",
                vec!["Gate A".to_string()],
                "admin_incoming",
                now + TimeDelta::seconds(1),
                now + TimeDelta::hours(2),
            ),
        ];

        let resolution = resolve_stop(&bus, "Gate A", &changes);
        assert_eq!(resolution.effective_code, "KT - 9");
        assert_eq!(
            resolution.governing.unwrap().expires_at,
            now + TimeDelta::hours(2)
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let bus = bus("b1", "KT - 5", &["Gate A", "Gate B"]);
        let now = Utc::now();
        let changes = vec![Change::partial(
            "b1",
            "KT - 9",
            vec!["Gate B".to_string()],
            "admin_incoming",
            now,
            now + TimeDelta::hours(1),
        )];

        let first = resolve_stop(&bus, "Gate B", &changes);
        let second = resolve_stop(&bus, "Gate B", &changes);
        assert_eq!(first, second);
    }
}
