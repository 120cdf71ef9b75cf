use tracing::debug;

use super::grouping::{group_by_day, DayGroup};
use super::pagination::{self, PageButton};
use super::store::CollectionStore;
use crate::domain::{Event, ListQuery, PageMeta, Stats, TodoId};
use crate::ports::Clock;

/// What the controller should do after an event was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    None,
    /// The server page must change; load this query
    Reload(ListQuery),
}

/// The reconciled client state: counters, live list with snapshots, active
/// query and paginator metadata. All changes go through [`apply`].
///
/// [`apply`]: TodoProjection::apply
#[derive(Debug, Clone, Default)]
pub struct TodoProjection {
    pub stats: Stats,
    pub store: CollectionStore,
    /// Query of the page currently shown
    pub query: ListQuery,
    pub meta: PageMeta,
    /// Whether a listing request is in flight
    pub loading: bool,
    /// Number of pages loaded so far
    pub generation: u64,
}

impl TodoProjection {
    pub fn new(recent_limit: usize) -> Self {
        Self {
            store: CollectionStore::new(recent_limit),
            ..Self::default()
        }
    }

    /// Apply an event to the projection
    pub fn apply(&mut self, event: &Event, clock: &dyn Clock) -> FollowUp {
        match event {
            Event::NavigationStarted { .. } => {
                self.loading = true;
            }

            Event::PageLoaded { query, page } => {
                self.loading = false;
                self.generation += 1;
                self.query = query.clone();
                self.meta = page.meta.clone();
                self.stats = page.stats;
                self.store.replace_all(page.items.clone(), clock);
            }

            Event::NavigationFailed { .. } => {
                self.loading = false;
            }

            Event::TodoCreated { todo, generation, .. } => {
                // The page was replaced while the create was in flight; the
                // fresh counters may already include it
                if *generation != self.generation {
                    debug!("Todo {} was created against an older page, reloading", todo.id);
                    return FollowUp::Reload(self.query.clone());
                }
                if self.store.insert(todo.clone(), clock) {
                    self.stats = self.stats.on_create(todo);
                } else {
                    debug!("Todo {} already listed, not counting it again", todo.id);
                }
            }

            Event::TodoUpdated { todo, .. } | Event::TodoToggled { todo, .. } => {
                let previous = self.store.find_reconcilable(todo.id).cloned();
                self.stats = self.stats.on_toggle_or_update(previous.as_ref(), todo);
                self.store.replace_by_id(todo.clone());
            }

            Event::TodoDeleted { id, .. } => {
                let deleted = self.store.find_reconcilable(*id).cloned();
                self.stats = self.stats.on_delete(deleted.as_ref());
                self.store.remove_by_id(*id);
                return self.reload_if_page_emptied();
            }

            Event::MutationAcknowledged { .. } => {
                // Accepted without a record to reconcile; fetch the truth
                return FollowUp::Reload(self.query.clone());
            }

            Event::MutationStarted { .. } | Event::MutationFailed { .. } | Event::QuitRequested => {}
        }

        FollowUp::None
    }

    /// A page emptied by deletes on anything but the first page no longer
    /// exists on the server; step back one page.
    fn reload_if_page_emptied(&self) -> FollowUp {
        let page = self.query.current_page();
        if self.store.is_empty() && page > 1 {
            FollowUp::Reload(self.query.clone().with_page(Some(page - 1)))
        } else {
            FollowUp::None
        }
    }

    pub fn find(&self, id: TodoId) -> Option<&crate::domain::Todo> {
        self.store.find_reconcilable(id)
    }

    /// Live list grouped by day under the active status filter
    pub fn groups(&self, clock: &dyn Clock) -> Vec<DayGroup<'_>> {
        group_by_day(self.store.live(), self.query.status, |at| clock.local_day(at))
    }

    pub fn page_buttons(&self) -> Vec<PageButton> {
        pagination::numbered_buttons(&self.meta, &self.query)
    }

    pub fn previous_page(&self) -> Option<ListQuery> {
        pagination::previous(&self.meta, &self.query)
    }

    pub fn next_page(&self) -> Option<ListQuery> {
        pagination::next(&self.meta, &self.query)
    }

    pub fn follow_link(&self, url: Option<&str>) -> Option<ListQuery> {
        pagination::navigation_for(url, &self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MutationKind, StatusFilter, Todo, TodoPage};
    use crate::error::GatewayError;
    use crate::ports::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn todo(id: u64, day: u32, finished: bool) -> Todo {
        Todo {
            id: TodoId(id),
            title: format!("todo {id}"),
            description: None,
            is_finished: finished,
            cover: None,
            created_at: at(day, 8 + id as u32),
            updated_at: None,
        }
    }

    fn clock() -> FixedClock {
        FixedClock::utc(at(2, 20))
    }

    fn loaded(page: u32) -> TodoProjection {
        let mut projection = TodoProjection::new(6);
        let query = ListQuery::new("", StatusFilter::All).with_page(Some(page));
        let page = TodoPage {
            items: vec![todo(1, 2, false), todo(2, 2, true), todo(3, 1, false)],
            meta: PageMeta::default(),
            stats: Stats::new(3, 1, 2),
        };
        projection.apply(&Event::PageLoaded { query, page }, &clock());
        projection
    }

    fn toggled(id: u64, day: u32, finished: bool) -> Event {
        Event::TodoToggled {
            todo: todo(id, day, finished),
            message: "ok".into(),
        }
    }

    #[test]
    fn test_page_load_resets_state() {
        let projection = loaded(1);
        assert_eq!(projection.stats, Stats::new(3, 1, 2));
        assert_eq!(projection.store.len(), 3);
        assert_eq!(projection.store.todays().len(), 2);
        assert!(!projection.loading);
    }

    #[test]
    fn test_toggle_moves_one_unit() {
        let mut projection = loaded(1);
        let follow_up = projection.apply(&toggled(1, 2, true), &clock());
        assert_eq!(follow_up, FollowUp::None);
        assert_eq!(projection.stats, Stats::new(3, 2, 1));
        assert!(projection.find(TodoId(1)).unwrap().is_finished);
    }

    #[test]
    fn test_concurrent_toggles_commute() {
        let first = toggled(1, 2, true);
        let second = toggled(2, 2, false);

        let mut forward = loaded(1);
        forward.apply(&first, &clock());
        forward.apply(&second, &clock());

        let mut backward = loaded(1);
        backward.apply(&second, &clock());
        backward.apply(&first, &clock());

        assert_eq!(forward.stats, backward.stats);
        assert_eq!(forward.stats, Stats::new(3, 1, 2));
        assert_eq!(forward.store.live(), backward.store.live());
    }

    #[test]
    fn test_duplicate_toggle_response_does_not_double_count() {
        let mut projection = loaded(1);
        projection.apply(&toggled(1, 2, true), &clock());
        projection.apply(&toggled(1, 2, true), &clock());
        assert_eq!(projection.stats, Stats::new(3, 2, 1));
    }

    #[test]
    fn test_update_of_unknown_todo_leaves_stats() {
        let mut projection = loaded(1);
        let event = Event::TodoUpdated {
            todo: todo(42, 2, true),
            message: "ok".into(),
        };
        projection.apply(&event, &clock());
        assert_eq!(projection.stats, Stats::new(3, 1, 2));
        assert!(projection.store.find(TodoId(42)).is_none());
    }

    #[test]
    fn test_create_applies_once() {
        let mut projection = loaded(1);
        let event = Event::TodoCreated {
            todo: todo(9, 2, false),
            message: "ok".into(),
            generation: projection.generation,
        };
        projection.apply(&event, &clock());
        projection.apply(&event, &clock());
        assert_eq!(projection.stats, Stats::new(4, 1, 3));
        assert_eq!(projection.store.len(), 4);
        assert_eq!(projection.store.todays()[0].id, TodoId(9));
    }

    #[test]
    fn test_delete_updates_counts_and_keeps_snapshots() {
        let mut projection = loaded(1);
        let follow_up = projection.apply(
            &Event::TodoDeleted { id: TodoId(2), message: "ok".into() },
            &clock(),
        );
        assert_eq!(follow_up, FollowUp::None);
        assert_eq!(projection.stats, Stats::new(2, 0, 2));
        assert!(projection.store.find(TodoId(2)).is_none());
        assert!(projection.store.recent().iter().any(|t| t.id == TodoId(2)));
    }

    #[test]
    fn test_emptied_page_steps_back() {
        let mut projection = loaded(3);
        for id in 1..=3 {
            let follow_up = projection.apply(
                &Event::TodoDeleted { id: TodoId(id), message: "ok".into() },
                &clock(),
            );
            if id < 3 {
                assert_eq!(follow_up, FollowUp::None);
            } else {
                assert_eq!(follow_up, FollowUp::Reload(projection.query.clone().with_page(Some(2))));
            }
        }
    }

    #[test]
    fn test_emptied_first_page_stays() {
        let mut projection = loaded(1);
        for id in 1..=3 {
            let follow_up = projection.apply(
                &Event::TodoDeleted { id: TodoId(id), message: "ok".into() },
                &clock(),
            );
            assert_eq!(follow_up, FollowUp::None);
        }
        assert_eq!(projection.stats, Stats::new(0, 0, 0));
    }

    #[test]
    fn test_failures_change_nothing() {
        let mut projection = loaded(1);
        let before = projection.store.live().to_vec();
        projection.apply(
            &Event::MutationFailed {
                kind: MutationKind::Toggle,
                id: Some(TodoId(1)),
                error: GatewayError::StaleSession,
            },
            &clock(),
        );
        assert_eq!(projection.store.live(), before.as_slice());
        assert_eq!(projection.stats, Stats::new(3, 1, 2));
    }

    #[test]
    fn test_acknowledged_without_record_reloads() {
        let mut projection = loaded(2);
        let follow_up = projection.apply(
            &Event::MutationAcknowledged {
                kind: MutationKind::Create,
                id: None,
                message: "ok".into(),
            },
            &clock(),
        );
        assert_eq!(follow_up, FollowUp::Reload(projection.query.clone()));
    }

    #[test]
    fn test_create_answered_after_a_page_change_reloads() {
        let mut projection = loaded(1);
        let sent_against = projection.generation;

        let page_two = TodoPage {
            items: vec![todo(4, 1, false)],
            meta: PageMeta::default(),
            stats: Stats::new(4, 1, 3),
        };
        let query = ListQuery::default().with_page(Some(2));
        projection.apply(&Event::PageLoaded { query: query.clone(), page: page_two }, &clock());

        let follow_up = projection.apply(
            &Event::TodoCreated {
                todo: todo(9, 2, false),
                message: "ok".into(),
                generation: sent_against,
            },
            &clock(),
        );

        assert_eq!(follow_up, FollowUp::Reload(query));
        assert_eq!(projection.stats, Stats::new(4, 1, 3));
        assert!(projection.store.find(TodoId(9)).is_none());
        assert_eq!(projection.store.len(), 1);
    }
}
