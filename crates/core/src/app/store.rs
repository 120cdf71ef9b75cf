use crate::domain::{Todo, TodoId};
use crate::ports::Clock;

/// Default length of the "recent" snapshot
pub const DEFAULT_RECENT_LIMIT: usize = 6;

/// Owner of the live list of the current page and its two snapshots.
///
/// `recent` and `todays` are captured when a page is loaded. Local
/// mutations only touch the live list, except that edits are mirrored
/// into `todays` and a todo created today is prepended to it. Deleted
/// todos stay visible in both snapshots until the next page load.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    live: Vec<Todo>,
    recent: Vec<Todo>,
    todays: Vec<Todo>,
    recent_limit: usize,
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_LIMIT)
    }
}

impl CollectionStore {
    pub fn new(recent_limit: usize) -> Self {
        Self {
            live: Vec::new(),
            recent: Vec::new(),
            todays: Vec::new(),
            recent_limit,
        }
    }

    pub fn live(&self) -> &[Todo] {
        &self.live
    }

    pub fn recent(&self) -> &[Todo] {
        &self.recent
    }

    pub fn todays(&self) -> &[Todo] {
        &self.todays
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn find(&self, id: TodoId) -> Option<&Todo> {
        self.live.iter().find(|todo| todo.id == id)
    }

    /// Latest known copy of a todo for reconciling counters. Falls back to
    /// the `todays` snapshot, which receives edits; `recent` does not and
    /// may carry an outdated finished flag.
    pub fn find_reconcilable(&self, id: TodoId) -> Option<&Todo> {
        self.find(id)
            .or_else(|| self.todays.iter().find(|todo| todo.id == id))
    }

    /// Replace the page with server data and recapture both snapshots
    pub fn replace_all(&mut self, todos: Vec<Todo>, clock: &dyn Clock) {
        let today = clock.today();
        self.recent = todos.iter().take(self.recent_limit).cloned().collect();
        self.todays = todos
            .iter()
            .filter(|todo| clock.local_day(&todo.created_at) == today)
            .cloned()
            .collect();
        self.live = todos;
    }

    /// Prepend a created todo. Returns `false` when the id was already
    /// present, in which case the entry is replaced in place instead.
    pub fn insert(&mut self, todo: Todo, clock: &dyn Clock) -> bool {
        if self.find(todo.id).is_some() {
            self.replace_by_id(todo);
            return false;
        }

        if clock.local_day(&todo.created_at) == clock.today()
            && !self.todays.iter().any(|t| t.id == todo.id)
        {
            self.todays.insert(0, todo.clone());
        }
        self.live.insert(0, todo);
        true
    }

    /// Swap in the server's copy of an edited todo. Returns the previous
    /// live copy, if there was one.
    pub fn replace_by_id(&mut self, todo: Todo) -> Option<Todo> {
        for entry in self.todays.iter_mut().filter(|t| t.id == todo.id) {
            *entry = todo.clone();
        }

        self.live
            .iter_mut()
            .find(|t| t.id == todo.id)
            .map(|entry| std::mem::replace(entry, todo))
    }

    /// Drop a todo from the live list. Snapshots are left as captured.
    pub fn remove_by_id(&mut self, id: TodoId) -> Option<Todo> {
        let pos = self.live.iter().position(|todo| todo.id == id)?;
        Some(self.live.remove(pos))
    }
}
