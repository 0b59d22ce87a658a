use std::collections::HashMap;

use uuid::Uuid;

use crate::models::task::Task;

/// Insertion-ordered collection of the tasks known to this session.
///
/// Only two mutations exist: insert on submit and whole-record replace on
/// refresh. Entries are never evicted; when a refresh fails, the last known
/// record simply stays until a later tick succeeds.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    order: Vec<Uuid>,
    tasks: HashMap<Uuid, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly submitted task. Ids are backend-assigned and unique per
    /// session, so re-inserting an id replaces the record but keeps its
    /// display position.
    pub fn insert(&mut self, task: Task) {
        let id = task.id;
        if self.tasks.insert(id, task).is_none() {
            self.order.push(id);
        }
    }

    /// Replace an existing record atomically. Returns false and stores
    /// nothing when the id was never submitted through this registry, so a
    /// stray status response can never create an entry.
    pub fn replace(&mut self, task: Task) -> bool {
        match self.tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.tasks.contains_key(id)
    }

    /// Task ids in insertion order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.order.clone()
    }

    /// Owned copies of every task in insertion order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.order
            .iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;

    #[test]
    fn snapshot_preserves_insertion_order() {
        let mut registry = TaskRegistry::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        registry.insert(Task::pending(first));
        registry.insert(Task::pending(second));

        let ids: Vec<Uuid> = registry.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn replace_on_unknown_id_never_inserts() {
        let mut registry = TaskRegistry::new();
        let stray = Task::pending(Uuid::new_v4());

        assert!(!registry.replace(stray));
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_swaps_the_whole_record() {
        let mut registry = TaskRegistry::new();
        let id = Uuid::new_v4();
        registry.insert(Task::pending(id));

        let mut update = Task::pending(id);
        update.status = TaskStatus::Processing;
        update.progress = 40;
        update.message = "meshing".to_string();

        assert!(registry.replace(update.clone()));
        assert_eq!(registry.get(&id), Some(&update));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reinserting_an_id_keeps_its_position() {
        let mut registry = TaskRegistry::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        registry.insert(Task::pending(first));
        registry.insert(Task::pending(second));
        registry.insert(Task::pending(first));

        assert_eq!(registry.ids(), vec![first, second]);
        assert_eq!(registry.len(), 2);
    }
}
