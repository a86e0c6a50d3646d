use crate::domain::models::TaskSnapshot;

/// Receives a snapshot after every task status transition, e.g. to keep a
/// live status display current.
pub trait StatusObserver: Send + Sync {
    fn task_updated(&self, task: &TaskSnapshot);
}
