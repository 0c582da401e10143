//! Shared key generation for task-scoped storage.

use uuid::Uuid;

/// Key for a single artifact owned by a task.
pub fn task_key(task_id: Uuid, filename: &str) -> String {
    format!("tasks/{}/{}", task_id, filename)
}

/// Prefix owning every artifact of a task; deleting it is task teardown.
pub fn task_prefix(task_id: Uuid) -> String {
    format!("tasks/{}", task_id)
}
