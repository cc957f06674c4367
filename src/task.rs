// Task record

use crate::now_ms;
use crate::record::Record;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Largest magnitude at which every integer is exactly representable in an f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Caller-assigned task identifier; serialized as a bare JSON number or string
///
/// Integral floats such as `3.0` deserialize as `Int(3)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TaskId {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTaskId::deserialize(deserializer)? {
            RawTaskId::Int(i) => Ok(TaskId::Int(i)),
            RawTaskId::Float(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => Ok(TaskId::Int(f as i64)),
            RawTaskId::Float(f) => Err(D::Error::custom(format!("task id {} is not an integer", f))),
            RawTaskId::Text(s) => Ok(TaskId::Text(s)),
        }
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        TaskId::Int(id)
    }
}

impl From<i32> for TaskId {
    fn from(id: i32) -> Self {
        TaskId::Int(id as i64)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId::Text(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Text(id)
    }
}

impl From<&TaskId> for Value {
    fn from(id: &TaskId) -> Self {
        match id {
            TaskId::Int(i) => Value::from(*i),
            TaskId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl From<TaskId> for Value {
    fn from(id: TaskId) -> Self {
        Value::from(&id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Int(i) => write!(f, "{}", i),
            TaskId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A to-do item
///
/// Plain value holder: setters never validate and never touch `updated_at`.
/// Bump it with [`Task::set_updated_at`] when that matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    description: String,
    completed: bool,
    archived: bool,
    #[serde(serialize_with = "serialize_number")]
    priority: f64,
    created_at: i64,
    updated_at: i64,
}

impl Task {
    /// Create a task; both timestamps are set to the current time
    pub fn new(
        id: impl Into<TaskId>,
        description: impl Into<String>,
        completed: bool,
        archived: bool,
        priority: f64,
    ) -> Self {
        let now = now_ms();
        Self {
            id: id.into(),
            description: description.into(),
            completed,
            archived,
            priority,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<TaskId>) {
        self.id = id.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub fn archived(&self) -> bool {
        self.archived
    }

    pub fn set_archived(&mut self, archived: bool) {
        self.archived = archived;
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: f64) {
        self.priority = priority;
    }

    /// Creation time in milliseconds since epoch
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn set_created_at(&mut self, created_at: i64) {
        self.created_at = created_at;
    }

    /// Last update time in milliseconds since epoch
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn set_updated_at(&mut self, updated_at: i64) {
        self.updated_at = updated_at;
    }
}

// Integral values are written as JSON integers (`2`, not `2.0`)
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl Record for Task {
    fn id_value(&self) -> Value {
        Value::from(&self.id)
    }

    fn collection_key() -> &'static str {
        "tasks"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_stamps_equal_timestamps() {
        let task = Task::new(7, "x", false, false, 1.0);
        assert_eq!(task.created_at(), task.updated_at());
        // Should be reasonable timestamp (after year 2020)
        assert!(task.created_at() > 1_600_000_000_000);
    }

    #[test]
    fn test_setters_do_not_touch_updated_at() {
        let mut task = Task::new(7, "x", false, false, 1.0);
        let updated_at = task.updated_at();

        task.set_description("changed");
        task.set_completed(true);
        task.set_archived(true);
        task.set_priority(5.0);

        assert_eq!(task.description(), "changed");
        assert!(task.completed());
        assert!(task.archived());
        assert_eq!(task.priority(), 5.0);
        assert_eq!(task.updated_at(), updated_at);
    }

    #[test]
    fn test_timestamp_setters() {
        let mut task = Task::new("a", "x", false, false, 0.0);
        task.set_created_at(1000);
        task.set_updated_at(2000);
        assert_eq!(task.created_at(), 1000);
        assert_eq!(task.updated_at(), 2000);
    }

    #[test]
    fn test_serialization_shape() {
        let mut task = Task::new(7, "write docs", false, true, 2.0);
        task.set_created_at(1000);
        task.set_updated_at(1500);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "description": "write docs",
                "completed": false,
                "archived": true,
                "priority": 2,
                "createdAt": 1000,
                "updatedAt": 1500,
            })
        );

        let back: Task = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_id_forms() {
        assert_eq!(serde_json::to_string(&TaskId::from(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&TaskId::from("abc")).unwrap(), "\"abc\"");
        assert_eq!(Value::from(TaskId::from("abc")), json!("abc"));
        assert_eq!(TaskId::from(42i64).to_string(), "42");

        let parsed: TaskId = serde_json::from_str("\"x-1\"").unwrap();
        assert_eq!(parsed, TaskId::Text("x-1".to_string()));
    }

    #[test]
    fn test_task_id_from_integral_float() {
        let parsed: TaskId = serde_json::from_str("3.0").unwrap();
        assert_eq!(parsed, TaskId::Int(3));

        assert!(serde_json::from_str::<TaskId>("3.5").is_err());
    }

    #[test]
    fn test_set_id() {
        let mut task = Task::new(1, "x", false, false, 0.0);
        let updated_at = task.updated_at();

        task.set_id("renamed");
        assert_eq!(task.id(), &TaskId::Text("renamed".to_string()));
        assert_eq!(task.id_value(), json!("renamed"));

        task.set_id(9);
        assert_eq!(task.id(), &TaskId::Int(9));
        assert_eq!(task.updated_at(), updated_at);
    }

    #[test]
    fn test_fractional_priority() {
        let task: Task = serde_json::from_str(
            r#"{"id":1.0,"description":"x","completed":false,"archived":false,"priority":1.5,"createdAt":1000,"updatedAt":1000}"#,
        )
        .unwrap();
        assert_eq!(task.id(), &TaskId::Int(1));
        assert_eq!(task.priority(), 1.5);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["priority"], json!(1.5));
        assert_eq!(value["id"], json!(1));
    }

    #[test]
    fn test_record_impl() {
        let task = Task::new("t-1", "x", false, false, 0.0);
        assert_eq!(task.id_value(), json!("t-1"));
        assert_eq!(Task::collection_key(), "tasks");
    }
}
