use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{AttendanceLogRecord, AttendanceSubmissionRecord, StudentRecord, UserRecord};

/// Errors raised while reading an exported API response from disk.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Snapshot {path} must hold an array or an object with a `data` array")]
    Shape { path: PathBuf },
    #[error("Invalid CSV in snapshot {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Unsupported snapshot format for {path}; expected .json or .csv")]
    UnsupportedFormat { path: PathBuf },
}

/// The collections one dashboard view works from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub users: Vec<UserRecord>,
    pub submissions: Vec<AttendanceSubmissionRecord>,
    pub logs: Vec<AttendanceLogRecord>,
    pub students: Vec<StudentRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotPaths {
    pub users: Option<PathBuf>,
    pub submissions: Option<PathBuf>,
    pub logs: Option<PathBuf>,
    pub students: Option<PathBuf>,
}

impl DashboardSnapshot {
    /// Loads every collection with a path; the rest stay empty.
    pub fn load(paths: &SnapshotPaths) -> Result<Self, SnapshotError> {
        Ok(Self {
            users: load_optional(paths.users.as_deref())?,
            submissions: load_optional(paths.submissions.as_deref())?,
            logs: load_optional(paths.logs.as_deref())?,
            students: load_optional(paths.students.as_deref())?,
        })
    }
}

pub fn load_users(path: &Path) -> Result<Vec<UserRecord>, SnapshotError> {
    load_records(path)
}

pub fn load_submissions(path: &Path) -> Result<Vec<AttendanceSubmissionRecord>, SnapshotError> {
    load_records(path)
}

pub fn load_logs(path: &Path) -> Result<Vec<AttendanceLogRecord>, SnapshotError> {
    load_records(path)
}

pub fn load_students(path: &Path) -> Result<Vec<StudentRecord>, SnapshotError> {
    load_records(path)
}

/// Reads a `.json` or `.csv` export into records, dispatching on the extension.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SnapshotError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let records = match extension.as_deref() {
        Some("json") => load_json(path)?,
        Some("csv") => load_csv(path)?,
        _ => {
            return Err(SnapshotError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    tracing::info!(path = %path.display(), records = records.len(), "loaded snapshot");
    Ok(records)
}

fn load_optional<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>, SnapshotError> {
    match path {
        Some(path) => load_records(path),
        None => Ok(Vec::new()),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let json_error = |source: serde_json::Error| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    };

    let items = match serde_json::from_str::<Value>(&raw).map_err(json_error)? {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SnapshotError::Shape {
                    path: path.to_path_buf(),
                })
            }
        },
        _ => {
            return Err(SnapshotError::Shape {
                path: path.to_path_buf(),
            })
        }
    };

    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(json_error)
}

fn load_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SnapshotError> {
    let csv_error = |source: csv::Error| SnapshotError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut records = Vec::new();

    for result in reader.deserialize::<T>() {
        records.push(result.map_err(csv_error)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogStatus, Role, SubmissionStatus};
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_bare_json_arrays() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "users.json",
            r#"[
                {"id": "u1", "name": "Ada", "role": "admin", "createdAt": "2026-01-02"},
                {"id": "u2", "name": "Ben", "role": "Teacher", "gender": "male"}
            ]"#,
        );

        let users = load_users(&path).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].role, Some(Role::Admin));
        assert_eq!(users[1].role, Some(Role::Teacher));
    }

    #[test]
    fn loads_data_envelopes() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "submissions.JSON",
            r#"{"success": true, "data": [
                {"submissionId": "s1", "teacherName": "A", "status": "approved"},
                {"submissionId": "s2", "teacherName": "B", "status": "archived"}
            ]}"#,
        );

        let submissions = load_submissions(&path).unwrap();
        assert_eq!(submissions[0].status, Some(SubmissionStatus::Approved));
        assert_eq!(submissions[1].status, None);
    }

    #[test]
    fn loads_csv_exports_with_camel_case_headers() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "logs.csv",
            "date,status,time,note,subjectName,teacherName\n\
             2026-02-02,Present,08:00,,Math,Ms. Rivera\n\
             2026-02-03,late,08:20,bus delay,Math,Ms. Rivera\n\
             2026-02-04,Unknown,,,,\n",
        );

        let logs = load_logs(&path).unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].status, Some(LogStatus::Present));
        assert_eq!(logs[0].note, None);
        assert_eq!(logs[1].status, Some(LogStatus::Late));
        assert_eq!(logs[1].note.as_deref(), Some("bus delay"));
        assert_eq!(logs[2].status, None);
        assert_eq!(logs[2].subject_name, None);
    }

    #[test]
    fn csv_attendance_rates_tolerate_bad_numbers() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "students.csv",
            "id,name,grade,attendanceRate\n1,Ada,Grade 5,92.5\n2,Ben,Grade 5,absent\n3,Cy,,\n",
        );

        let students = load_students(&path).unwrap();
        let rates: Vec<Option<f64>> = students.iter().map(|s| s.attendance_rate).collect();
        assert_eq!(rates, vec![Some(92.5), None, None]);
        assert_eq!(students[0].id.as_deref(), Some("1"));
        assert_eq!(students[2].grade, None);
    }

    #[test]
    fn rejects_unsupported_shapes_and_formats() {
        let dir = tempdir().unwrap();
        let object = write(dir.path(), "users.json", r#"{"users": []}"#);
        assert!(matches!(load_users(&object), Err(SnapshotError::Shape { .. })));

        let broken = write(dir.path(), "broken.json", "[{");
        assert!(matches!(load_users(&broken), Err(SnapshotError::Json { .. })));

        let text = write(dir.path(), "users.txt", "[]");
        assert!(matches!(
            load_users(&text),
            Err(SnapshotError::UnsupportedFormat { .. })
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_users(&missing), Err(SnapshotError::Read { .. })));
    }

    #[test]
    fn dashboard_snapshot_leaves_unset_collections_empty() {
        let dir = tempdir().unwrap();
        let users = write(dir.path(), "users.json", r#"[{"id": "u1"}]"#);

        let snapshot = DashboardSnapshot::load(&SnapshotPaths {
            users: Some(users),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(snapshot.users.len(), 1);
        assert!(snapshot.submissions.is_empty());
        assert!(snapshot.logs.is_empty());
        assert!(snapshot.students.is_empty());
    }
}
