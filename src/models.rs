use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::dates;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized value `{0}`")]
pub struct UnrecognizedValue(pub String);

macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Labels of every variant in declaration order.
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|value| value.as_str()).collect()
            }
        }

        impl FromStr for $name {
            type Err = UnrecognizedValue;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| UnrecognizedValue(trimmed.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

labeled_enum!(Role {
    Admin => "admin",
    Teacher => "teacher",
    Student => "student",
    Parent => "parent",
});

labeled_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

labeled_enum!(UserStatus {
    Active => "active",
    Inactive => "inactive",
});

labeled_enum!(SubmissionStatus {
    Approved => "approved",
    Pending => "pending",
    Rejected => "rejected",
});

labeled_enum!(LogStatus {
    Present => "Present",
    Absent => "Absent",
    Late => "Late",
    Excused => "Excused",
});

/// Display tone for a submission badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Success,
    Warning,
    Error,
}

impl SubmissionStatus {
    /// Unrecognized statuses render like rejected ones.
    pub fn tone(status: Option<SubmissionStatus>) -> StatusTone {
        match status {
            Some(SubmissionStatus::Approved) => StatusTone::Success,
            Some(SubmissionStatus::Pending) => StatusTone::Warning,
            Some(SubmissionStatus::Rejected) | None => StatusTone::Error,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSubmissionRecord {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text")]
    pub submission_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub teacher_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub status: Option<SubmissionStatus>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceLogRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub status: Option<LogStatus>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subject_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub teacher_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default, alias = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub attendance_rate: Option<f64>,
}

/// A record field resolved by its API key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Timestamp { raw: &'a str, at: NaiveDateTime },
    Text(&'a str),
}

impl FieldValue<'_> {
    /// Strict equality against a filter value as typed by a user.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            FieldValue::Number(value) => expected
                .trim()
                .parse::<f64>()
                .map(|parsed| parsed == *value)
                .unwrap_or(false),
            FieldValue::Timestamp { raw, .. } => *raw == expected,
            FieldValue::Text(value) => *value == expected,
        }
    }
}

/// Key-based field access used by the generic filters and sorts.
///
/// Keys are the camelCase names the API uses. Unknown keys and empty values
/// resolve to `None`.
pub trait Record {
    fn field(&self, key: &str) -> Option<FieldValue<'_>>;
}

impl Record for UserRecord {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "email" => text(&self.email),
            "role" => self.role.map(|role| FieldValue::Text(role.as_str())),
            "gender" => self.gender.map(|gender| FieldValue::Text(gender.as_str())),
            "status" => self.status.map(|status| FieldValue::Text(status.as_str())),
            "createdAt" => timestamp(&self.created_at),
            _ => None,
        }
    }
}

impl Record for AttendanceSubmissionRecord {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "submissionId" => text(&self.submission_id),
            "teacherName" => text(&self.teacher_name),
            "className" => text(&self.class_name),
            "date" => timestamp(&self.date),
            "status" => self.status.map(|status| FieldValue::Text(status.as_str())),
            "submittedAt" => timestamp(&self.submitted_at),
            _ => None,
        }
    }
}

impl Record for AttendanceLogRecord {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "date" => timestamp(&self.date),
            "status" => self.status.map(|status| FieldValue::Text(status.as_str())),
            "time" => text(&self.time),
            "note" => text(&self.note),
            "subjectName" => text(&self.subject_name),
            "teacherName" => text(&self.teacher_name),
            _ => None,
        }
    }
}

impl Record for StudentRecord {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "email" => text(&self.email),
            "gender" => self.gender.map(|gender| FieldValue::Text(gender.as_str())),
            "status" => self.status.map(|status| FieldValue::Text(status.as_str())),
            "createdAt" => timestamp(&self.created_at),
            "grade" => text(&self.grade),
            "attendanceRate" => self.attendance_rate.map(FieldValue::Number),
            _ => None,
        }
    }
}

fn text(value: &Option<String>) -> Option<FieldValue<'_>> {
    non_empty(value).map(FieldValue::Text)
}

/// Unparseable timestamps fall back to their raw text.
fn timestamp(value: &Option<String>) -> Option<FieldValue<'_>> {
    let raw = non_empty(value)?;
    Some(match dates::parse_timestamp(raw) {
        Some(at) => FieldValue::Timestamp { raw, at },
        None => FieldValue::Text(raw),
    })
}

/// Borrows a text field, treating blank strings as absent.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|raw| !raw.trim().is_empty())
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => Some(raw),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(lenient_text(deserializer)?.and_then(|raw| raw.parse().ok()))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|number| number.is_finite()))
}
