use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{
    average, count_by_field, count_by_field_with, group_and_tally, percentage_of, sort_by,
    time_bucket_trend, top_n, CategoryCounts, ChartPoint, CountOptions, GroupTally, Rounding,
    SortDirection, TrendPoint,
};
use crate::config::SummaryConfig;
use crate::models::{
    AttendanceLogRecord, AttendanceSubmissionRecord, Gender, LogStatus, Role, StudentRecord,
    SubmissionStatus, UserRecord, UserStatus,
};
use crate::snapshot::DashboardSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub total_users: usize,
    pub role_table: CategoryCounts,
    pub role_distribution: Vec<ChartPoint>,
    pub gender_distribution: Vec<ChartPoint>,
    pub status_distribution: Vec<ChartPoint>,
    pub new_users: Vec<TrendPoint>,
    pub recent_users: Vec<UserRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOverview {
    pub total_submissions: usize,
    pub status_table: CategoryCounts,
    pub status_distribution: CategoryCounts,
    pub approval_rate: f64,
    pub by_teacher: Vec<GroupTally>,
    pub daily: Vec<TrendPoint>,
    pub recent: Vec<AttendanceSubmissionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceOverview {
    pub total_logs: usize,
    pub status_table: CategoryCounts,
    pub attendance_percent: f64,
    pub by_subject: Vec<GroupTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOverview {
    pub total_students: usize,
    pub grade_distribution: Vec<ChartPoint>,
    pub average_attendance: f64,
    pub at_risk: Vec<StudentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub reference_date: NaiveDate,
    pub trend_days: usize,
    pub users: AdminOverview,
    pub submissions: SubmissionOverview,
    pub attendance: AttendanceOverview,
    pub students: StudentOverview,
}

pub fn summarize(snapshot: &DashboardSnapshot, config: &SummaryConfig) -> DashboardSummary {
    DashboardSummary {
        reference_date: config.reference_date,
        trend_days: config.trend_days,
        users: admin_overview(&snapshot.users, config),
        submissions: submission_overview(&snapshot.submissions, config),
        attendance: attendance_overview(&snapshot.logs),
        students: student_overview(&snapshot.students, config),
    }
}

pub fn admin_overview(users: &[UserRecord], config: &SummaryConfig) -> AdminOverview {
    let roles = Role::labels();
    let genders = Gender::labels();
    let statuses = UserStatus::labels();

    let role_table = count_by_field_with(users, user_role, &CountOptions::known(&roles));
    let role_distribution =
        count_by_field_with(users, user_role, &CountOptions::known(&roles).omit_zero()).to_chart();
    let gender_distribution = count_by_field_with(
        users,
        |user| user.gender.map(Gender::as_str),
        &CountOptions::known(&genders).omit_zero(),
    )
    .to_chart();
    let status_distribution = count_by_field_with(
        users,
        |user| user.status.map(UserStatus::as_str),
        &CountOptions::known(&statuses).omit_zero(),
    )
    .to_chart();

    let new_users = time_bucket_trend(
        users,
        |user| user.created_at.as_deref(),
        config.trend_days,
        config.reference_date,
    );
    let newest_first = sort_by(users, "createdAt", SortDirection::Descending);

    AdminOverview {
        total_users: users.len(),
        role_table,
        role_distribution,
        gender_distribution,
        status_distribution,
        new_users,
        recent_users: top_n(&newest_first, config.recent_limit),
    }
}

pub fn submission_overview(
    submissions: &[AttendanceSubmissionRecord],
    config: &SummaryConfig,
) -> SubmissionOverview {
    let statuses = SubmissionStatus::labels();

    let status_table =
        count_by_field_with(submissions, submission_status, &CountOptions::known(&statuses));
    let status_distribution = count_by_field_with(
        submissions,
        submission_status,
        &CountOptions::known(&statuses).omit_zero(),
    );
    let approved = status_table.count(SubmissionStatus::Approved.as_str());

    let by_teacher = group_and_tally(
        submissions,
        |submission| submission.teacher_name.as_deref(),
        submission_status,
    );
    let daily = time_bucket_trend(
        submissions,
        |submission| submission.date.as_deref(),
        config.trend_days,
        config.reference_date,
    );
    let newest_first = sort_by(submissions, "submittedAt", SortDirection::Descending);

    SubmissionOverview {
        total_submissions: submissions.len(),
        status_table,
        status_distribution,
        approval_rate: percentage_of(
            approved as f64,
            submissions.len() as f64,
            Rounding::Hundredths,
        ),
        by_teacher,
        daily,
        recent: top_n(&newest_first, config.recent_limit),
    }
}

pub fn attendance_overview(logs: &[AttendanceLogRecord]) -> AttendanceOverview {
    let statuses = LogStatus::labels();

    let status_table = count_by_field_with(logs, log_status, &CountOptions::known(&statuses));
    let attended = status_table.count(LogStatus::Present.as_str())
        + status_table.count(LogStatus::Late.as_str());

    AttendanceOverview {
        total_logs: logs.len(),
        attendance_percent: percentage_of(attended as f64, logs.len() as f64, Rounding::Whole),
        by_subject: group_and_tally(logs, |log| log.subject_name.as_deref(), log_status),
        status_table,
    }
}

pub fn student_overview(students: &[StudentRecord], config: &SummaryConfig) -> StudentOverview {
    let grade_distribution =
        count_by_field(students, |student| student.grade.as_deref()).to_chart();
    let average_attendance = average(
        students.iter().filter_map(|student| student.attendance_rate),
        Rounding::Hundredths,
    );

    let below_threshold: Vec<StudentRecord> = students
        .iter()
        .filter(|student| {
            student
                .attendance_rate
                .is_some_and(|rate| rate < config.at_risk_below)
        })
        .cloned()
        .collect();

    StudentOverview {
        total_students: students.len(),
        grade_distribution,
        average_attendance,
        at_risk: sort_by(&below_threshold, "attendanceRate", SortDirection::Ascending),
    }
}

fn user_role(user: &UserRecord) -> Option<&str> {
    user.role.map(Role::as_str)
}

fn submission_status(submission: &AttendanceSubmissionRecord) -> Option<&str> {
    submission.status.map(SubmissionStatus::as_str)
}

fn log_status(log: &AttendanceLogRecord) -> Option<&str> {
    log.status.map(LogStatus::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> SummaryConfig {
        SummaryConfig::new(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
    }

    fn submission(
        teacher: &str,
        status: &str,
        date: &str,
        submitted_at: &str,
    ) -> AttendanceSubmissionRecord {
        AttendanceSubmissionRecord {
            teacher_name: Some(teacher.to_string()),
            status: status.parse().ok(),
            date: Some(date.to_string()),
            submitted_at: Some(submitted_at.to_string()),
            ..Default::default()
        }
    }

    fn log(status: &str, subject: &str) -> AttendanceLogRecord {
        AttendanceLogRecord {
            status: status.parse().ok(),
            subject_name: Some(subject.to_string()),
            ..Default::default()
        }
    }

    fn student(name: &str, grade: Option<&str>, rate: Option<f64>) -> StudentRecord {
        StudentRecord {
            name: Some(name.to_string()),
            grade: grade.map(str::to_string),
            attendance_rate: rate,
            ..Default::default()
        }
    }

    #[test]
    fn submission_counts_distinguish_chart_and_table_views() {
        let submissions = vec![
            submission("A", "approved", "2026-03-09", "2026-03-09T08:00:00"),
            submission("B", "pending", "2026-03-10", "2026-03-10T08:00:00"),
            submission("B", "pending", "2026-03-10", "2026-03-10T09:00:00"),
        ];
        let overview = submission_overview(&submissions, &config());

        assert_eq!(
            serde_json::to_value(&overview.status_distribution).unwrap(),
            json!({ "approved": 1, "pending": 2 })
        );
        assert_eq!(
            serde_json::to_value(&overview.status_table).unwrap(),
            json!({ "approved": 1, "pending": 2, "rejected": 0 })
        );
        assert_eq!(overview.approval_rate, 33.33);
    }

    #[test]
    fn teacher_tally_and_recent_submissions() {
        let submissions = vec![
            submission("A", "approved", "2026-03-08", "2026-03-08T10:00:00"),
            submission("A", "approved", "2026-03-09", "2026-03-09T10:00:00"),
            submission("B", "pending", "2026-03-10", "2026-03-10T07:30:00"),
            submission("C", "archived", "not a date", ""),
        ];
        let overview = submission_overview(&submissions, &config().with_recent_limit(2));

        assert_eq!(
            serde_json::to_value(&overview.by_teacher).unwrap(),
            json!([
                { "group": "A", "approved": 2, "total": 2 },
                { "group": "B", "pending": 1, "total": 1 },
                { "group": "C", "unknown": 1, "total": 1 }
            ])
        );

        let recent: Vec<&str> = overview
            .recent
            .iter()
            .filter_map(|s| s.submitted_at.as_deref())
            .collect();
        assert_eq!(recent, vec!["2026-03-10T07:30:00", "2026-03-09T10:00:00"]);

        let daily: Vec<usize> = overview.daily.iter().map(|p| p.count).collect();
        assert_eq!(daily, vec![0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(overview.status_table.get("unknown"), Some(1));
    }

    #[test]
    fn admin_overview_breaks_users_down() {
        let users: Vec<UserRecord> = serde_json::from_value(json!([
            {
                "id": "1", "role": "admin", "gender": "female", "status": "active",
                "createdAt": "2026-03-10T09:00:00"
            },
            {
                "id": "2", "role": "teacher", "gender": "male", "status": "active",
                "createdAt": "2026-03-04"
            },
            { "id": "3", "role": "teacher", "status": "inactive", "createdAt": "2026-01-15" },
            { "id": "4", "role": "janitor", "gender": "female" }
        ]))
        .unwrap();
        let overview = admin_overview(&users, &config());

        assert_eq!(overview.total_users, 4);
        assert_eq!(
            serde_json::to_value(&overview.role_table).unwrap(),
            json!({ "admin": 1, "teacher": 2, "student": 0, "parent": 0, "unknown": 1 })
        );
        assert_eq!(
            serde_json::to_value(&overview.role_distribution).unwrap(),
            json!([
                { "name": "admin", "value": 1 },
                { "name": "teacher", "value": 2 },
                { "name": "unknown", "value": 1 }
            ])
        );
        assert_eq!(
            serde_json::to_value(&overview.gender_distribution).unwrap(),
            json!([
                { "name": "male", "value": 1 },
                { "name": "female", "value": 2 },
                { "name": "unknown", "value": 1 }
            ])
        );

        let new_users: Vec<usize> = overview.new_users.iter().map(|p| p.count).collect();
        assert_eq!(new_users, vec![1, 0, 0, 0, 0, 0, 1]);

        let recent: Vec<Option<&str>> =
            overview.recent_users.iter().map(|u| u.id.as_deref()).collect();
        assert_eq!(recent, vec![Some("1"), Some("2"), Some("3"), Some("4")]);
    }

    #[test]
    fn recent_users_skip_past_unparseable_join_dates() {
        let users: Vec<UserRecord> = serde_json::from_value(json!([
            { "id": "real-old", "createdAt": "2026-01-01" },
            { "id": "garbage", "createdAt": "N/A" },
            { "id": "real-new", "createdAt": "2026-03-10T09:00:00" }
        ]))
        .unwrap();
        let overview = admin_overview(&users, &config());

        let recent: Vec<Option<&str>> =
            overview.recent_users.iter().map(|u| u.id.as_deref()).collect();
        assert_eq!(recent, vec![Some("real-new"), Some("real-old"), Some("garbage")]);
    }

    #[test]
    fn attendance_percent_counts_present_and_late() {
        let logs = vec![
            log("Present", "Math"),
            log("Late", "Math"),
            log("Absent", "Science"),
            log("Present", "Science"),
            log("Excused", "Math"),
            log("Present", "Art"),
        ];
        let overview = attendance_overview(&logs);

        assert_eq!(overview.total_logs, 6);
        assert_eq!(overview.attendance_percent, 67.0);
        assert_eq!(
            overview.status_table.categories(),
            vec!["Present", "Absent", "Late", "Excused"]
        );
        assert_eq!(overview.by_subject[0].group, "Math");
        assert_eq!(overview.by_subject[0].total, 3);
        assert_eq!(overview.by_subject[1].counts.get("Late"), None);
    }

    #[test]
    fn student_overview_averages_rates_and_flags_low_attendance() {
        let students = vec![
            student("Ada", Some("Grade 5"), Some(92.0)),
            student("Ben", Some("Grade 6"), Some(70.5)),
            student("Cy", Some("Grade 5"), Some(60.0)),
            student("Dee", None, None),
        ];
        let overview = student_overview(&students, &config());

        assert_eq!(overview.total_students, 4);
        assert_eq!(overview.average_attendance, 74.17);
        let at_risk: Vec<Option<&str>> =
            overview.at_risk.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(at_risk, vec![Some("Cy"), Some("Ben")]);
        assert_eq!(
            serde_json::to_value(&overview.grade_distribution).unwrap(),
            json!([
                { "name": "Grade 5", "value": 2 },
                { "name": "Grade 6", "value": 1 },
                { "name": "unknown", "value": 1 }
            ])
        );
    }

    #[test]
    fn empty_snapshot_produces_zeroed_summary() {
        let summary = summarize(&DashboardSnapshot::default(), &config());

        assert_eq!(summary.users.total_users, 0);
        assert!(summary.users.role_distribution.is_empty());
        assert_eq!(summary.users.role_table.total(), 0);
        assert_eq!(summary.users.new_users.len(), 7);
        assert_eq!(summary.submissions.approval_rate, 0.0);
        assert!(summary.submissions.by_teacher.is_empty());
        assert_eq!(summary.attendance.attendance_percent, 0.0);
        assert_eq!(summary.students.average_attendance, 0.0);
        assert!(summary.students.at_risk.is_empty());
    }
}
