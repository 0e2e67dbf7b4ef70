use std::fmt::Write;

use crate::aggregate::{CategoryCounts, ChartPoint, GroupTally, TrendPoint};
use crate::models::{non_empty, SubmissionStatus, StatusTone};
use crate::summary::DashboardSummary;

pub fn build_report(summary: &DashboardSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# School Dashboard Report");
    let _ = writeln!(
        output,
        "Generated for {} (trends over the last {} days)",
        summary.reference_date, summary.trend_days
    );

    let users = &summary.users;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Users");
    if users.total_users == 0 {
        let _ = writeln!(output, "No users recorded.");
    } else {
        let _ = writeln!(output, "Total users: {}", users.total_users);
        write_counts(&mut output, "By role", &users.role_table);
        write_chart(&mut output, "By gender", &users.gender_distribution);
        write_chart(&mut output, "By status", &users.status_distribution);
        write_trend(&mut output, "New users", &users.new_users);
        let _ = writeln!(output, "### Recently joined");
        for user in &users.recent_users {
            let _ = writeln!(
                output,
                "- {} ({}) joined {}",
                non_empty(&user.name).unwrap_or("N/A"),
                user.role.map(|role| role.as_str()).unwrap_or("unknown"),
                non_empty(&user.created_at).unwrap_or("N/A")
            );
        }
    }

    let submissions = &summary.submissions;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance Submissions");
    if submissions.total_submissions == 0 {
        let _ = writeln!(output, "No attendance submissions recorded.");
    } else {
        let _ = writeln!(
            output,
            "Total submissions: {} (approval rate {:.2}%)",
            submissions.total_submissions, submissions.approval_rate
        );
        write_counts(&mut output, "By status", &submissions.status_table);
        write_tallies(&mut output, "By teacher", &submissions.by_teacher);
        write_trend(&mut output, "Submitted per day", &submissions.daily);
        let _ = writeln!(output, "### Recent submissions");
        for submission in &submissions.recent {
            let _ = writeln!(
                output,
                "- {} {} for {} on {}",
                tone_marker(SubmissionStatus::tone(submission.status)),
                non_empty(&submission.teacher_name).unwrap_or("N/A"),
                non_empty(&submission.class_name).unwrap_or("N/A"),
                non_empty(&submission.date).unwrap_or("N/A")
            );
        }
    }

    let attendance = &summary.attendance;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance Log");
    if attendance.total_logs == 0 {
        let _ = writeln!(output, "No attendance entries recorded.");
    } else {
        let _ = writeln!(
            output,
            "Approximate attendance: {:.0}% across {} entries",
            attendance.attendance_percent, attendance.total_logs
        );
        write_counts(&mut output, "By status", &attendance.status_table);
        write_tallies(&mut output, "By subject", &attendance.by_subject);
    }

    let students = &summary.students;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");
    if students.total_students == 0 {
        let _ = writeln!(output, "No students recorded.");
    } else {
        let _ = writeln!(
            output,
            "Total students: {} (average attendance {:.2}%)",
            students.total_students, students.average_attendance
        );
        write_chart(&mut output, "By grade", &students.grade_distribution);
        let _ = writeln!(output, "### Low attendance");
        if students.at_risk.is_empty() {
            let _ = writeln!(output, "No students below the attendance threshold.");
        }
        for student in &students.at_risk {
            let _ = writeln!(
                output,
                "- {} ({}): {:.1}%",
                non_empty(&student.name).unwrap_or("N/A"),
                non_empty(&student.grade).unwrap_or("N/A"),
                student.attendance_rate.unwrap_or(0.0)
            );
        }
    }

    output
}

fn write_counts(output: &mut String, heading: &str, counts: &CategoryCounts) {
    let _ = writeln!(output, "### {heading}");
    for (category, count) in counts.iter() {
        let _ = writeln!(output, "- {category}: {count}");
    }
}

fn write_chart(output: &mut String, heading: &str, points: &[ChartPoint]) {
    let _ = writeln!(output, "### {heading}");
    for point in points {
        let _ = writeln!(output, "- {}: {}", point.name, point.value);
    }
}

fn write_tallies(output: &mut String, heading: &str, tallies: &[GroupTally]) {
    let _ = writeln!(output, "### {heading}");
    for tally in tallies {
        let breakdown: Vec<String> = tally
            .counts
            .iter()
            .map(|(status, count)| format!("{status} {count}"))
            .collect();
        let _ = writeln!(
            output,
            "- {}: {} total ({})",
            tally.group,
            tally.total,
            breakdown.join(", ")
        );
    }
}

fn write_trend(output: &mut String, heading: &str, points: &[TrendPoint]) {
    let _ = writeln!(output, "### {heading}");
    let _ = writeln!(output, "| Day | Count |");
    let _ = writeln!(output, "| --- | ---: |");
    for point in points {
        let _ = writeln!(output, "| {} | {} |", point.label, point.count);
    }
}

fn tone_marker(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Success => "[approved]",
        StatusTone::Warning => "[pending]",
        StatusTone::Error => "[rejected]",
    }
}
