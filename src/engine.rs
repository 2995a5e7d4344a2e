use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// 1-decimal rounding used for display rates (submission rate).
pub fn round_to_1dp(x: f64) -> f64 {
    (10.0 * x).round() / 10.0
}

/// 2-decimal rounding used for scores, matching the platform API.
pub fn round_to_2dp(x: f64) -> f64 {
    (100.0 * x).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl EngineError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeLabel {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

/// Grading-calculation rule: six buckets down to F below 50.
///
/// `None` (absent or non-numeric upstream) stays `None`; out-of-range
/// values are classified by the same thresholds, clamping is a caller
/// concern.
pub fn final_grade(score: Option<f64>) -> Option<GradeLabel> {
    let v = score?;
    if !v.is_finite() {
        return None;
    }
    Some(if v >= 90.0 {
        GradeLabel::APlus
    } else if v >= 80.0 {
        GradeLabel::A
    } else if v >= 70.0 {
        GradeLabel::B
    } else if v >= 60.0 {
        GradeLabel::C
    } else if v >= 50.0 {
        GradeLabel::D
    } else {
        GradeLabel::F
    })
}

/// Live-preview rule used by the evaluation form: five buckets, no F.
pub fn preview_grade(score: Option<f64>) -> Option<GradeLabel> {
    let v = score?;
    if !v.is_finite() {
        return None;
    }
    Some(if v >= 90.0 {
        GradeLabel::APlus
    } else if v >= 80.0 {
        GradeLabel::A
    } else if v >= 70.0 {
        GradeLabel::B
    } else if v >= 60.0 {
        GradeLabel::C
    } else {
        GradeLabel::D
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Individual,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Graded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

// Domain records arrive as pass-through rows from the platform API and keep
// its snake_case field names. Every field is defaulted so one malformed row
// cannot abort a whole aggregation.

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceRecord {
    #[serde(default)]
    pub student_id: i64,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub system_score: Option<f64>,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Task {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub max_marks: Option<i64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Submission {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub task_id: i64,
    #[serde(default)]
    pub student_id: i64,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(default)]
    pub is_late: bool,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub task_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TodoItem {
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Anything with a `created_at` timestamp; used by the trend builder so it
/// can bucket tasks, submissions, or performance rows alike.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatedItem {
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Calendar day of an API timestamp. The platform emits ISO-8601 strings,
/// so the day is the leading `YYYY-MM-DD` portion.
fn day_of(ts: &str) -> Option<NaiveDate> {
    let head = ts.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Lenient ISO-8601 parse for full timestamps, with or without an offset.
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GradeBucket {
    pub grade: GradeLabel,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_tasks: usize,
    pub total_submissions: usize,
    pub pending_reviews: usize,
    pub average_score: f64,
    pub submission_rate: f64,
    pub grade_distribution: Vec<GradeBucket>,
}

/// Dense tally over `score`, A+ first. The counted buckets are A through F
/// with A covering `[80, 90)`; a score classifying as A+ falls outside all
/// of them, so the A+ row stays at zero rather than inflating A. Records
/// with no score are skipped; empty buckets still appear with a zero count.
pub fn grade_distribution(performances: &[PerformanceRecord]) -> Vec<GradeBucket> {
    const ORDER: [GradeLabel; 6] = [
        GradeLabel::APlus,
        GradeLabel::A,
        GradeLabel::B,
        GradeLabel::C,
        GradeLabel::D,
        GradeLabel::F,
    ];
    let mut counts: HashMap<GradeLabel, usize> = HashMap::new();
    for p in performances {
        match final_grade(p.score) {
            Some(GradeLabel::APlus) | None => {}
            Some(label) => *counts.entry(label).or_insert(0) += 1,
        }
    }
    ORDER
        .iter()
        .map(|&grade| GradeBucket {
            grade,
            count: counts.get(&grade).copied().unwrap_or(0),
        })
        .collect()
}

pub fn compute_kpis(
    tasks: &[Task],
    submissions: &[Submission],
    performances: &[PerformanceRecord],
) -> KpiSummary {
    let pending_reviews = submissions
        .iter()
        .filter(|s| s.status == SubmissionStatus::Submitted)
        .count();

    // Missing scores count as zero in the numerator but keep their record in
    // the denominator, matching the dashboard's `(g.score || 0)` fold.
    let average_score = if performances.is_empty() {
        0.0
    } else {
        let sum: f64 = performances.iter().map(|p| p.score.unwrap_or(0.0)).sum();
        round_to_2dp(sum / performances.len() as f64)
    };

    let submission_rate = if tasks.is_empty() {
        0.0
    } else {
        round_to_1dp(submissions.len() as f64 / tasks.len() as f64 * 100.0)
    };

    KpiSummary {
        total_tasks: tasks.len(),
        total_submissions: submissions.len(),
        pending_reviews,
        average_score,
        submission_rate,
        grade_distribution: grade_distribution(performances),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardOptions {
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentSummary {
    pub student_id: i64,
    pub student_name: String,
    pub final_score: f64,
    pub grade: Option<String>,
    pub semester: Option<String>,
}

/// Rank by `final_score` descending. Records without a final score are
/// excluded, as the leaderboard endpoint filters them out server-side.
/// Ties break by `student_name` ascending so repeated calls are stable.
pub fn rank_leaderboard(
    records: &[PerformanceRecord],
    opts: &LeaderboardOptions,
) -> Result<Vec<StudentSummary>, EngineError> {
    let min = opts.min_score.unwrap_or(0.0);
    let max = opts.max_score.unwrap_or(100.0);
    if min > max {
        return Err(EngineError::new("bad_params", "minScore must be <= maxScore"));
    }

    let mut rows: Vec<StudentSummary> = records
        .iter()
        .filter_map(|r| {
            let final_score = r.final_score?;
            if !final_score.is_finite() || final_score < min || final_score > max {
                return None;
            }
            Some(StudentSummary {
                student_id: r.student_id,
                student_name: r.student_name.clone().unwrap_or_default(),
                final_score,
                grade: r.grade.clone(),
                semester: r.semester.clone(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });

    if let Some(limit) = opts.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub date: String,
    pub label: String,
    pub count: usize,
}

/// Dense daily buckets for the last `window_days` calendar days ending at
/// `today`, oldest first. Days without events still appear with a zero
/// count; a sparse series would flatten the dashboard chart whenever recent
/// days are quiet.
pub fn build_daily_trend(
    items: &[DatedItem],
    window_days: i64,
    today: NaiveDate,
) -> Result<Vec<TrendPoint>, EngineError> {
    if window_days <= 0 {
        return Err(EngineError::new(
            "bad_params",
            "windowDays must be a positive integer",
        ));
    }

    let mut by_day: HashMap<NaiveDate, usize> = HashMap::new();
    for item in items {
        if let Some(day) = item.created_at.as_deref().and_then(day_of) {
            *by_day.entry(day).or_insert(0) += 1;
        }
    }

    let start = today - Duration::days(window_days - 1);
    let mut points = Vec::with_capacity(window_days as usize);
    for offset in 0..window_days {
        let day = start + Duration::days(offset);
        points.push(TrendPoint {
            date: day.format("%Y-%m-%d").to_string(),
            label: day.format("%a").to_string(),
            count: by_day.get(&day).copied().unwrap_or(0),
        });
    }
    Ok(points)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusDistribution {
    pub submitted: usize,
    pub pending: usize,
    pub missing: usize,
}

pub fn status_distribution(tasks: &[Task], submissions: &[Submission]) -> StatusDistribution {
    let submitted = submissions
        .iter()
        .filter(|s| {
            matches!(
                s.status,
                SubmissionStatus::Submitted | SubmissionStatus::Graded
            )
        })
        .count();
    let pending = submissions
        .iter()
        .filter(|s| s.status == SubmissionStatus::Submitted)
        .count();
    StatusDistribution {
        submitted,
        pending,
        missing: tasks.len().saturating_sub(submissions.len()),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub action: String,
    pub entity: String,
    pub time: Option<String>,
}

/// Merged task/submission feed, newest first, truncated to `limit`.
/// Entries without a timestamp sort last. ISO timestamps order correctly
/// under plain string comparison.
pub fn recent_activity(
    tasks: &[Task],
    submissions: &[Submission],
    limit: usize,
) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = Vec::with_capacity(tasks.len() + submissions.len());
    for t in tasks {
        entries.push(ActivityEntry {
            id: format!("task-{}", t.id),
            action: "Task Created".to_string(),
            entity: t.title.clone(),
            time: t.created_at.clone(),
        });
    }
    for s in submissions {
        let entity = match (s.student_name.as_deref(), s.task_title.as_deref()) {
            (Some(name), Some(title)) => format!("{} - {}", name, title),
            (Some(name), None) => name.to_string(),
            _ => format!("submission #{}", s.id),
        };
        entries.push(ActivityEntry {
            id: format!("sub-{}", s.id),
            action: "Submission Received".to_string(),
            entity,
            time: s.submitted_at.clone(),
        });
    }
    entries.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.id.cmp(&b.id)));
    entries.truncate(limit);
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub severity: InsightSeverity,
    pub message: String,
}

pub fn insights(kpis: &KpiSummary, performance_count: usize) -> Vec<Insight> {
    let mut alerts = Vec::new();
    if kpis.pending_reviews > 5 {
        alerts.push(Insight {
            severity: InsightSeverity::Critical,
            message: "More than 5 submissions are waiting for review.".to_string(),
        });
    }
    if kpis.average_score < 40.0 && performance_count > 0 {
        alerts.push(Insight {
            severity: InsightSeverity::Warning,
            message: "Class performance is below average.".to_string(),
        });
    }
    alerts
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlendedScore {
    pub adjusted_score: f64,
    pub final_score: f64,
    pub grade: GradeLabel,
}

/// Forward computation performed when faculty records an evaluation: the
/// faculty score is scaled by the student's group-contribution percentage
/// when one exists, then blended 70/30 with the system score.
pub fn blend_final_score(
    system_score: f64,
    score: f64,
    contribution_weight: Option<f64>,
) -> BlendedScore {
    let mut adjusted = score;
    if let Some(weight) = contribution_weight {
        adjusted *= weight / 100.0;
    }
    // Blend from the unrounded adjusted value; only the reported fields are
    // rounded, so display rounding cannot shift the final score.
    let final_score = round_to_2dp(system_score * 0.7 + adjusted * 0.3);
    BlendedScore {
        adjusted_score: round_to_2dp(adjusted),
        final_score,
        grade: final_grade(Some(final_score)).unwrap_or(GradeLabel::F),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemPerformance {
    pub total_todos: usize,
    pub completed_todos: usize,
    pub overdue_todos: usize,
    pub completion_rate: f64,
    pub on_time_rate: f64,
    pub system_score: f64,
}

impl SystemPerformance {
    fn empty() -> Self {
        Self {
            total_todos: 0,
            completed_todos: 0,
            overdue_todos: 0,
            completion_rate: 0.0,
            on_time_rate: 0.0,
            system_score: 0.0,
        }
    }
}

/// Automated score over a student's planner todos:
/// `0.6 * completion rate + 0.4 * on-time rate - 2 per overdue`, floored
/// at zero. A completed todo is on time while its due date has not passed.
pub fn system_performance(todos: &[TodoItem], now: NaiveDateTime) -> SystemPerformance {
    if todos.is_empty() {
        return SystemPerformance::empty();
    }

    let mut completed = 0usize;
    let mut overdue = 0usize;
    let mut on_time = 0usize;
    for todo in todos {
        let due = todo.due_date.as_deref().and_then(parse_timestamp);
        match todo.status {
            TodoStatus::Completed => {
                completed += 1;
                if due.map(|d| d >= now).unwrap_or(false) {
                    on_time += 1;
                }
            }
            _ => {
                if due.map(|d| d < now).unwrap_or(false) {
                    overdue += 1;
                }
            }
        }
    }

    let total = todos.len();
    let completion_rate = completed as f64 / total as f64 * 100.0;
    let on_time_rate = if completed > 0 {
        on_time as f64 / completed as f64 * 100.0
    } else {
        0.0
    };
    let system_score = (completion_rate * 0.6 + on_time_rate * 0.4 - 2.0 * overdue as f64).max(0.0);

    SystemPerformance {
        total_todos: total,
        completed_todos: completed,
        overdue_todos: overdue,
        completion_rate: round_to_2dp(completion_rate),
        on_time_rate: round_to_2dp(on_time_rate),
        system_score: round_to_2dp(system_score),
    }
}
