use crate::model::{DateRange, Filter, Task, TaskState};
use time::{Date, Duration};

pub const UNSET_DATE_LABEL: &str = "未设置日期";
pub const QUICK_FILTER_PLACEHOLDER: &str = "快速筛选";
pub const DEFAULT_QUICK_FILTERS: [u32; 3] = [3, 7, 30];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    /// Day string, or empty for tasks without a date.
    pub date: String,
    pub tasks: Vec<Task>,
}

impl DateGroup {
    pub fn label(&self) -> String {
        format_date(&self.date)
    }
}

pub fn resolve_range(filter: &Filter, today: Date) -> Option<DateRange> {
    match *filter {
        Filter::None => None,
        Filter::Date(day) => Some(DateRange::single(day)),
        Filter::LastDays(0) => None,
        Filter::LastDays(days) => {
            let start = today.checked_sub(Duration::days(i64::from(days) - 1))?;
            Some(DateRange::new(start, today))
        }
    }
}

/// Tasks in `state` within `range`, most recent day first and newest-created
/// first within a day.
pub fn select_tasks(tasks: &[Task], state: TaskState, range: Option<&DateRange>) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|task| task.state == state)
        .filter(|task| range.is_none_or(|range| range.contains_key(&task.date)))
        .cloned()
        .collect();

    selected.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    selected
}

/// Groups consecutive runs of equal dates, keeping the input order.
pub fn group_by_date(sorted: Vec<Task>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for task in sorted {
        match groups.last_mut() {
            Some(group) if group.date == task.date => group.tasks.push(task),
            _ => groups.push(DateGroup {
                date: task.date.clone(),
                tasks: vec![task],
            }),
        }
    }
    groups
}

/// `2024-06-10` renders as `2024年6月10日`.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return UNSET_DATE_LABEL.to_string();
    }

    let parts: Vec<&str> = value.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return value.to_string();
    };
    format!("{}年{}月{}日", year, strip_leading_zeros(month), strip_leading_zeros(day))
}

fn strip_leading_zeros(part: &str) -> String {
    match part.parse::<u32>() {
        Ok(number) => number.to_string(),
        Err(_) => part.to_string(),
    }
}

pub fn range_text(range: &DateRange) -> String {
    if range.is_single_day() {
        format_date(range.start_key())
    } else {
        format!(
            "{} ~ {}",
            format_date(range.start_key()),
            format_date(range.end_key())
        )
    }
}

pub fn quick_filter_label(filter: &Filter) -> String {
    match filter {
        Filter::LastDays(days) => format!("最近 {days} 天"),
        _ => QUICK_FILTER_PLACEHOLDER.to_string(),
    }
}

/// Caption for the generate action; `None` while no filter is active.
pub fn report_button_label(filter: &Filter) -> Option<String> {
    match filter {
        Filter::None => None,
        Filter::Date(_) => Some("生成当天总结".to_string()),
        Filter::LastDays(3) => Some("生成 3天总结".to_string()),
        Filter::LastDays(7) => Some("生成 7天周报".to_string()),
        Filter::LastDays(30) => Some("生成 30天月报".to_string()),
        Filter::LastDays(days) => Some(format!("生成 {days} 天总结")),
    }
}
