//! Date-range reports: a plain-text body, a prompt wrapping it for an
//! external writing assistant, and an HTML fragment for the report panel.

use crate::filter::{range_text, resolve_range};
use crate::model::{Filter, Task, TaskState};
use serde::Serialize;
use time::Date;

pub const EMPTY_REPORT_TEXT: &str = "请先选择日期或最近 7 天筛选，再生成周报。";
const EMPTY_LIST_ITEM: &str = "- 暂无";
const EMPTY_LIST_HTML: &str = "暂无";

pub const DEFAULT_PROMPT_PREAMBLE: [&str; 5] = [
    "你是一名UVM验证领域的专业写作助手，请将下面的验证周报润色得更专业、简洁、有条理。",
    "要求：",
    "1. 保持原意，不遗漏任务信息。",
    "2. 语气自然、清晰、结构分明。",
    "3. 适合直接发送给团队。",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub text: String,
    pub prompt: String,
    pub html: String,
    /// Absent when no range could be resolved.
    pub summary: Option<ReportSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub title: String,
    pub range_text: String,
    pub done: Vec<String>,
    pub pending: Vec<String>,
    pub total_count: usize,
    /// Whole percent, 0 when there are no tasks.
    pub completion_rate: u32,
    pub range_days: i64,
    /// One decimal place.
    pub avg_done_per_day: String,
    pub insight: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions<'a> {
    /// Replaces the instructional lines that open the prompt.
    pub prompt_preamble: Option<&'a [String]>,
}

pub fn build_report(tasks: &[Task], filter: &Filter, today: Date) -> Report {
    build_report_with(tasks, filter, today, ReportOptions::default())
}

pub fn build_report_with(
    tasks: &[Task],
    filter: &Filter,
    today: Date,
    options: ReportOptions<'_>,
) -> Report {
    let Some(range) = resolve_range(filter, today) else {
        return Report {
            text: EMPTY_REPORT_TEXT.to_string(),
            prompt: EMPTY_REPORT_TEXT.to_string(),
            html: format!(
                "<div class=\"report-empty\">{}</div>",
                escape_html(EMPTY_REPORT_TEXT)
            ),
            summary: None,
        };
    };

    let in_range: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.state != TaskState::Deleted)
        .filter(|task| match filter {
            Filter::Date(_) => task.date == range.start_key(),
            _ => range.contains_key(&task.date),
        })
        .collect();
    let done: Vec<String> = texts_in_state(&in_range, TaskState::Done);
    let pending: Vec<String> = texts_in_state(&in_range, TaskState::Pending);

    let range_days = range.len_days();
    let total_count = done.len() + pending.len();
    let completion_rate = if total_count == 0 {
        0
    } else {
        (done.len() as f64 / total_count as f64 * 100.0).round() as u32
    };
    let avg_done_per_day = if total_count == 0 {
        "0.0".to_string()
    } else {
        format_tenths(done.len() as f64 / range_days as f64)
    };

    let summary = ReportSummary {
        title: report_title(filter).to_string(),
        range_text: range_text(&range),
        insight: insight(done.len(), pending.len()),
        done,
        pending,
        total_count,
        completion_rate,
        range_days,
        avg_done_per_day,
    };

    let text = render_text(&summary);
    let prompt = render_prompt(&summary, &text, options.prompt_preamble);
    let html = render_html(&summary);

    Report {
        text,
        prompt,
        html,
        summary: Some(summary),
    }
}

fn texts_in_state(tasks: &[&Task], state: TaskState) -> Vec<String> {
    tasks
        .iter()
        .filter(|task| task.state == state)
        .map(|task| task.text.clone())
        .collect()
}

pub fn report_title(filter: &Filter) -> &'static str {
    match filter {
        Filter::Date(_) => "当天总结",
        Filter::LastDays(3) => "3天总结",
        Filter::LastDays(7) => "周报",
        Filter::LastDays(30) => "月报",
        _ => "任务总结",
    }
}

fn insight(done: usize, pending: usize) -> String {
    match (done, pending) {
        (0, 0) => "本期暂无任务记录，可以先设定 1-2 个小目标。".to_string(),
        (0, _) => "已记录任务但尚未完成，建议从最重要的一项开始。".to_string(),
        (_, 0) => "本期任务全部完成，节奏非常好，继续保持。".to_string(),
        _ => format!("已完成 {done} 项，剩余 {pending} 项建议优先处理。"),
    }
}

/// One decimal place of the exact stored value. Only quarters sit exactly
/// halfway between two tenths; those round up.
fn format_tenths(value: f64) -> String {
    let exact_tie = (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0;
    if exact_tie {
        let tenths = (value * 10.0).round() as i64;
        format!("{}.{}", tenths / 10, tenths % 10)
    } else {
        format!("{value:.1}")
    }
}

fn render_text(summary: &ReportSummary) -> String {
    let mut lines = Vec::new();
    lines.push(format!("周报（{}）", summary.range_text));
    lines.push(String::new());
    push_section(&mut lines, "完成任务", &summary.done);
    lines.push(String::new());
    push_section(&mut lines, "待完成任务", &summary.pending);
    lines.join("\n")
}

fn push_section(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    lines.push(format!("{heading}（{}）", items.len()));
    if items.is_empty() {
        lines.push(EMPTY_LIST_ITEM.to_string());
    } else {
        for (index, text) in items.iter().enumerate() {
            lines.push(format!(" {}. {}", index + 1, text));
        }
    }
}

fn render_prompt(summary: &ReportSummary, text: &str, preamble: Option<&[String]>) -> String {
    let mut lines: Vec<String> = match preamble {
        Some(custom) => custom.to_vec(),
        None => DEFAULT_PROMPT_PREAMBLE.iter().map(|line| line.to_string()).collect(),
    };
    lines.push(String::new());
    lines.push(format!("范围：{}", summary.range_text));
    lines.push(format!("完成任务：{} 项", summary.done.len()));
    lines.push(format!("待完成任务：{} 项", summary.pending.len()));
    lines.push(String::new());
    lines.push("【原始周报】".to_string());
    lines.push(text.to_string());
    lines.join("\n")
}

fn render_html(summary: &ReportSummary) -> String {
    let done = summary.done.len();
    let pending = summary.pending.len();
    [
        "<div class=\"report-header\">".to_string(),
        format!(
            "<div class=\"report-title-main\">{}</div>",
            escape_html(&summary.title)
        ),
        format!(
            "<div class=\"report-range\">{}</div>",
            escape_html(&summary.range_text)
        ),
        "</div>".to_string(),
        "<div class=\"report-stats\">".to_string(),
        format!("<span>完成 {done}</span>"),
        "<span class=\"report-divider\"></span>".to_string(),
        format!("<span>待完成 {pending}</span>"),
        "<span class=\"report-divider\"></span>".to_string(),
        format!("<span>合计 {}</span>", summary.total_count),
        "</div>".to_string(),
        "<div class=\"report-summary\">".to_string(),
        summary_item("完成率", &format!("{}%", summary.completion_rate)),
        summary_item("周期", &format!("{} 天", summary.range_days)),
        summary_item("日均完成", &summary.avg_done_per_day),
        "</div>".to_string(),
        format!(
            "<div class=\"report-progress\"><div class=\"report-progress-fill\" style=\"width:{}%\"></div></div>",
            summary.completion_rate
        ),
        format!(
            "<div class=\"report-insight\">{}</div>",
            escape_html(&summary.insight)
        ),
        html_section("完成任务", &summary.done),
        html_section("待完成任务", &summary.pending),
    ]
    .concat()
}

fn summary_item(label: &str, value: &str) -> String {
    format!(
        "<div class=\"summary-item\"><span class=\"summary-label\">{label}</span><span class=\"summary-value\">{value}</span></div>"
    )
}

fn html_section(title: &str, items: &[String]) -> String {
    let list = if items.is_empty() {
        format!("<div class=\"report-empty\">{EMPTY_LIST_HTML}</div>")
    } else {
        let entries: String = items
            .iter()
            .map(|text| format!("<li>{}</li>", escape_html(text)))
            .collect();
        format!("<ul class=\"report-list\">{entries}</ul>")
    };
    format!(
        "<div class=\"report-section\"><div class=\"report-section-title\">{title}</div>{list}</div>"
    )
}

/// Escapes `& < > " '`.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{
        EMPTY_REPORT_TEXT, ReportOptions, build_report, build_report_with, escape_html,
        format_tenths,
    };
    use crate::model::{Filter, Task, TaskState};
    use time::macros::date;

    fn task(text: &str, state: TaskState, date: &str) -> Task {
        Task {
            id: text.to_string(),
            text: text.to_string(),
            state,
            date: date.to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn no_filter_yields_placeholder() {
        let report = build_report(&[], &Filter::None, date!(2024 - 06 - 10));

        assert_eq!(report.text, EMPTY_REPORT_TEXT);
        assert_eq!(report.prompt, EMPTY_REPORT_TEXT);
        assert!(report.html.starts_with("<div class=\"report-empty\">"));
        assert!(report.summary.is_none());
    }

    #[test]
    fn empty_range_has_zero_rates() {
        let report = build_report(&[], &Filter::LastDays(7), date!(2024 - 06 - 10));
        let summary = report.summary.unwrap();

        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.completion_rate, 0);
        assert_eq!(summary.avg_done_per_day, "0.0");
        assert_eq!(summary.range_days, 7);
        assert_eq!(summary.insight, "本期暂无任务记录，可以先设定 1-2 个小目标。");
        assert!(report.html.contains("width:0%"));
    }

    #[test]
    fn weekly_report_lists_done_and_pending() {
        let tasks = vec![
            task("Write spec", TaskState::Done, "2024-06-10"),
            task("Review PR", TaskState::Pending, "2024-06-08"),
            task("Ship build", TaskState::Done, "2024-06-05"),
            task("Stale", TaskState::Done, "2024-06-01"),
            task("Dropped", TaskState::Deleted, "2024-06-09"),
        ];
        let report = build_report(&tasks, &Filter::LastDays(7), date!(2024 - 06 - 10));

        let expected = [
            "周报（2024年6月4日 ~ 2024年6月10日）",
            "",
            "完成任务（2）",
            " 1. Write spec",
            " 2. Ship build",
            "",
            "待完成任务（1）",
            " 1. Review PR",
        ]
        .join("\n");
        assert_eq!(report.text, expected);

        let summary = report.summary.unwrap();
        assert_eq!(summary.title, "周报");
        assert_eq!(summary.completion_rate, 67);
        assert_eq!(summary.avg_done_per_day, "0.3");
        assert_eq!(summary.insight, "已完成 2 项，剩余 1 项建议优先处理。");
    }

    #[test]
    fn empty_sections_render_placeholder_line() {
        let tasks = vec![task("only", TaskState::Pending, "2024-06-10")];
        let report = build_report(&tasks, &Filter::Date(date!(2024 - 06 - 10)), date!(2024 - 06 - 10));

        assert!(report.text.starts_with("周报（2024年6月10日）"));
        assert!(report.text.contains("完成任务（0）\n- 暂无"));
        let summary = report.summary.unwrap();
        assert_eq!(summary.title, "当天总结");
        assert_eq!(summary.insight, "已记录任务但尚未完成，建议从最重要的一项开始。");
    }

    #[test]
    fn date_filter_matches_exact_day_only() {
        let tasks = vec![
            task("today", TaskState::Done, "2024-06-10"),
            task("yesterday", TaskState::Done, "2024-06-09"),
        ];
        let report = build_report(&tasks, &Filter::Date(date!(2024 - 06 - 09)), date!(2024 - 06 - 10));
        let summary = report.summary.unwrap();

        assert_eq!(summary.done, ["yesterday"]);
        assert_eq!(summary.range_days, 1);
        assert_eq!(summary.avg_done_per_day, "1.0");
        assert_eq!(summary.insight, "本期任务全部完成，节奏非常好，继续保持。");
    }

    #[test]
    fn titles_follow_presets() {
        let today = date!(2024 - 06 - 10);
        let title = |filter: Filter| build_report(&[], &filter, today).summary.unwrap().title;

        assert_eq!(title(Filter::LastDays(3)), "3天总结");
        assert_eq!(title(Filter::LastDays(30)), "月报");
        assert_eq!(title(Filter::LastDays(14)), "任务总结");
    }

    #[test]
    fn prompt_wraps_text_with_counts() {
        let tasks = vec![task("a", TaskState::Done, "2024-06-10")];
        let report = build_report(&tasks, &Filter::LastDays(7), date!(2024 - 06 - 10));

        assert!(report.prompt.starts_with("你是一名UVM验证领域的专业写作助手"));
        assert!(report.prompt.contains("范围：2024年6月4日 ~ 2024年6月10日"));
        assert!(report.prompt.contains("完成任务：1 项\n待完成任务：0 项"));
        assert!(report.prompt.ends_with(&format!("【原始周报】\n{}", report.text)));
    }

    #[test]
    fn custom_preamble_replaces_default() {
        let preamble = vec!["Polish this.".to_string()];
        let options = ReportOptions {
            prompt_preamble: Some(preamble.as_slice()),
        };
        let report = build_report_with(&[], &Filter::LastDays(7), date!(2024 - 06 - 10), options);

        assert!(report.prompt.starts_with("Polish this.\n\n范围："));
    }

    #[test]
    fn html_escapes_task_text() {
        let tasks = vec![task("<b>&\"'", TaskState::Done, "2024-06-10")];
        let report = build_report(&tasks, &Filter::LastDays(7), date!(2024 - 06 - 10));

        assert!(report.html.contains("<li>&lt;b&gt;&amp;&quot;&#39;</li>"));
        assert!(!report.html.contains("<b>"));
        assert!(report.html.contains("width:100%"));
    }

    #[test]
    fn tenths_round_ties_up() {
        assert_eq!(format_tenths(0.25), "0.3");
        assert_eq!(format_tenths(0.75), "0.8");
        assert_eq!(format_tenths(3.0 / 20.0), "0.1");
        assert_eq!(format_tenths(0.35), "0.3");
        assert_eq!(format_tenths(2.0 / 7.0), "0.3");
        assert_eq!(format_tenths(1.0 / 30.0), "0.0");
        assert_eq!(format_tenths(3.0), "3.0");
    }

    #[test]
    fn average_uses_stored_value_of_fraction() {
        let tasks = vec![
            task("a", TaskState::Done, "2024-06-10"),
            task("b", TaskState::Done, "2024-06-01"),
            task("c", TaskState::Done, "2024-05-25"),
        ];
        let report = build_report(&tasks, &Filter::LastDays(20), date!(2024 - 06 - 10));
        let summary = report.summary.unwrap();

        assert_eq!(summary.range_days, 20);
        assert_eq!(summary.avg_done_per_day, "0.1");
    }

    #[test]
    fn escape_html_covers_five_characters() {
        assert_eq!(escape_html("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
