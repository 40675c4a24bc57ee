use stepladder_db::StatusReport;

const VERSION_W: usize = 24;
const DESCRIPTION_W: usize = 25;
const STATE_W: usize = 12;
const DESCRIPTION_MAX: usize = 24;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the status report as a box-drawn table, one line per entry.
pub fn render_status(report: &StatusReport) -> Vec<String> {
    // 2 spaces before each column, " │" between, "║" at both ends
    let inner = (2 + VERSION_W) + 2 + (2 + DESCRIPTION_W) + 2 + (2 + STATE_W + 1);
    let rule = |l: &str, r: &str| format!("{l}{}{r}", "═".repeat(inner));
    let row = |v: &str, d: &str, s: &str| {
        format!("║  {v:<VERSION_W$} │  {d:<DESCRIPTION_W$} │  {s:<STATE_W$} ║")
    };

    let mut lines = vec![
        rule("╔", "╗"),
        row("Version", "Description", "Status"),
        rule("╠", "╣"),
    ];

    for (i, step) in report.steps.iter().enumerate() {
        lines.push(row(
            &step.version,
            &truncate(&step.description, DESCRIPTION_MAX),
            &step.state.to_string(),
        ));
        if let Some(at) = step.executed_at {
            lines.push(row("", &at.format(TIMESTAMP_FORMAT).to_string(), ""));
        }
        if i + 1 < report.steps.len() {
            lines.push(rule("╟", "╢"));
        }
    }

    lines.push(rule("╚", "╝"));
    lines.push(format!(
        "{} executed, {} pending",
        report.executed_count(),
        report.pending_count()
    ));
    lines
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
