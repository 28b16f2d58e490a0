//! JSON and plain-text report exporters.

use crate::domain::model::{FileReport, UserClassModel};
use crate::domain::traffic_mix::{ClassShare, TrafficMix};
use crate::ports::ReportExporter;

/// Pretty-printed JSON array of per-file reports.
pub struct JsonExporter;

impl ReportExporter for JsonExporter {
    fn render(&self, reports: &[FileReport]) -> std::io::Result<String> {
        let mut json = serde_json::to_string_pretty(reports)?;
        json.push('\n');
        Ok(json)
    }
}

/// Human-readable summary followed by one `path:line:col: severity[code]: message`
/// line per diagnostic.
pub struct TextExporter;

impl TextExporter {
    pub fn to_text(reports: &[FileReport]) -> String {
        let mut lines = Vec::new();
        for report in reports {
            Self::report_lines(&mut lines, report);
        }
        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn report_lines(lines: &mut Vec<String>, report: &FileReport) {
        lines.push(format!("== {}", report.path));

        if let Some(failure) = &report.failure {
            lines.push(format!("{}: failed: {}", report.path, failure));
            return;
        }
        if report.model.is_empty() {
            lines.push("  (no user classes)".to_string());
        }

        let mix = TrafficMix::from_model(&report.model);
        let mut shares = mix.classes.iter();
        for class in &report.model.user_classes {
            let share = if class.is_abstract { None } else { shares.next() };
            Self::class_lines(lines, class, share);
        }

        for diagnostic in &report.diagnostics {
            lines.push(format!("{}:{}", report.path, diagnostic));
        }
    }

    fn class_lines(lines: &mut Vec<String>, class: &UserClassModel, share: Option<&ClassShare>) {
        let share_text = match share {
            Some(share) => format!("share={:.1}%", share.share * 100.0),
            None => "abstract".to_string(),
        };
        let wait_text = match &class.wait_time {
            Some(wait) => wait.to_string(),
            None => "<default>".to_string(),
        };
        lines.push(format!(
            "{} ({}) weight={} {} wait={}",
            class.name, class.base_name, class.weight, share_text, wait_text
        ));
        if let Some(host) = &class.host {
            lines.push(format!("  host: {}", host));
        }

        for (idx, task) in class.tasks.iter().enumerate() {
            let task_share = share
                .and_then(|s| s.tasks.get(idx))
                .map(|t| format!(" share={:.1}%", t.share_in_class * 100.0))
                .unwrap_or_default();
            lines.push(format!(
                "  {} weight={}{} ({})",
                task.name, task.weight, task_share, task.location
            ));

            for call in &task.calls {
                let name = call
                    .name
                    .as_ref()
                    .map(|n| format!(" name={:?}", n))
                    .unwrap_or_default();
                lines.push(format!("    {}{} ({})", call.label(), name, call.location));
            }
        }
    }
}

impl ReportExporter for TextExporter {
    fn render(&self, reports: &[FileReport]) -> std::io::Result<String> {
        Ok(Self::to_text(reports))
    }
}
