//! Traffic DOT Exporter
//!
//! Renders the traffic mix of each report as a Graphviz graph:
//! user class -> task -> endpoint, labelled with weights and shares.

use crate::domain::model::FileReport;
use crate::domain::traffic_mix::TrafficMix;
use crate::ports::ReportExporter;
use std::collections::BTreeSet;

pub struct TrafficDotExporter;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeKind {
    Class,
    Task,
    Endpoint,
}

impl TrafficDotExporter {
    pub fn to_dot(reports: &[FileReport]) -> String {
        let mut lines = Vec::new();

        lines.push("digraph TrafficMix {".to_string());
        lines.push("    rankdir=LR;".to_string());
        lines.push("    nodesep=0.6;".to_string());
        lines.push("    ranksep=1.2;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());

        for (idx, report) in reports.iter().enumerate() {
            let mix = TrafficMix::from_model(&report.model);
            if mix.is_empty() {
                continue;
            }

            lines.push("".to_string());
            lines.push(format!("    subgraph cluster_{} {{", idx));
            lines.push(format!("        label=\"{}\";", Self::escape_label(&report.path)));

            let mut endpoints = BTreeSet::new();
            for class in &mix.classes {
                let class_id = format!("{}::{}", idx, class.name);
                lines.push(Self::node_line(
                    &class_id,
                    &format!("{}\n{}", class.name, percent(class.share)),
                    NodeKind::Class,
                ));

                for task in &class.tasks {
                    let task_id = format!("{}.{}", class_id, task.name);
                    lines.push(Self::node_line(
                        &task_id,
                        &format!("{}\n{} overall", task.name, percent(task.overall_share)),
                        NodeKind::Task,
                    ));
                    lines.push(format!(
                        "        \"{}\" -> \"{}\" [label=\"w={} ({})\"];",
                        Self::escape_label(&class_id),
                        Self::escape_label(&task_id),
                        task.weight,
                        percent(task.share_in_class)
                    ));

                    for endpoint in &task.endpoints {
                        let endpoint_id = format!("{}::{}", idx, endpoint);
                        if endpoints.insert(endpoint_id.clone()) {
                            lines.push(Self::node_line(&endpoint_id, endpoint, NodeKind::Endpoint));
                        }
                        lines.push(format!(
                            "        \"{}\" -> \"{}\";",
                            Self::escape_label(&task_id),
                            Self::escape_label(&endpoint_id)
                        ));
                    }
                }
            }

            lines.push("    }".to_string());
        }

        lines.push("}".to_string());
        lines.join("\n")
    }

    fn node_line(id: &str, label: &str, kind: NodeKind) -> String {
        let (shape, color, style) = Self::node_style(kind);
        format!(
            "        \"{}\" [label=\"{}\", shape={}, style=\"{}\", fillcolor=\"{}\"];",
            Self::escape_label(id),
            Self::escape_label(label),
            shape,
            style,
            color
        )
    }

    fn node_style(kind: NodeKind) -> (&'static str, &'static str, &'static str) {
        match kind {
            NodeKind::Class => ("box", "#a6e3a1", "filled,rounded"),
            NodeKind::Task => ("box", "#89b4fa", "filled"),
            NodeKind::Endpoint => ("ellipse", "#f9e2af", "filled"),
        }
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl ReportExporter for TrafficDotExporter {
    fn render(&self, reports: &[FileReport]) -> std::io::Result<String> {
        Ok(Self::to_dot(reports))
    }
}

fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}
