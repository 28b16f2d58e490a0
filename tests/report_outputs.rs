/// Report output tests
///
/// Loads a folder of scripts from disk, extracts them in parallel and renders
/// the reports in every supported format.

use locust_lens::application::ExtractUsecase;
use locust_lens::domain::dialect::DialectConfig;
use locust_lens::domain::model::FileReport;
use locust_lens::infrastructure::{JsonExporter, ScriptLoader, TextExporter, TreeSitterPythonParser};
use locust_lens::ports::traffic_exporter::TrafficDotExporter;
use locust_lens::ports::ReportExporter;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const GOOD: &str = r#"
from locust import HttpUser, task, between

class WebsiteUser(HttpUser):
    wait_time = between(1, 5)

    @task(3)
    def index(self):
        self.client.get("/")

    @task
    def about(self):
        self.client.get("/about/")
"#;

const BROKEN: &str = "class Broken(HttpUser:\n    pass\n";

fn extract_folder(dir: &Path) -> Vec<FileReport> {
    let scripts = ScriptLoader::load_folder(dir.to_str().unwrap()).unwrap();
    let dialect = DialectConfig::default();
    let usecase = ExtractUsecase {
        parser: &TreeSitterPythonParser,
        dialect: &dialect,
    };
    usecase.extract_all(&scripts)
}

fn write_scripts(dir: &Path) {
    fs::create_dir_all(dir.join("load")).unwrap();
    fs::write(dir.join("load/locustfile.py"), GOOD).unwrap();
    fs::write(dir.join("broken.py"), BROKEN).unwrap();
}

/// A broken file fails alone; the other file is still extracted.
#[test]
fn test_folder_extraction_isolates_failures() {
    let dir = tempdir().unwrap();
    write_scripts(dir.path());

    let reports = extract_folder(dir.path());
    assert_eq!(reports.len(), 2);

    assert!(reports[0].path.ends_with("broken.py"));
    assert!(reports[0].is_failed());
    assert!(reports[0].model.is_empty());

    assert!(reports[1].path.ends_with("locustfile.py"));
    assert!(!reports[1].is_failed());
    assert_eq!(reports[1].model.user_classes[0].tasks.len(), 2);
}

#[test]
fn test_json_export_to_file() {
    let dir = tempdir().unwrap();
    write_scripts(dir.path());
    let reports = extract_folder(dir.path());

    let out = dir.path().join("report.json");
    JsonExporter.export(&reports, out.to_str().unwrap()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0]["failure"].as_str().unwrap().starts_with("syntax error"));

    let user = &items[1]["model"]["user_classes"][0];
    assert_eq!(user["name"], "WebsiteUser");
    assert_eq!(user["base_name"], "HttpUser");
    assert_eq!(user["wait_time"]["low"], 1.0);
    assert_eq!(user["tasks"][0]["weight"], 3);
    assert_eq!(user["tasks"][1]["calls"][0]["path"]["value"], "/about/");
}

#[test]
fn test_text_and_dot_rendering() {
    let dir = tempdir().unwrap();
    write_scripts(dir.path());
    let reports = extract_folder(dir.path());

    let text = TextExporter.render(&reports).unwrap();
    assert!(text.contains("broken.py: failed: syntax error"));
    assert!(text.contains("WebsiteUser (HttpUser) weight=1 share=100.0% wait=between(1, 5)"));
    assert!(text.contains("  index weight=3 share=75.0% (8:5)"));
    assert!(text.contains("    GET /about/ (13:9)"));

    let dot = TrafficDotExporter.render(&reports).unwrap();
    assert!(dot.contains("subgraph cluster_1"));
    assert!(!dot.contains("cluster_0"));
    assert!(dot.contains("\"1::WebsiteUser.about\" -> \"1::GET /about/\""));
}
