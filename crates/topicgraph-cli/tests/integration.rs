//! Integration tests for the topicgraph CLI
//!
//! Each test runs the binary against a fresh workspace with HOME pointed at
//! a temporary directory so no global config leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// A temporary workspace and home directory
struct Workspace {
    home: TempDir,
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create home dir"),
            root: TempDir::new().expect("Failed to create workspace"),
        }
    }

    /// A command running inside the workspace
    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("topicgraph").expect("Failed to find topicgraph binary");
        cmd.current_dir(self.root.path())
            .env("HOME", self.home.path())
            .env_remove("TOPICGRAPH_WORKSPACE")
            .env_remove("TOPICGRAPH_CONFIG")
            .env_remove("TOPICGRAPH_DB")
            .env_remove("TOPICGRAPH_WORKERS")
            .env_remove("TOPICGRAPH_CATCH_ALL")
            .env_remove("TOPICGRAPH_TIMEOUT_SECS")
            .env_remove("TOPICGRAPH_LOG_LEVEL")
            .arg("--quiet");
        cmd
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    /// Initialize the store and load a small wildlife graph
    fn with_wildlife_graph(self) -> Self {
        self.cmd().arg("init").assert().success();
        for (source, targets) in [
            ("Elephant", vec!["Africa", "African_Elephant"]),
            ("Africa", vec!["Elephant"]),
            ("Zoo", vec!["Elephant"]),
            ("African_Elephant", vec!["Elephant"]),
            ("Elephant#Habitat", vec!["Elephant"]),
            ("(Band)", vec!["Elephant"]),
        ] {
            self.cmd()
                .args(["add-links", "--create-missing", source])
                .args(targets)
                .assert()
                .success();
        }
        self
    }
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("Failed to run topicgraph");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_creates_store() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized topic graph"));
    assert!(ws.path().join(".topicgraph/graph.db").exists());
}

#[test]
fn test_init_with_config_writes_local_config() {
    let ws = Workspace::new();
    ws.cmd().args(["init", "--with-config"]).assert().success();
    assert!(ws.path().join(".topicgraph/config.toml").exists());
}

#[test]
fn test_commands_require_init() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("topicgraph init"));
}

#[test]
fn test_db_override() {
    let ws = Workspace::new();
    let db = ws.path().join("elsewhere.db");
    ws.cmd()
        .args(["--db", db.to_str().unwrap(), "init"])
        .assert()
        .success();
    assert!(db.exists());
    assert!(!ws.path().join(".topicgraph/graph.db").exists());
}

#[test]
fn test_reopen_with_other_catch_all_fails() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    ws.cmd()
        .args(["--catch-all", "zero", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("partition scheme mismatch"));
}

// ============================================================================
// Topics and Links
// ============================================================================

#[test]
fn test_add_topics_is_idempotent() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    ws.cmd()
        .args(["add-topics", "Elephant", "Africa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 2 topics"));

    let report = stdout_json(ws.cmd().args(["add-topics", "elephant", "--json"]));
    assert_eq!(report["inserted"], 0);
    assert_eq!(report["existing"], 1);
}

#[test]
fn test_add_topics_from_file() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    let file = ws.path().join("topics.txt");
    std::fs::write(&file, "Elephant\nAfrica\n\nZoo\n").unwrap();

    ws.cmd()
        .args(["add-topics", "--file", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 3 topics"));
}

#[test]
fn test_add_links_rejects_unknown_targets() {
    let ws = Workspace::new();
    ws.cmd().arg("init").assert().success();
    ws.cmd()
        .args(["add-topics", "Elephant", "Africa"])
        .assert()
        .success();

    let report = stdout_json(ws.cmd().args(["add-links", "Elephant", "Africa", "Mastodon", "--json"]));
    assert_eq!(report["inserted"], 1);
    assert_eq!(report["rejected"], 1);
}

#[test]
fn test_topic_shows_partition() {
    let ws = Workspace::new().with_wildlife_graph();
    let topic = stdout_json(ws.cmd().args(["topic", "elephant", "--json"]));
    assert_eq!(topic["name"], "Elephant");
    assert_eq!(topic["partition"], "e");
    assert_eq!(topic["out_edges"], 2);
    assert!(topic["indegree"].is_null());
}

#[test]
fn test_unknown_topic_fails() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd()
        .args(["topic", "Mastodon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mastodon"));
}

// ============================================================================
// Neighbor Queries
// ============================================================================

#[test]
fn test_out_neighbors() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd()
        .args(["neighbors", "Elephant"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Africa"))
        .stdout(predicate::str::contains("African_Elephant"))
        .stdout(predicate::str::contains("Zoo").not());
}

#[test]
fn test_in_neighbors_across_worker_counts() {
    let ws = Workspace::new().with_wildlife_graph();
    let expected = serde_json::json!([
        "(Band)",
        "Africa",
        "African_Elephant",
        "Elephant#Habitat",
        "Zoo"
    ]);

    for workers in ["1", "4", "37"] {
        let view = stdout_json(ws.cmd().args([
            "--workers",
            workers,
            "neighbors",
            "Elephant",
            "--direction",
            "in",
            "--json",
        ]));
        assert_eq!(view["in"], expected, "workers = {}", workers);
        assert!(view.get("out").is_none());
    }
}

#[test]
fn test_both_directions_with_timeout() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd()
        .args([
            "neighbors",
            "Elephant",
            "--direction",
            "both",
            "--timeout-secs",
            "30",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Out (2):"))
        .stdout(predicate::str::contains("In (5):"));
}

#[test]
fn test_query_and_logging_overrides() {
    let ws = Workspace::new();
    let config = stdout_json(ws.cmd().args([
        "--timeout-secs",
        "7",
        "--log-level",
        "warn",
        "config",
        "show",
        "--json",
    ]));
    assert_eq!(config["query"]["timeout_secs"], 7);
    assert_eq!(config["logging"]["level"], "warn");

    ws.cmd()
        .env("TOPICGRAPH_TIMEOUT_SECS", "3")
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"timeout_secs\": 3"));
}

#[test]
fn test_unknown_log_level_fails() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd()
        .args(["--log-level", "loud", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("logging.level"));
}

#[test]
fn test_invalid_worker_count_fails() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd()
        .args(["--workers", "0", "neighbors", "Elephant"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fan_out_workers"));
}

#[test]
fn test_subtopics_and_related() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd()
        .args(["subtopics", "Elephant"])
        .assert()
        .success()
        .stdout(predicate::str::contains("African_Elephant"))
        .stdout(predicate::str::contains("Africa\n").not());

    let related = stdout_json(ws.cmd().args(["related", "Elephant", "--json"]));
    assert_eq!(related, serde_json::json!(["Africa", "African_Elephant"]));

    ws.cmd()
        .args(["related", "Zoo", "--with", "Elephant"])
        .assert()
        .success()
        .stdout("no\n");
}

// ============================================================================
// Maintenance
// ============================================================================

#[test]
fn test_maintenance_workflow() {
    let ws = Workspace::new().with_wildlife_graph();

    let generated = stdout_json(ws.cmd().args(["roots", "generate", "--json"]));
    assert_eq!(generated["roots"]["processed"], 4);

    let root = stdout_json(ws.cmd().args(["roots", "find", "elephant", "--json"]));
    assert_eq!(root["subtopics"], serde_json::json!(["African_Elephant"]));

    let report = stdout_json(ws.cmd().args(["degrees", "update", "--json"]));
    assert_eq!(report["processed"], 6);

    let status = stdout_json(ws.cmd().args(["degrees", "status", "--json"]));
    assert_eq!(status["unprocessed"], 0);

    let again = stdout_json(ws.cmd().args(["degrees", "update", "--json"]));
    assert_eq!(again["processed"], 0);

    let topic = stdout_json(ws.cmd().args(["topic", "Elephant", "--json"]));
    assert_eq!(topic["indegree"], 5);
    assert_eq!(topic["outdegree"], 2);
    assert_eq!(topic["weight"], 8);
}

#[test]
fn test_degrees_reset() {
    let ws = Workspace::new().with_wildlife_graph();
    ws.cmd().args(["degrees", "update"]).assert().success();
    ws.cmd()
        .args(["degrees", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset degrees of 6 topics"));
}

#[test]
fn test_cleanup_dry_run_then_delete() {
    let ws = Workspace::new().with_wildlife_graph();

    let plan = stdout_json(ws.cmd().args(["cleanup", "--dry-run", "--json"]));
    assert_eq!(plan[0]["name"], "Elephant#Habitat");
    assert_eq!(plan[0]["delete"], true);
    ws.cmd()
        .args(["topic", "Elephant#Habitat"])
        .assert()
        .success();

    let report = stdout_json(ws.cmd().args(["cleanup", "--json"]));
    assert_eq!(report["processed"], 1);
    ws.cmd()
        .args(["topic", "Elephant#Habitat"])
        .assert()
        .failure();
}

#[test]
fn test_cleanup_threshold_keeps_connected() {
    let ws = Workspace::new().with_wildlife_graph();
    let report = stdout_json(ws.cmd().args(["cleanup", "--threshold", "1", "--json"]));
    assert_eq!(report["processed"], 0);
    assert_eq!(report["skipped"], 1);
}

// ============================================================================
// Status and Config
// ============================================================================

#[test]
fn test_status_counts_per_partition() {
    let ws = Workspace::new().with_wildlife_graph();
    let status = stdout_json(ws.cmd().args(["status", "--json"]));
    assert_eq!(status["vertices"], 6);
    assert_eq!(status["edges"], 7);
    assert_eq!(status["catch_all"], "dedicated");
    assert_eq!(status["edges_by_partition"]["e"], 3);
    assert_eq!(status["edges_by_partition"]["a"], 2);
    assert_eq!(status["edges_by_partition"]["other"], 1);
    assert_eq!(status["edges_by_partition"].as_object().unwrap().len(), 37);
}

#[test]
fn test_local_config_is_applied() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.path().join(".topicgraph")).unwrap();
    std::fs::write(
        ws.path().join(".topicgraph/config.toml"),
        "[query]\nfan_out_workers = 3\n",
    )
    .unwrap();
    ws.cmd().arg("init").assert().success();

    let status = stdout_json(ws.cmd().args(["status", "--json"]));
    assert_eq!(status["fan_out_workers"], 3);

    let status = stdout_json(ws.cmd().args(["--workers", "5", "status", "--json"]));
    assert_eq!(status["fan_out_workers"], 5);
}

#[test]
fn test_config_show_and_init() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[query]"))
        .stdout(predicate::str::contains("fan_out_workers = 8"));

    ws.cmd()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    assert!(ws.path().join(".topicgraph/config.toml").exists());

    let paths = stdout_json(ws.cmd().args(["config", "path", "--json"]));
    assert_eq!(paths["local_exists"], true);
    assert_eq!(paths["global_exists"], false);
}
