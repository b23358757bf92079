use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn datalink(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("datalink").unwrap();
    cmd.current_dir(dir.path())
        .env("DATALINK_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn json_out(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn init_workspace(dir: &TempDir, api_url: &str) {
    datalink(dir)
        .args(["init", "--api-url", api_url])
        .assert()
        .success();
    datalink(dir)
        .args(["link", "create", "bkm_raw_cpu"])
        .assert()
        .success();
}

const TARGET: [&str; 9] = [
    "bkm_raw_cpu",
    "--data-id",
    "1500001",
    "--data-name",
    "raw_cpu",
    "--table-id",
    "biz1.cpu_summary",
    "--cluster",
    "vm-cluster-01",
];

// ---------------------------------------------------------------------------
// datalink init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_store() {
    let dir = TempDir::new().unwrap();
    datalink(&dir)
        .args(["init", "--namespace", "bkmonitor", "--biz-id", "100147"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .datalink/config.yaml"));

    assert!(dir.path().join(".datalink/config.yaml").exists());
    assert!(dir.path().join(".datalink/metadata.redb").exists());
    let config = std::fs::read_to_string(dir.path().join(".datalink/config.yaml")).unwrap();
    assert!(config.contains("bkdata_biz_id: 100147"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    datalink(&dir).arg("init").assert().success();
    datalink(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .datalink/config.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    datalink(&dir)
        .args(["link", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("datalink init"));
}

#[test]
fn config_validate_reports_missing_app_code() {
    let dir = TempDir::new().unwrap();
    datalink(&dir).arg("init").assert().success();
    datalink(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app_code"));
}

// ---------------------------------------------------------------------------
// datalink cluster / link
// ---------------------------------------------------------------------------

#[test]
fn cluster_add_and_list() {
    let dir = TempDir::new().unwrap();
    datalink(&dir).arg("init").assert().success();
    datalink(&dir)
        .args(["cluster", "add", "vm-cluster-01", "--id", "3"])
        .assert()
        .success();

    let clusters = json_out(datalink(&dir).args(["cluster", "list"]));
    assert_eq!(clusters.as_array().unwrap().len(), 1);
    assert_eq!(clusters[0]["cluster_id"], 3);
    assert_eq!(clusters[0]["cluster_type"], "victoria_metrics");

    datalink(&dir)
        .args(["cluster", "add", "vm-cluster-01", "--id", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"));
}

#[test]
fn link_strategy_cannot_change() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir, "http://127.0.0.1:1");
    datalink(&dir)
        .args([
            "link",
            "create",
            "bkm_raw_cpu",
            "--strategy",
            "bcs_federal_proxy_time_series",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let links = json_out(datalink(&dir).args(["link", "list"]));
    assert_eq!(links[0]["data_link_strategy"], "bk_standard_v2_time_series");
    assert_eq!(links[0]["namespace"], "bkmonitor");
}

// ---------------------------------------------------------------------------
// datalink compose / apply / sync
// ---------------------------------------------------------------------------

#[test]
fn compose_prints_ordered_fragments_and_is_repeatable() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir, "http://127.0.0.1:1");

    let mut compose = datalink(&dir);
    compose.arg("compose").args(TARGET);
    let first = json_out(&mut compose);

    let mut compose = datalink(&dir);
    compose.arg("compose").args(TARGET);
    let second = json_out(&mut compose);

    assert_eq!(first, second);
    let kinds: Vec<&str> = first
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["ResultTable", "VmStorageBinding", "Databus"]);
    assert_eq!(first[2]["spec"]["sinks"].as_array().unwrap().len(), 1);

    let shown = json_out(datalink(&dir).args(["link", "show", "bkm_raw_cpu"]));
    assert_eq!(shown["resources"]["result_tables"].as_array().unwrap().len(), 1);
}

#[test]
fn apply_then_sync_end_to_end() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v4/apply/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result": true, "data": {"name": "bkm_raw_cpu"}}"#)
        .expect(1)
        .create();

    let dir = TempDir::new().unwrap();
    init_workspace(&dir, &server.url());
    datalink(&dir)
        .args(["cluster", "add", "vm-cluster-01", "--id", "3"])
        .assert()
        .success();

    let mut apply = datalink(&dir);
    apply.arg("apply").args(TARGET);
    let applied = json_out(&mut apply);
    assert_eq!(applied["response"]["name"], "bkm_raw_cpu");
    mock.assert();

    let records = json_out(datalink(&dir).args(["records", "list"]));
    assert_eq!(records[0]["status"], "Initializing");

    let mut sync = datalink(&dir);
    sync.arg("sync").args(TARGET);
    let outcome = json_out(&mut sync);
    assert_eq!(outcome["outcome"], "synced");
    assert_eq!(outcome["created"], false);

    let records = json_out(datalink(&dir).args(["records", "list", "--link", "bkm_raw_cpu"]));
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["status"], "Ok");
    assert_eq!(records[0]["storage_id"], 3);
    assert_eq!(records[0]["bkbase_table_id"], "2_bkm_biz1_cpu_summary");
}

#[test]
fn sync_with_unknown_cluster_succeeds_as_skipped() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir, "http://127.0.0.1:1");

    datalink(&dir)
        .arg("sync")
        .args(TARGET)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));

    let records = json_out(datalink(&dir).args(["records", "list"]));
    assert!(records.as_array().unwrap().is_empty());
}
