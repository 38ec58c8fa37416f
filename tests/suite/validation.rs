//! Document events driving a stand-in checker end to end.

use serde_json::json;

use crate::common::{TestClient, file_uri, write_checker};

const TWO_FINDINGS: &str = r#"echo "$3:3: [E301] Commands should not change things if nothing needs doing"
echo "$3:7: [E403] Package installs should not use latest"
echo ""
echo "Finished with 2 failure(s)"
exit 2"#;

#[tokio::test]
async fn test_open_publishes_findings() {
    let dir = tempfile::tempdir().unwrap();
    let checker = write_checker(dir.path(), TWO_FINDINGS);
    let doc = dir.path().join("site.yml");
    let uri = file_uri(&doc);

    let mut client = TestClient::start(checker.to_string_lossy());
    client.initialize().await;
    client.did_open(&uri).await;

    let log = client.notification("window/logMessage").await;
    assert_eq!(log["type"], 4);
    assert_eq!(
        log["message"],
        format!("running {} -p --nocolor {}", checker.display(), doc.display())
    );

    let params = client.publish_diagnostics().await;
    assert_eq!(params["uri"], uri.as_str());
    let diagnostics = params["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0]["range"]["start"]["line"], 2);
    assert_eq!(diagnostics[0]["range"]["start"]["character"], 0);
    assert_eq!(diagnostics[0]["severity"], 2);
    assert_eq!(diagnostics[0]["source"], "ansible-lint");
    assert_eq!(
        diagnostics[0]["message"],
        "Commands should not change things if nothing needs doing"
    );
    assert_eq!(diagnostics[1]["range"]["start"]["line"], 6);

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_task_file_lints_role_and_routes_by_file() {
    let dir = tempfile::tempdir().unwrap();
    let role = dir.path().join("roles").join("web");
    let checker = write_checker(
        dir.path(),
        r#"echo "$3/tasks/main.yml:2: [E201] Trailing whitespace"
echo "$3/handlers/main.yml:5: [E305] Use shell only when shell functionality is required""#,
    );
    let task_file = role.join("tasks").join("main.yml");
    let handler_file = role.join("handlers").join("main.yml");

    let mut client = TestClient::start(checker.to_string_lossy());
    client.initialize().await;
    client.did_open(&file_uri(&task_file)).await;

    let log = client.notification("window/logMessage").await;
    assert!(
        log["message"]
            .as_str()
            .unwrap()
            .ends_with(&format!("-p --nocolor {}", role.display())),
        "unexpected log: {log}"
    );

    let first = client.publish_diagnostics().await;
    assert_eq!(first["uri"], file_uri(&task_file).as_str());
    assert_eq!(first["diagnostics"][0]["range"]["start"]["line"], 1);

    let second = client.publish_diagnostics().await;
    assert_eq!(second["uri"], file_uri(&handler_file).as_str());
    assert_eq!(second["diagnostics"][0]["range"]["start"]["line"], 4);

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_stderr_becomes_line_zero_warning() {
    let dir = tempfile::tempdir().unwrap();
    let checker = write_checker(dir.path(), r#"echo "Couldn't parse task at site.yml" >&2"#);
    let uri = file_uri(&dir.path().join("site.yml"));

    let mut client = TestClient::start(checker.to_string_lossy());
    client.initialize().await;
    client.did_open(&uri).await;

    let params = client.publish_diagnostics().await;
    assert_eq!(params["uri"], uri.as_str());
    assert_eq!(params["diagnostics"].as_array().unwrap().len(), 1);
    assert_eq!(params["diagnostics"][0]["range"]["start"]["line"], 0);
    assert_eq!(
        params["diagnostics"][0]["message"],
        "Couldn't parse task at site.yml"
    );

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_missing_checker_clears_document() {
    let dir = tempfile::tempdir().unwrap();
    let uri = file_uri(&dir.path().join("site.yml"));

    let mut client = TestClient::start(dir.path().join("not-installed").to_string_lossy());
    client.initialize().await;
    client.did_open(&uri).await;

    let params = client.publish_diagnostics().await;
    assert_eq!(params["uri"], uri.as_str());
    assert_eq!(params["diagnostics"], json!([]));

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_save_revalidates() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran-once");
    // First run reports a finding, every later run is clean.
    let checker = write_checker(
        dir.path(),
        &format!(
            r#"if [ ! -e "{marker}" ]; then
  touch "{marker}"
  echo "$3:1: [E204] Lines should be no longer than 160 chars"
fi"#,
            marker = marker.display()
        ),
    );
    let uri = file_uri(&dir.path().join("site.yml"));

    let mut client = TestClient::start(checker.to_string_lossy());
    client.initialize().await;
    client.did_open(&uri).await;
    let first = client.publish_diagnostics().await;
    assert_eq!(first["diagnostics"].as_array().unwrap().len(), 1);

    client.did_save(&uri).await;
    let second = client.publish_diagnostics().await;
    assert_eq!(second["uri"], uri.as_str());
    assert_eq!(second["diagnostics"], json!([]));

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_configuration_change_revalidates_open_documents() {
    let dir = tempfile::tempdir().unwrap();
    let checker = write_checker(dir.path(), "exit 0");
    let uri = file_uri(&dir.path().join("site.yml"));

    let mut client = TestClient::start(checker.to_string_lossy());
    client.initialize().await;
    client.did_open(&uri).await;
    assert_eq!(client.publish_diagnostics().await["uri"], uri.as_str());

    client
        .notify(
            "workspace/didChangeConfiguration",
            json!({ "settings": { "ansibleLinter": { "maxNumberOfProblems": 5 } } }),
        )
        .await;
    let log = client.notification("window/logMessage").await;
    assert!(log["message"].as_str().unwrap().starts_with("running "));
    let params = client.publish_diagnostics().await;
    assert_eq!(params["uri"], uri.as_str());
    assert_eq!(params["diagnostics"], json!([]));

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_close_after_run_clears_document() {
    let dir = tempfile::tempdir().unwrap();
    let checker = write_checker(dir.path(), TWO_FINDINGS);
    let uri = file_uri(&dir.path().join("site.yml"));

    let mut client = TestClient::start(checker.to_string_lossy());
    client.initialize().await;
    client.did_open(&uri).await;
    let opened = client.publish_diagnostics().await;
    assert_eq!(opened["diagnostics"].as_array().unwrap().len(), 2);

    client.did_close(&uri).await;
    let closed = client.publish_diagnostics().await;
    assert_eq!(closed["uri"], uri.as_str());
    assert_eq!(closed["diagnostics"], json!([]));

    assert_eq!(client.shutdown_and_exit().await, 0);
}
