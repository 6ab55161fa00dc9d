use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEM: &str = "/api/config/namespaces/team/workloads/svc1";
const COLLECTION: &str = "/api/config/namespaces/team/workloads";

const REQUIRED: [(&str, &str); 10] = [
    ("F5XC_API_URL", "http://127.0.0.1:9/api"),
    ("F5XC_TENANT", "tenant"),
    ("F5XC_NAMESPACE", "team"),
    ("F5XC_SITE_NAME", "edge-site"),
    ("F5XC_WORKLOAD_NAME", "svc1"),
    ("IMAGE_REF", "registry/app:v1"),
    ("F5XC_REGISTRY_NAME", "team-acr"),
    ("F5XC_WORKLOAD_PORT", "8080"),
    ("TF_VAR_f5xc_api_p12_file", "/nonexistent/workloadctl/api.p12"),
    ("VES_P12_PASSWORD", "secret"),
];

/// A command isolated from the caller environment and configuration file.
fn workloadctl(env: &[(&str, &str)]) -> Command {
    let mut cmd = Command::cargo_bin("workloadctl").expect("workloadctl binary");
    cmd.env_clear()
        .env("HOME", std::env::temp_dir())
        .envs(env.iter().copied());
    cmd
}

fn env_without(name: &str) -> Vec<(&'static str, &'static str)> {
    REQUIRED
        .iter()
        .copied()
        .filter(|(key, _)| *key != name)
        .collect()
}

#[test]
fn every_missing_variable_is_reported() {
    let mut assert = workloadctl(&[]).arg("upsert").assert().failure().code(1);
    for (name, _) in REQUIRED {
        assert = assert.stderr(predicate::str::contains(name));
    }
}

#[test]
fn single_missing_variable_is_named() {
    workloadctl(&env_without("IMAGE_REF"))
        .arg("create")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Missing required environment variables: IMAGE_REF",
        ));
}

#[test]
fn missing_certificate_is_fatal() {
    workloadctl(&REQUIRED)
        .arg("get")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Certificate file not found at /nonexistent/workloadctl/api.p12",
        ));
}

#[test]
fn invalid_port_is_a_configuration_error() {
    let mut env = env_without("F5XC_WORKLOAD_PORT");
    env.push(("F5XC_WORKLOAD_PORT", "http"));

    workloadctl(&env)
        .arg("upsert")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("F5XC_WORKLOAD_PORT"));
}

#[test]
fn unknown_operation_is_rejected() {
    workloadctl(&REQUIRED).arg("patch").assert().failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_variable_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    let mut env: Vec<(&str, &str)> = env_without("F5XC_API_URL");
    env.retain(|(key, _)| *key != "VES_P12_PASSWORD");
    env.push(("F5XC_API_URL", api_url.as_str()));

    workloadctl(&env)
        .arg("delete")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("VES_P12_PASSWORD"));

    server.verify().await;
}

/// Complete environment with a real certificate, targeting `api_url`.
fn configured(api_url: &str) -> Vec<(&str, &str)> {
    let mut env: Vec<(&str, &str)> = REQUIRED
        .iter()
        .copied()
        .filter(|(key, _)| {
            !matches!(
                *key,
                "F5XC_API_URL" | "TF_VAR_f5xc_api_p12_file" | "VES_P12_PASSWORD"
            )
        })
        .collect();
    env.push(("F5XC_API_URL", api_url));
    env.push((
        "TF_VAR_f5xc_api_p12_file",
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client.p12"),
    ));
    env.push(("VES_P12_PASSWORD", "workloadctl"));
    env
}

#[tokio::test(flavor = "multi_thread")]
async fn upsert_creates_a_missing_workload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ITEM))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COLLECTION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metadata": {"name": "svc1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    workloadctl(&configured(&api_url))
        .arg("upsert")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Upserting workload svc1 in namespace team...\nAction: created\n",
        ));

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn upsert_replaces_an_existing_workload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ITEM))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metadata": {"name": "svc1"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(ITEM))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    workloadctl(&configured(&api_url))
        .arg("upsert")
        .assert()
        .success()
        .stdout(predicate::str::contains("Action: replaced"));

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn get_prints_indented_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ITEM))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metadata": {"name": "svc1"}})))
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    workloadctl(&configured(&api_url))
        .arg("get")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Getting workload svc1 in namespace team...\n",
        ))
        .stdout(predicate::str::contains(
            "{\n  \"metadata\": {\n    \"name\": \"svc1\"\n  }\n}\n",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_reports_the_action() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(ITEM))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    workloadctl(&configured(&api_url))
        .arg("delete")
        .assert()
        .success()
        .stdout(predicate::str::contains("Action: deleted"));
}

#[tokio::test(flavor = "multi_thread")]
async fn conflict_prints_the_remote_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COLLECTION))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"code": 9, "message": "already exists"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    workloadctl(&configured(&api_url))
        .arg("create")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Action:").not())
        .stderr(predicate::str::contains("Error during create: 409 Conflict returned by"))
        .stderr(predicate::str::contains(
            "Response Error: {\n  \"code\": 9,\n  \"message\": \"already exists\"\n}",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn html_page_is_previewed_once() {
    let server = MockServer::start().await;
    let page = format!("<html><body>{}</body></html>", "sign in ".repeat(100));
    Mock::given(method("GET"))
        .and(path(ITEM))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let api_url = format!("{}/api", server.uri());
    let output = workloadctl(&configured(&api_url))
        .arg("get")
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("<html><body>").count(), 1, "{}", stderr);
    assert!(stderr.contains("Received non-JSON response (HTTP 200 OK)"));
}

#[test]
fn unreachable_control_plane_is_reported_once() {
    let output = workloadctl(&configured("http://127.0.0.1:9/api"))
        .arg("get")
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error during get: Request to http://127.0.0.1:9/api/config/namespaces/team/workloads/svc1 failed."),
        "{}",
        stderr
    );
    assert_eq!(stderr.matches("error sending request").count(), 1, "{}", stderr);
}
