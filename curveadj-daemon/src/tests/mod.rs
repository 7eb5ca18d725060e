pub mod mock_runner;

use crate::{
    config::{Config, Tool},
    server::{handle_stream, handler::Handler, Server},
};
use curveadj_schema::{Configuration, InvocationStatus};
use mock_runner::MockRunner;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::{fs, path::PathBuf};
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};

async fn exchange(handler: Handler, requests: &[Value]) -> Vec<Value> {
    let (client, server) = duplex(64 * 1024);
    let server_task = tokio::spawn(handle_stream(server, handler));

    let mut client = BufReader::new(client);
    let mut responses = Vec::with_capacity(requests.len());
    for request in requests {
        let mut payload = serde_json::to_vec(request).unwrap();
        payload.push(b'\n');
        client.get_mut().write_all(&payload).await.unwrap();

        let mut line = String::new();
        client.read_line(&mut line).await.unwrap();
        responses.push(serde_json::from_str(&line).unwrap());
    }

    drop(client);
    server_task.await.unwrap().unwrap();
    responses
}

async fn mock_handler(runner: &MockRunner) -> Handler {
    Handler::with_runner(
        &Config::default(),
        PathBuf::from("/opt/ryzenadj"),
        Box::new(runner.clone()),
    )
    .await
}

#[tokio::test]
async fn startup_performs_full_resync() {
    let runner = MockRunner::default();
    let handler = mock_handler(&runner).await;

    assert_eq!(runner.calls(), vec![vec!["--set-coall=0x100000".to_owned()]]);
    assert_eq!(handler.configurer().active().await, Configuration::default());
}

#[tokio::test]
async fn failed_startup_resync_keeps_default() {
    let runner = MockRunner::default();
    runner.push_status(InvocationStatus::SpawnFailed {
        error: "No such file or directory".to_owned(),
    });
    let handler = mock_handler(&runner).await;

    assert_eq!(runner.calls().len(), 1);
    assert_eq!(handler.configurer().active().await, Configuration::default());
}

#[tokio::test]
async fn dispatch_update_flow() {
    let runner = MockRunner::default();
    let handler = mock_handler(&runner).await;

    let responses = exchange(
        handler,
        &[
            json!({ "command": "ping" }),
            json!({ "command": "active_state" }),
            json!({ "command": "active_state" }),
            json!({
                "command": "set_configuration",
                "args": { "cpu_offset": -10, "apply_gpu_offset": true, "gpu_offset": -3 }
            }),
            json!({
                "command": "set_configuration",
                "args": { "cpu_offset": -10, "apply_gpu_offset": true, "gpu_offset": -3 }
            }),
        ],
    )
    .await;

    assert_eq!(responses[0], json!({ "status": "ok", "data": null }));

    assert_eq!(responses[1]["data"]["first_update"], json!(true));
    assert_eq!(responses[2]["data"]["first_update"], json!(false));
    assert_eq!(
        responses[2]["data"]["state"],
        json!({
            "apply_cpu_offset": true,
            "cpu_offset": 0,
            "apply_gpu_offset": false,
            "gpu_offset": 0,
            "show_debug": false
        })
    );

    let applied = &responses[3]["data"];
    assert_eq!(responses[3]["status"], json!("ok"));
    assert_eq!(applied["executed"], json!(true));
    assert_eq!(applied["committed"], json!(true));
    assert_eq!(applied["cpu_value"], json!("0xffff6"));
    assert_eq!(applied["gpu_value"], json!("0xffffd"));
    assert_eq!(
        applied["details"]["command"],
        json!(["/opt/ryzenadj", "--set-coall=0xffff6", "--set-cogfx=0xffffd"])
    );

    let repeated = &responses[4]["data"];
    assert_eq!(repeated["executed"], json!(false));
    assert_eq!(repeated["details"], json!(null));
    assert_eq!(repeated["cpu_offset"], json!(-10));

    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn dispatch_failed_update_reports_previous_state() {
    let runner = MockRunner::default();
    let handler = mock_handler(&runner).await;
    runner.push_status(InvocationStatus::Exited { code: 255 });

    let responses = exchange(
        handler,
        &[json!({
            "command": "set_configuration",
            "args": { "apply_cpu_offset": false }
        })],
    )
    .await;

    let data = &responses[0]["data"];
    assert_eq!(data["executed"], json!(true));
    assert_eq!(data["committed"], json!(false));
    assert_eq!(data["apply_cpu_offset"], json!(true));
    assert_eq!(data["details"]["status"], json!({ "kind": "exited", "code": 255 }));
    assert_eq!(data["details"]["stderr"], json!("mock failure"));
    let calls = runner.calls();
    assert_eq!(
        calls.last().unwrap(),
        &vec!["--set-coall=0x100000".to_owned()]
    );
}

#[tokio::test]
async fn dispatch_resume_reapplies_in_full() {
    let runner = MockRunner::default();
    let handler = mock_handler(&runner).await;

    let responses = exchange(
        handler,
        &[
            json!({
                "command": "apply_full_configuration",
                "args": { "cpu_offset": -4, "apply_gpu_offset": true }
            }),
            json!({ "command": "resume_from_suspend" }),
            json!({ "command": "reapply" }),
        ],
    )
    .await;

    for response in &responses {
        assert_eq!(response["data"]["committed"], json!(true));
    }

    let full = vec![
        "--set-coall=0xffffc".to_owned(),
        "--set-cogfx=0x100000".to_owned(),
    ];
    let calls = runner.calls();
    assert_eq!(calls[1..].to_vec(), vec![full.clone(), full.clone(), full]);
}

#[tokio::test]
async fn dispatch_invalid_requests() {
    let runner = MockRunner::default();
    let handler = mock_handler(&runner).await;

    let responses = exchange(
        handler,
        &[
            json!({ "command": "set_configuration", "args": { "cpu_voltage": 3 } }),
            json!({ "command": "format_disk" }),
        ],
    )
    .await;

    for response in &responses {
        assert_eq!(response["status"], json!("error"));
    }
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn dispatch_daemon_info() {
    let runner = MockRunner::default();
    let handler = mock_handler(&runner).await;

    let responses = exchange(handler, &[json!({ "command": "daemon_info" })]).await;

    let data = &responses[0]["data"];
    assert_eq!(data["tool_path"], json!("/opt/ryzenadj"));
    assert_eq!(data["timeout_ms"], json!(10_000));
    assert_eq!(data["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn existing_socket_aborts_before_touching_hardware() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("curveadjd.sock");
    fs::write(&socket_path, "").unwrap();

    let config = Config {
        tool: Tool {
            path: Some(PathBuf::from("/opt/ryzenadj")),
            ..Default::default()
        },
        initial: Configuration::new(true, -20, false, 0, false),
        ..Default::default()
    };
    let runner = MockRunner::default();
    let init = async {
        Ok(Handler::with_runner(
            &config,
            PathBuf::from("/opt/ryzenadj"),
            Box::new(runner.clone()),
        )
        .await)
    };

    let result = Server::start(&config, &socket_path, init).await;

    let err = result.err().unwrap();
    assert!(err.to_string().contains("already exists"));
    assert!(runner.calls().is_empty());
    assert!(socket_path.exists());
}
