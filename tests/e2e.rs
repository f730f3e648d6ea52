use huddle::{create_app, serve, RoomEvent};
use huddle_exec::{ExecutionRouter, StatusKind};
use reqwest::Client;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

async fn start_server() -> color_eyre::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_app(ExecutionRouter::local(), 4);
    tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            eprintln!("Server error: {}", e);
        }
    });
    Ok(addr)
}

#[tokio::test]
async fn test_room_runs_over_http() -> color_eyre::Result<()> {
    let addr = start_server().await?;
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

    let health = client.get(format!("http://{}/health", addr)).send().await?;
    assert!(health.status().is_success());
    assert_eq!(health.text().await?, "OK");

    let cases = [
        (
            "rhai",
            "let n = input();\nprint(n * 2);",
            "21",
            StatusKind::Success,
            "> 21\n42\n",
        ),
        (
            "python",
            "print(\"age:\", 30)",
            "",
            StatusKind::Success,
            "age: 30\n",
        ),
        (
            "cpp",
            "int main() {\n    cout << \"hi\" << endl;\n",
            "",
            StatusKind::CompileError,
            "main.cpp:1: error: '{' was never closed",
        ),
    ];

    for (language, code, input, status, expected) in cases {
        let response = client
            .post(format!("http://{}/rooms/e2e-room/run", addr))
            .json(&json!({ "language": language, "code": code, "input": input }))
            .send()
            .await?;
        assert!(response.status().is_success());

        let event: RoomEvent = response.json().await?;
        assert_eq!(event.event, "codeOutput");
        assert_eq!(event.status, status, "{}", event.output);
        assert!(event.output.contains(expected), "{}", event.output);
    }

    let rejected = client
        .post(format!("http://{}/rooms/e2e-room/run", addr))
        .json(&json!({ "language": "brainfuck", "code": "+." }))
        .send()
        .await?;
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);

    Ok(())
}
