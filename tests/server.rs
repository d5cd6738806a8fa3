//! Server tests over a real local socket
//!
//! The socket location and config directory are redirected into a
//! temporary directory through the environment, so this file holds a
//! single test to keep those variables stable for its whole run.

#![cfg(target_os = "linux")]

mod support;

use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use futures_util::StreamExt;

use execution_api::common::paths;
use execution_api::ipc::protocol::ResponseType;
use execution_api::ipc::ExecutionClient;
use execution_api::rerun::FailedItems;
use execution_api::server::Server;

use support::{login_run, KnownDirs, ScriptedEngine, TIMEOUT};

async fn connect() -> ExecutionClient {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match ExecutionClient::connect().await {
                Ok(client) => return client,
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    })
    .await
    .expect("server socket never became available")
}

#[tokio::test]
async fn test_server_streams_run_and_records_failures() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("run").join("api.sock");
    let config_home = dir.path().join("config");
    let failures = dir.path().join("rerun").join("failures.json");

    std::fs::create_dir_all(config_home.join("execution-api")).unwrap();
    std::fs::write(
        config_home.join("execution-api").join("config.toml"),
        format!(
            "[server]\nclient_timeout_secs = 5\n\n[rerun]\nfailures_file = \"{}\"\n",
            failures.display()
        ),
    )
    .unwrap();

    std::env::set_var(paths::SOCKET_ENV_VAR, &socket);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    assert_eq!(paths::socket_path(), socket);

    let server = Server::load(KnownDirs(vec!["specs"]), ScriptedEngine::new(login_run())).unwrap();
    let running = tokio::spawn(async move { server.run().await });

    // Rejected run first: the server keeps serving afterwards
    let rejected: Vec<_> = connect()
        .await
        .execute(vec!["missing".to_string()])
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].as_ref().unwrap().kind, ResponseType::ErrorResult);

    let stream = connect()
        .await
        .execute(vec!["specs".to_string()])
        .await
        .unwrap();
    let kinds: Vec<_> = tokio::time::timeout(TIMEOUT, stream.collect::<Vec<_>>())
        .await
        .expect("response stream did not terminate")
        .into_iter()
        .map(|r| r.unwrap().kind)
        .collect();
    assert_eq!(kinds.len(), 10);
    assert_eq!(kinds.first(), Some(&ResponseType::SuiteStart));
    assert_eq!(kinds.last(), Some(&ResponseType::SuiteEnd));

    let socket_dir_mode = std::fs::metadata(socket.parent().unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(socket_dir_mode & 0o777, 0o700);
    let socket_mode = std::fs::metadata(&socket).unwrap().permissions().mode();
    assert_eq!(socket_mode & 0o777, 0o600);

    let recorded = tokio::time::timeout(TIMEOUT, async {
        loop {
            if let Ok(items) = FailedItems::load(&failures) {
                return items;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("failures file was not written");
    assert_eq!(recorded.args, vec!["specs"]);
    assert_eq!(recorded.failed_items, vec!["login.spec:12"]);

    running.abort();
}
