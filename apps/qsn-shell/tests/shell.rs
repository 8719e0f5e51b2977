use std::{path::PathBuf, sync::Arc, time::Duration};

use serde_json::Map;

use qsn_config::{Config, Credentials, Mirror, Queue, Remote, Service};
use qsn_service::Session;
use qsn_shell::{
	editor::TerminalEditor,
	shell::{self, Flow},
};
use qsn_testkit::{CallKind, FakeNoteClient, TestDir, sample_note};

fn test_config(temp_dir: PathBuf) -> Config {
	Config {
		service: Service { log_level: "info".to_string(), autostart: false },
		credentials: Credentials {
			username: Some("user@example.com".to_string()),
			password: Some("secret".to_string()),
		},
		remote: Remote {
			api_base: "http://localhost:9".to_string(),
			timeout_ms: 1_000,
			default_headers: Map::new(),
		},
		mirror: Mirror { temp_dir },
		queue: Queue { poll_interval_ms: 2, status_clear_delay_ms: 10, fetch_concurrency: 3 },
	}
}

#[tokio::test]
async fn drives_a_session_through_shell_commands() {
	let dir = TestDir::new("qsn_shell_test").expect("Failed to create test dir.");
	let client = Arc::new(FakeNoteClient::with_latency(Duration::from_millis(1)));

	client.seed([sample_note("k1", "First\nbody", 2.0), sample_note("k2", "Second", 1.0)]);

	let editor = Arc::new(TerminalEditor::new(PathBuf::from("qsn.toml")));
	let mut session =
		Session::with_client(test_config(dir.path().to_path_buf()), editor, client.clone());

	assert_eq!(shell::execute(&mut session, "start").expect("start failed"), Flow::Continue);

	session.run_until_idle().await;

	assert_eq!(shell::execute(&mut session, "list").expect("list failed"), Flow::Continue);
	assert_eq!(shell::execute(&mut session, "open 1").expect("open failed"), Flow::Continue);

	let path = session.mirror().path_for("k1").expect("Path failed.");

	std::fs::write(&path, "First\nedited").expect("Failed to edit note.");

	shell::execute(&mut session, "save k1").expect("save failed");
	session.run_until_idle().await;

	assert_eq!(client.calls(CallKind::Update), 1);
	assert_eq!(
		session.collection().get("k1").and_then(|note| note.content.as_deref()),
		Some("First\nedited")
	);

	shell::execute(&mut session, "delete k2").expect("delete failed");
	session.run_until_idle().await;

	assert_eq!(session.notes().len(), 1);
	assert!(shell::execute(&mut session, "open 0").is_err());
	assert!(shell::execute(&mut session, "save ../escape").is_err());
	assert_eq!(shell::execute(&mut session, "quit").expect("quit failed"), Flow::Quit);
}
