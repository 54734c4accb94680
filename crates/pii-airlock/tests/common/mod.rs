use pii_airlock::config::Config;
use pii_airlock::server::ServerState;

/// Boots a real `pii-airlock` instance on a loopback port and returns its
/// base URL. The background reaper tasks and the HTTP server itself run for
/// the lifetime of the test process; there is no graceful shutdown here,
/// mirroring how short-lived integration tests are usually run against a
/// throwaway instance.
pub async fn spawn_app(config: Config) -> String {
	spawn_app_with_state(config).await.0
}

/// Like [`spawn_app`], but also hands back the `ServerState` clone so tests
/// can seed tenants/keys directly, mirroring how an operator would seed the
/// tenant registry from the YAML file rather than through the HTTP API.
pub async fn spawn_app_with_state(config: Config) -> (String, ServerState) {
	let state = ServerState::new(config).expect("server state construction");
	let (_signal, watcher) = airlock_core::signal::new();
	state.spawn_background_tasks(watcher);

	let returned_state = state.clone();
	let app = pii_airlock::api::router(state);
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind loopback port");
	let addr = listener.local_addr().expect("local addr");

	tokio::spawn(async move {
		axum::serve(listener, app).await.expect("test server crashed");
	});

	(format!("http://{addr}"), returned_state)
}

/// A `Config` with the fields integration tests most commonly override
/// already pointed at sane test defaults: no auth required, response caching
/// on, and an upstream base URL the caller is expected to replace with a
/// mock server's address.
pub fn test_config() -> Config {
	let mut config = Config::for_tests();
	config.cache_enabled = true;
	config
}
