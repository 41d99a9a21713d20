//! Health checks over real HTTP against a mock server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use agent_admin::adapters::health::HttpHealthProbe;
use agent_admin::adapters::sqlite::{create_migrated_test_pool, SqliteAgentRepository};
use agent_admin::domain::models::{AgentDraft, HealthConfig, HealthStatus};
use agent_admin::domain::ports::AgentRepository;
use agent_admin::services::HealthService;

async fn service() -> (
    HealthService<SqliteAgentRepository, HttpHealthProbe>,
    Arc<SqliteAgentRepository>,
) {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = Arc::new(SqliteAgentRepository::new(pool));
    let probe = Arc::new(HttpHealthProbe::new(Duration::from_secs(2)));
    (
        HealthService::new(repo.clone(), probe, HealthConfig::default()),
        repo,
    )
}

fn draft(name: &str, health_url: Option<String>, mcp_url: Option<String>) -> AgentDraft {
    let mut draft = AgentDraft::new(name);
    draft.agent_health_url = health_url;
    draft.mcp_server_link = mcp_url;
    draft
}

#[tokio::test]
async fn test_check_agent_maps_statuses() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("GET", "/ok")
        .with_status(200)
        .create_async()
        .await;
    let busy = server
        .mock("GET", "/busy")
        .with_status(503)
        .create_async()
        .await;
    let gone = server
        .mock("GET", "/gone")
        .with_status(404)
        .create_async()
        .await;

    let (service, repo) = service().await;
    let cases = [
        ("ok", HealthStatus::Healthy, Some(200)),
        ("busy", HealthStatus::Degraded, Some(503)),
        ("gone", HealthStatus::Unhealthy, Some(404)),
    ];
    for (path, expected, code) in cases {
        let agent = repo
            .create(&draft(path, Some(format!("{}/{path}", server.url())), None))
            .await
            .unwrap();
        let result = service.check_agent(agent.public_id).await.unwrap();
        assert_eq!(result.status, expected, "{path}");
        assert_eq!(result.http_status, code);

        let stored = repo.get_by_public_id(agent.public_id).await.unwrap().unwrap();
        assert_eq!(stored.health_status, expected);
        assert!(stored.last_health_check.is_some());
    }

    ok.assert_async().await;
    busy.assert_async().await;
    gone.assert_async().await;
}

#[tokio::test]
async fn test_check_agent_without_urls_or_listener() {
    let (service, repo) = service().await;

    let bare = repo.create(&draft("bare", None, None)).await.unwrap();
    let result = service.check_agent(bare.public_id).await.unwrap();
    assert_eq!(result.status, HealthStatus::Unknown);
    assert!(result.url.is_none());

    let dead = repo
        .create(&draft("dead", None, Some("http://127.0.0.1:9/mcp".into())))
        .await
        .unwrap();
    let result = service.check_agent(dead.public_id).await.unwrap();
    assert_eq!(result.status, HealthStatus::Unreachable);
    assert_eq!(result.url.as_deref(), Some("http://127.0.0.1:9/mcp"));
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_sweep_accepts_auth_challenges() {
    let mut server = mockito::Server::new_async().await;
    let _auth = server
        .mock("GET", "/auth")
        .with_status(401)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/broken")
        .with_status(500)
        .create_async()
        .await;

    let (service, repo) = service().await;
    repo.create(&draft("guarded", None, Some(format!("{}/auth", server.url()))))
        .await
        .unwrap();
    repo.create(&draft("broken", Some(format!("{}/broken", server.url())), None))
        .await
        .unwrap();
    repo.create(&draft("silent", None, None)).await.unwrap();
    repo.create(&draft("off", Some(format!("{}/auth", server.url())), None).with_enabled(false))
        .await
        .unwrap();

    let summary = service.sweep().await.unwrap();
    assert_eq!(summary.checked, 3);
    assert_eq!(
        (summary.healthy, summary.unhealthy, summary.unknown),
        (1, 1, 1)
    );

    let guarded = summary
        .agents
        .iter()
        .find(|e| e.agent_name == "guarded")
        .unwrap();
    assert_eq!(guarded.status, HealthStatus::Healthy);
    assert_eq!(guarded.probes[0].source, "mcp_url");
    assert_eq!(guarded.probes[0].http_status, Some(401));
}
