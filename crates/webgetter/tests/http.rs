//! End-to-end invocations over a loopback HTTP server.

use std::sync::Arc;

use webgetter::{
    DEFAULT_USER_AGENT, FetchError, Fetcher, HttpFetcher, Method, NetworkOptions,
    RequestDescriptor,
};
use webgetter_config::{ModuleConfig, TriggerConfig, UserAgent};
use webgetter_test::{
    Fixture, FixtureServer, MockHost, WEATHER_PAGE, forecast_trigger, init_test_logging,
    weather_trigger,
};

fn config(triggers: Vec<TriggerConfig>) -> ModuleConfig {
    ModuleConfig {
        triggers,
        ..ModuleConfig::default()
    }
}

async fn server() -> FixtureServer {
    init_test_logging();
    FixtureServer::start()
        .await
        .unwrap()
        .with_fixture("/weather", Fixture::ok("text/html; charset=utf-8", WEATHER_PAGE))
}

#[tokio::test]
async fn weather_over_http() {
    let server = server().await;
    let host = MockHost::new();
    let module = host.module();
    module
        .install(config(vec![weather_trigger(&server.url("/weather"))]))
        .unwrap();

    module
        .handle_request(&host.channel_message("weather paris"))
        .await
        .unwrap();
    assert_eq!(host.sent_texts(), vec!["72F degrees"]);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/weather");
    assert_eq!(requests[0].query.as_deref(), Some("c=paris"));
    assert_eq!(requests[0].header("User-Agent"), Some(DEFAULT_USER_AGENT));
}

#[tokio::test]
async fn rows_over_http() {
    let server = server().await;
    let host = MockHost::new();
    let module = host.module();
    module
        .install(config(vec![forecast_trigger(&server.url("/weather"))]))
        .unwrap();

    module
        .handle_request(&host.channel_message("forecast week"))
        .await
        .unwrap();
    assert_eq!(host.sent_texts(), vec!["Mon: 70", "Tue: 65", "Wed: 68"]);
}

#[tokio::test]
async fn form_post_and_custom_user_agent() {
    let server = server().await;
    let host = MockHost::new();
    let module = host.module();
    let trigger = weather_trigger(&server.url("/weather"))
        .with_post("city", "$(0)")
        .with_user_agent(UserAgent::Custom("Mozilla/5.0 (test)".into()));
    module.install(config(vec![trigger])).unwrap();

    module
        .handle_request(&host.channel_message("weather new york"))
        .await
        .unwrap();
    assert_eq!(host.sent_texts(), vec!["72F degrees"]);

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.body, "city=new%20york");
    assert_eq!(
        request.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(request.header("user-agent"), Some("Mozilla/5.0 (test)"));
}

#[tokio::test]
async fn empty_user_agent_sends_no_header() {
    let server = server().await;
    let host = MockHost::new();
    let module = host.module();
    let trigger = weather_trigger(&server.url("/weather")).with_user_agent(UserAgent::Omit);
    module.install(config(vec![trigger])).unwrap();

    module
        .handle_request(&host.channel_message("weather paris"))
        .await
        .unwrap();
    assert_eq!(server.requests()[0].header("user-agent"), None);
}

#[tokio::test]
async fn error_status_pages_are_still_parsed() {
    let server = server().await.with_fixture(
        "/gone",
        Fixture::ok("text/html", "<span class='temp'>n/a</span>").with_status(404),
    );
    let host = MockHost::new();
    let module = host.module();
    module
        .install(config(vec![weather_trigger(&server.url("/gone"))]))
        .unwrap();

    module
        .handle_request(&host.channel_message("weather paris"))
        .await
        .unwrap();
    assert_eq!(host.sent_texts(), vec!["n/a degrees"]);
}

#[tokio::test]
async fn missing_content_type_is_invalid_response() {
    let server = server().await;
    let host = MockHost::new();
    let module = host.module();
    module
        .install(config(vec![weather_trigger(&server.url("/nowhere"))]))
        .unwrap();

    module
        .handle_request(&host.channel_message("weather paris"))
        .await
        .unwrap();
    assert_eq!(host.sent_texts(), vec!["Invalid response received"]);
}

#[tokio::test]
async fn latin1_page_is_decoded() {
    let server = server().await.with_fixture(
        "/latin1",
        Fixture::ok(
            "text/html; charset=iso-8859-1",
            b"<span class='temp'>22\xB0C</span>".to_vec(),
        ),
    );
    let host = MockHost::new();
    let module = host.module();
    module
        .install(config(vec![weather_trigger(&server.url("/latin1"))]))
        .unwrap();

    module
        .handle_request(&host.channel_message("weather paris"))
        .await
        .unwrap();
    assert_eq!(host.sent_texts(), vec!["22°C degrees"]);
}

#[tokio::test]
async fn connection_failure_is_one_error_line() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let host = MockHost::new();
    let module = host.module();
    module
        .install(config(vec![weather_trigger(&format!("http://{addr}/"))]))
        .unwrap();

    module
        .handle_request(&host.channel_message("weather paris"))
        .await
        .unwrap();
    let lines = host.sent_texts();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("An error occurred while retrieving the information ("));
}

#[tokio::test]
async fn body_limit_is_enforced() {
    let server = server().await;
    let request = RequestDescriptor {
        method: Method::Get,
        url: server.url("/weather").parse().unwrap(),
        body: None,
        user_agent: None,
        options: NetworkOptions::default(),
    };

    let err = HttpFetcher::new()
        .with_max_body_size(16)
        .fetch(&request)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::BodyTooLarge { limit: 16 });

    let response = HttpFetcher::new().fetch(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.mime_type(), "text/html");
    assert_eq!(response.body, WEATHER_PAGE.as_bytes());
}

#[tokio::test]
async fn module_can_be_shared_across_tasks() {
    let server = server().await;
    let host = MockHost::new();
    let module = Arc::new(host.module());
    module
        .install(config(vec![weather_trigger(&server.url("/weather"))]))
        .unwrap();

    let mut tasks = Vec::new();
    for city in ["paris", "lyon", "nice"] {
        let module = Arc::clone(&module);
        let message = host.channel_message(&format!("weather {city}"));
        tasks.push(tokio::spawn(async move {
            module.handle_request(&message).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(host.sent_texts(), vec!["72F degrees"; 3]);
    assert_eq!(server.requests().len(), 3);
}
