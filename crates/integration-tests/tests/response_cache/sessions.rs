use integration_tests::{runtime, TestGateway};
use serde_json::json;

use super::executor;

#[test]
fn private_responses_are_isolated_per_session() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).with_session_header().build();

        let response = gateway.post("{ private }").session("foo").await;
        assert_eq!(response.body, json!({"data": {"private": "secret of foo"}}));
        assert_eq!(response.cache_control(), Some("max-age=9, private"));
        assert_eq!(response.age(), None);

        let response = gateway.post("{ private }").session("bar").await;
        assert_eq!(response.body, json!({"data": {"private": "secret of bar"}}));
        assert_eq!(response.age(), None);

        let response = gateway.post("{ private }").session("foo").await;
        assert_eq!(response.body, json!({"data": {"private": "secret of foo"}}));
        assert_eq!(response.age(), Some("0"));

        let response = gateway.post("{ private }").await;
        assert_eq!(response.body, json!({"data": {"private": "secret of anonymous"}}));
        assert_eq!(response.age(), None);

        assert_eq!(gateway.executor().calls("Query", "private"), 3);
    });
}

#[test]
fn anonymous_private_responses_are_not_cached() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).with_session_header().build();

        for _ in 0..2 {
            let response = gateway.post("{ private }").await;
            assert_eq!(response.cache_control(), Some("max-age=9, private"));
            assert_eq!(response.age(), None);
        }

        assert_eq!(gateway.executor().calls("Query", "private"), 2);
    });
}

#[test]
fn private_responses_require_a_session_hook() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        for _ in 0..2 {
            let response = gateway.post("{ private }").session("foo").await;
            assert_eq!(response.cache_control(), Some("max-age=9, private"));
            assert_eq!(response.age(), None);
        }

        assert_eq!(gateway.executor().calls("Query", "private"), 2);
    });
}

#[test]
fn public_responses_are_shared_between_sessions_only() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).with_session_header().build();

        let response = gateway.post("{ cached }").session("foo").await;
        assert_eq!(response.age(), None);

        let response = gateway.post("{ cached }").session("bar").await;
        assert_eq!(response.age(), Some("0"));
        assert_eq!(response.cache_control(), Some("max-age=10, public"));

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.age(), None);

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.age(), Some("0"));

        assert_eq!(gateway.executor().calls("Query", "cached"), 2);
    });
}

#[test]
fn private_entry_takes_precedence_for_its_session() {
    runtime().block_on(async {
        let executor = integration_tests::MockExecutor::builder(
            r#"
            type Query {
                profile: String @cacheControl(maxAge: 30)
            }
            "#,
        )
        .with_resolver_fn("Query", "profile", |ctx| {
            let session = ctx.operation.header("session-id").unwrap_or_default().to_string();
            if session == "admin" {
                ctx.cache
                    .set_cache_hint(response_cache::CacheHint::new().with_scope(response_cache::CacheScope::Private));
            }
            Ok(json!(format!("profile for {session}")))
        })
        .build();
        let gateway = TestGateway::builder(executor).with_session_header().build();

        let response = gateway.post("{ profile }").session("admin").await;
        assert_eq!(response.cache_control(), Some("max-age=30, private"));

        let response = gateway.post("{ profile }").session("alice").await;
        assert_eq!(response.body, json!({"data": {"profile": "profile for alice"}}));
        assert_eq!(response.age(), None);

        let response = gateway.post("{ profile }").session("admin").await;
        assert_eq!(response.body, json!({"data": {"profile": "profile for admin"}}));
        assert_eq!(response.age(), Some("0"));

        let response = gateway.post("{ profile }").session("bob").await;
        assert_eq!(response.body, json!({"data": {"profile": "profile for alice"}}));
        assert_eq!(response.age(), Some("0"));

        assert_eq!(gateway.executor().calls("Query", "profile"), 2);
    });
}
