use std::time::Duration;

use integration_tests::{runtime, MockExecutor, TestGateway};
use response_cache::{CacheHint, CacheScope, ResponseCacheSettings};
use rstest::rstest;
use serde_json::json;

use super::executor;

#[rstest]
#[case::field_hint_wins_over_type_hint("{ droid(id: \"1\") { name } }", Some("max-age=120, public"))]
#[case::type_hint_on_nested_field("{ droid(id: \"1\") { friends { name } } }", Some("max-age=60, public"))]
#[case::smallest_max_age("{ cached droid(id: \"1\") { primaryFunction } }", Some("max-age=10, public"))]
#[case::scope_without_max_age("{ droid(id: \"1\") { secret } }", Some("max-age=120, private"))]
#[case::inherit_from_parent("{ droid(id: \"1\") { owner { name } } }", Some("max-age=120, public"))]
#[case::inherit_through_lists("{ droid(id: \"1\") { friends { owner { name } } } }", Some("max-age=60, public"))]
#[case::abstract_type_without_hint("{ hero { name } }", None)]
#[case::fragment_spread("query { ...Fields } fragment Fields on Query { cached }", Some("max-age=10, public"))]
#[case::typename_only("{ __typename }", None)]
fn cache_control_header(#[case] query: &str, #[case] expected: Option<&str>) {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();
        let response = gateway.post(query).await;

        assert!(response.body.get("errors").is_none(), "{}", response.body);
        assert_eq!(response.cache_control(), expected);
    });
}

#[test]
fn abstract_types_and_fragments() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor())
            .with_settings(ResponseCacheSettings {
                default_max_age: Duration::from_secs(300),
                ..Default::default()
            })
            .build();

        let response = gateway
            .post(
                r#"
                query {
                    search(text: "r") {
                        __typename
                        ... on Droid { name primaryFunction }
                        ... on Human { name }
                    }
                }
                "#,
            )
            .await;

        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "search": [
              {
                "__typename": "Droid",
                "name": "R2-D2",
                "primaryFunction": "astromech"
              },
              {
                "__typename": "Human",
                "name": "Leia"
              }
            ]
          }
        }
        "###);
        assert_eq!(response.cache_control(), Some("max-age=30, public"));
    });
}

#[test]
fn interface_fragments() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        let response = gateway
            .post("{ hero { ... on Character { name } ... on Droid { primaryFunction } } }")
            .await;
        assert_eq!(response.body, json!({"data": {"hero": {"name": "Luke"}}}));
    });
}

#[test]
fn malformed_directive_arguments_are_ignored() {
    runtime().block_on(async {
        let executor = MockExecutor::builder(
            r#"
            type Query {
                quoted: String @cacheControl(maxAge: "10")
                negative: String @cacheControl(maxAge: -5)
                unknownScope: String @cacheControl(maxAge: 10, scope: SECRET)
            }
            "#,
        )
        .with_resolver("Query", "quoted", "a")
        .with_resolver("Query", "negative", "b")
        .with_resolver("Query", "unknownScope", "c")
        .build();
        let gateway = TestGateway::builder(executor).build();

        assert_eq!(gateway.post("{ quoted }").await.cache_control(), None);
        assert_eq!(gateway.post("{ negative }").await.cache_control(), None);
        assert_eq!(
            gateway.post("{ unknownScope }").await.cache_control(),
            Some("max-age=10, public")
        );
    });
}

#[test]
fn resolvers_can_set_hints() {
    runtime().block_on(async {
        let executor = MockExecutor::builder(
            r#"
            type Query {
                dynamic: String
                restricted: String @cacheControl(maxAge: 60)
                personal: String @cacheControl(maxAge: 60)
            }
            "#,
        )
        .with_resolver_fn("Query", "dynamic", |ctx| {
            ctx.cache
                .set_cache_hint(CacheHint::new().with_max_age(Duration::from_secs(5)));
            ctx.cache
                .set_cache_hint(CacheHint::new().with_max_age(Duration::from_secs(30)));
            Ok(json!("dynamic"))
        })
        .with_resolver_fn("Query", "restricted", |ctx| {
            ctx.cache
                .restrict_cache_hint(CacheHint::new().with_max_age(Duration::from_secs(20)));
            ctx.cache
                .restrict_cache_hint(CacheHint::new().with_max_age(Duration::from_secs(90)));
            Ok(json!("restricted"))
        })
        .with_resolver_fn("Query", "personal", |ctx| {
            ctx.cache.set_cache_hint(CacheHint::new().with_scope(CacheScope::Private));
            Ok(json!("personal"))
        })
        .build();
        let gateway = TestGateway::builder(executor).build();

        assert_eq!(
            gateway.post("{ dynamic }").await.cache_control(),
            Some("max-age=30, public")
        );
        assert_eq!(
            gateway.post("{ restricted }").await.cache_control(),
            Some("max-age=20, public")
        );
        assert_eq!(
            gateway.post("{ personal }").await.cache_control(),
            Some("max-age=60, private")
        );
        assert_eq!(
            gateway.post("{ dynamic restricted }").await.cache_control(),
            Some("max-age=20, public")
        );

        // the dynamic hint is what gets stored
        assert_eq!(gateway.post("{ dynamic }").await.age(), Some("0"));
        assert_eq!(gateway.executor().calls("Query", "dynamic"), 2);
    });
}
