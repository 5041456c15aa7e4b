use std::time::Duration;

use integration_tests::{runtime, TestGateway};
use response_cache::{default_cache_key, BaseCacheKeyData, CacheKeyData, ContextualCacheKeyData, ResponseCacheSettings};
use serde_json::{json, Value};

use super::executor;

fn anonymous_key(query: &str) -> String {
    let base = BaseCacheKeyData {
        source: query.to_string(),
        operation_name: None,
        variables: Default::default(),
        extra: Value::Null,
    };
    default_cache_key(&CacheKeyData::new(&base, &ContextualCacheKeyData::no_session())).unwrap()
}

#[test]
fn stored_entries() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();
        gateway.post("{ cached }").await;

        let key = format!("fqc:{}", anonymous_key("{ cached }"));
        let bytes = gateway.store().get(&key).await.unwrap().unwrap();
        let stored: Value = serde_json::from_slice(&bytes).unwrap();

        insta::assert_json_snapshot!(stored, {".cacheTime" => "[timestamp]"}, @r###"
        {
          "data": {
            "cached": "value"
          },
          "cachePolicy": {
            "maxAge": 10,
            "scope": "PUBLIC"
          },
          "cacheTime": "[timestamp]"
        }
        "###);
    });
}

#[test]
fn corrupt_entries_are_replaced() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();
        gateway.post("{ cached }").await;

        let key = format!("fqc:{}", anonymous_key("{ cached }"));
        gateway
            .store()
            .put(&key, "{\"data\": 42".into(), None)
            .await
            .unwrap();

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.error, None);
        assert_eq!(response.body, json!({"data": {"cached": "value"}}));
        assert_eq!(response.age(), None);
        assert_eq!(gateway.executor().calls("Query", "cached"), 2);

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.age(), Some("0"));
        assert_eq!(gateway.executor().calls("Query", "cached"), 2);
    });
}

#[test]
fn entries_with_a_different_shape_are_misses() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        let key = format!("fqc:{}", anonymous_key("{ cached }"));
        let stale = json!({"data": {"cached": "old"}, "cachePolicy": {"maxAge": 10}});
        gateway
            .store()
            .put(&key, serde_json::to_vec(&stale).unwrap().into(), None)
            .await
            .unwrap();

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.body, json!({"data": {"cached": "value"}}));
        assert_eq!(response.age(), None);
    });
}

#[test]
fn key_prefix() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor())
            .with_settings(ResponseCacheSettings::from_toml(r#"key_prefix = "responses:""#).unwrap())
            .build();
        gateway.post("{ cached }").await;

        let key = anonymous_key("{ cached }");
        assert!(gateway.store().get(&format!("responses:{key}")).await.unwrap().is_some());
        assert!(gateway.store().get(&format!("fqc:{key}")).await.unwrap().is_none());
    });
}

#[test]
fn configured_store() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).with_configured_store().build();

        gateway.post("{ cached }").await;
        assert_eq!(gateway.post("{ cached }").await.age(), Some("0"));

        gateway.advance_clock(Duration::from_secs(10));
        assert_eq!(gateway.post("{ cached }").await.age(), None);
        assert_eq!(gateway.executor().calls("Query", "cached"), 2);
    });
}

#[test]
fn ttl_follows_the_policy() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        // min(120, 60) for the nested friends
        gateway.post(r#"{ droid(id: "1") { friends { name } } }"#).await;

        gateway.advance_clock(Duration::from_secs(59));
        let response = gateway.post(r#"{ droid(id: "1") { friends { name } } }"#).await;
        assert_eq!(response.age(), Some("59"));

        gateway.advance_clock(Duration::from_secs(1));
        let response = gateway.post(r#"{ droid(id: "1") { friends { name } } }"#).await;
        assert_eq!(response.age(), None);
    });
}
