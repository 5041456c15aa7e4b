use std::time::Duration;

use integration_tests::{runtime, TestGateway};
use response_cache::ResponseCacheSettings;
use serde_json::json;

use super::executor;

#[test]
fn cached_field_is_served_until_it_expires() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        let response = gateway.post("{ cached }").await;
        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "cached": "value"
          }
        }
        "###);
        assert_eq!(response.cache_control(), Some("max-age=10, public"));
        assert_eq!(response.age(), None);
        assert_eq!(gateway.executor().calls("Query", "cached"), 1);

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.body, json!({"data": {"cached": "value"}}));
        assert_eq!(response.cache_control(), Some("max-age=10, public"));
        assert_eq!(response.age(), Some("0"));
        assert_eq!(gateway.executor().calls("Query", "cached"), 1);

        gateway.advance_clock(Duration::from_secs(5));
        let response = gateway.post("{ cached }").await;
        assert_eq!(response.age(), Some("5"));
        assert_eq!(gateway.executor().calls("Query", "cached"), 1);

        gateway.advance_clock(Duration::from_secs(6));
        let response = gateway.post("{ cached }").await;
        assert_eq!(response.age(), None);
        assert_eq!(response.cache_control(), Some("max-age=10, public"));
        assert_eq!(gateway.executor().calls("Query", "cached"), 2);
    });
}

#[test]
fn hits_do_not_extend_the_expiration() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        gateway.post("{ cached }").await;
        gateway.advance_clock(Duration::from_secs(8));
        assert_eq!(gateway.post("{ cached }").await.age(), Some("8"));

        gateway.advance_clock(Duration::from_secs(2));
        assert_eq!(gateway.post("{ cached }").await.age(), None);
        assert_eq!(gateway.executor().calls("Query", "cached"), 2);
    });
}

#[test]
fn unannotated_root_field_makes_the_response_uncacheable() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        for _ in 0..2 {
            let response = gateway.post("{ cached uncached }").await;
            insta::allow_duplicates! {
            insta::assert_json_snapshot!(response, @r###"
            {
              "data": {
                "cached": "value",
                "uncached": "uncached"
              }
            }
            "###);
            }
            assert_eq!(response.cache_control(), None);
            assert_eq!(response.age(), None);
        }

        assert_eq!(gateway.executor().calls("Query", "cached"), 2);
    });
}

#[test]
fn default_max_age_applies_to_root_fields() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor())
            .with_settings(ResponseCacheSettings {
                default_max_age: Duration::from_secs(60),
                ..Default::default()
            })
            .build();

        let response = gateway.post("{ uncached }").await;
        assert_eq!(response.cache_control(), Some("max-age=60, public"));

        let response = gateway.post("{ cached uncached }").await;
        assert_eq!(response.cache_control(), Some("max-age=10, public"));

        let response = gateway.post("{ uncached }").await;
        assert_eq!(response.age(), Some("0"));
        assert_eq!(gateway.executor().calls("Query", "uncached"), 2);
    });
}

#[test]
fn mutations_are_never_cached() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        for _ in 0..2 {
            let response = gateway.post("mutation { update }").await;
            assert_eq!(response.body, json!({"data": {"update": "updated"}}));
            assert_eq!(response.age(), None);
        }

        assert_eq!(gateway.executor().calls("Mutation", "update"), 2);
    });
}

#[test]
fn variables_and_operation_names_are_part_of_the_key() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();
        let query = r#"
            query Droid($id: ID!) { droid(id: $id) { name } }
            query Other { cached }
        "#;

        let response = gateway
            .post(query)
            .operation_name("Droid")
            .variables(json!({"id": "2"}))
            .await;
        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "droid": {
              "name": "R2-D2"
            }
          }
        }
        "###);
        assert_eq!(response.cache_control(), Some("max-age=120, public"));

        let response = gateway
            .post(query)
            .operation_name("Droid")
            .variables(json!({"id": "3"}))
            .await;
        assert_eq!(response.body, json!({"data": {"droid": {"name": "R2-D3"}}}));
        assert_eq!(response.age(), None);

        let response = gateway
            .post(query)
            .operation_name("Droid")
            .variables(json!({"id": "2"}))
            .await;
        assert_eq!(response.body, json!({"data": {"droid": {"name": "R2-D2"}}}));
        assert_eq!(response.age(), Some("0"));

        let response = gateway.post(query).operation_name("Other").await;
        assert_eq!(response.body, json!({"data": {"cached": "value"}}));
        assert_eq!(response.age(), None);

        assert_eq!(gateway.executor().calls("Query", "droid"), 2);
    });
}

#[test]
fn default_variable_values() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor()).build();

        let response = gateway
            .post(r#"query Droid($id: ID! = "5") { droid(id: $id) { name } }"#)
            .await;
        assert_eq!(response.body, json!({"data": {"droid": {"name": "R2-D5"}}}));
    });
}

#[test]
fn headers_can_be_disabled() {
    runtime().block_on(async {
        let gateway = TestGateway::builder(executor())
            .with_settings(ResponseCacheSettings {
                calculate_http_headers: false,
                ..Default::default()
            })
            .build();

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.cache_control(), None);

        let response = gateway.post("{ cached }").await;
        assert_eq!(response.cache_control(), None);
        assert_eq!(response.age(), Some("0"));
    });
}
