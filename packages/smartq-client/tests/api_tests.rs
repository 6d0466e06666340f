//! Customer endpoints end to end: login through the session, username
//! verb fallback and the shop feed.

mod common;

use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::json;
use smartq_client::{ChangeUsername, ClientError, LoginCredentials, TokenStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bob() -> LoginCredentials {
    LoginCredentials::UsernameOrEmail {
        username_or_email: "bob".into(),
        password: "hunter2".into(),
    }
}

#[tokio::test]
async fn test_login_commits_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/login"))
        .and(body_json(json!({"usernameOrEmail": "bob", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "accessToken": "jwt-1",
                "customer": {"_id": "c1", "name": "bob", "email": "bob@example.com"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/shops/all"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, session, store) = common::session(&server);
    let user = session.login(&api, &bob()).await.unwrap();

    assert_eq!(user.username, "bob");
    assert_eq!(user.id, "c1");
    assert_eq!(session.user_data(), user);
    assert_eq!(
        store.get().await.unwrap().unwrap().expose_secret(),
        "jwt-1"
    );

    // Later calls carry the new bearer token.
    api.list_shops().await.unwrap();
}

#[tokio::test]
async fn test_login_without_token_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Wrong phone number or password"
        })))
        .mount(&server)
        .await;

    let (api, session, store) = common::session(&server);
    let err = session.login(&api, &bob()).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidCredentials(_)));
    assert_eq!(err.to_string(), "Wrong username/email or password");
    assert!(!session.is_authenticated());
    assert!(session.user_data().is_empty());
    assert!(store.get().await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_timeout_leaves_session_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "late-jwt", "user": {"username": "bob"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (api, session, store) = common::session(&server);
    let err = session.login(&api, &bob()).await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
    assert!(!session.is_authenticated());
    assert!(!api.http().has_token());
    assert!(session.user_data().is_empty());
    assert!(store.get().await.unwrap().is_none());
}

#[tokio::test]
async fn test_phone_login_error_names_phone_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/login"))
        .and(body_json(json!({"phoneNumber": "5551234567", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid username or email"})),
        )
        .mount(&server)
        .await;

    let (api, session, _) = common::session(&server);
    let credentials = LoginCredentials::Phone {
        phone_number: "5551234567".into(),
        password: "pw".into(),
    };
    let err = session.login(&api, &credentials).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Invalid phone number");
}

#[tokio::test]
async fn test_login_seeds_profile_from_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-2",
            "user": {"role": "customer"}
        })))
        .mount(&server)
        .await;

    let (api, session, _) = common::session(&server);
    let credentials = LoginCredentials::Email {
        email: "bob@example.com".into(),
        password: "pw".into(),
    };
    let user = session.login(&api, &credentials).await.unwrap();

    assert_eq!(user.email, "bob@example.com");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_change_username_falls_back_to_patch_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/change-username"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Cannot POST /api/customers/change-username",
            "statusCode": 404
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/customers/change-username"))
        .and(body_json(json!({"username": "bobby", "email": "bob@example.com"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Username updated"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ack = common::api(&server)
        .change_username(&ChangeUsername {
            username: "bobby".into(),
            email: Some("bob@example.com".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(ack.success);
    assert_eq!(ack.message, "Username updated");
}

#[tokio::test]
async fn test_change_username_surfaces_patch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/change-username"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/customers/change-username"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "Username already taken"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = common::api(&server)
        .change_username(&ChangeUsername {
            username: "alice".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.user_message(), "Username already taken");
}

#[tokio::test]
async fn test_change_username_other_errors_skip_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/change-username"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "username is too short"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/customers/change-username"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = common::api(&server)
        .change_username(&ChangeUsername {
            username: "a".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_list_shops_accepts_every_envelope() {
    let shops = json!([
        {"_id": "s1", "name": "Noodle Bar", "cuisine": "Thai"},
        {"_id": "s2", "name": "Corner Cafe", "type": "Cafe"}
    ]);

    for body in [
        shops.clone(),
        json!({"data": shops.clone()}),
        json!({"shops": shops.clone()}),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shops/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let feed = common::api(&server).list_shops().await.unwrap();
        let names: Vec<_> = feed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Noodle Bar", "Corner Cafe"]);
    }
}

#[tokio::test]
async fn test_list_shops_unknown_shape_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/shops/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    assert!(common::api(&server).list_shops().await.unwrap().is_empty());
}
