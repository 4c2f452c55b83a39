use httpmock::prelude::*;
use wallet_realtime::{SessionFault, SessionGateway};
use wallet_session::{NewUser, SessionClient, SessionConfig, SessionError, hash_password};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_client(server: &MockServer) -> SessionClient {
    SessionClient::new(SessionConfig::new(server.base_url())).expect("valid base url")
}

// ---------------------------------------------------------------------------
// Validity check mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_login_accepts_success() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/user/login/check");
        then.status(200);
    });

    let client = test_client(&server);
    client.check_login().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn check_login_maps_401_to_unauthorized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/user/login/check");
        then.status(401);
    });

    let client = test_client(&server);
    assert!(matches!(
        client.check_login().await,
        Err(SessionError::Unauthorized)
    ));
}

#[tokio::test]
async fn check_login_maps_other_statuses() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/user/login/check");
        then.status(503);
    });

    let client = test_client(&server);
    match client.check_login().await {
        Err(SessionError::Status(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected Status error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Refresh mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_token_posts_to_refresh_endpoint() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/user/login/refresh");
        then.status(200);
    });

    let client = test_client(&server);
    client.refresh_token().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn refresh_token_maps_401_to_unauthorized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/user/login/refresh");
        then.status(401);
    });

    let client = test_client(&server);
    assert!(matches!(
        client.refresh_token().await,
        Err(SessionError::Unauthorized)
    ));
}

// ---------------------------------------------------------------------------
// Login / register / logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_sends_password_digest_not_clear_text() {
    let server = MockServer::start();
    let password = "correct horse battery staple";
    let mock = server.mock(|when, then| {
        when.method(POST).path("/user/login").json_body(serde_json::json!({
            "email": "ada@example.com",
            "encryptedPassword": hash_password(password),
        }));
        then.status(200);
    });

    let client = test_client(&server);
    client.login("ada@example.com", password).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn register_sends_profile_and_digest() {
    let server = MockServer::start();
    let password = "hunter2hunter2";
    let mock = server.mock(|when, then| {
        when.method(POST).path("/user").json_body(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "birthDate": "1815-12-10",
            "email": "ada@example.com",
            "encryptedPassword": hash_password(password),
        }));
        then.status(201);
    });

    let client = test_client(&server);
    let user = NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        birth_date: "1815-12-10".to_string(),
        email: "ada@example.com".to_string(),
    };
    client.register(&user, password).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn logout_posts_to_logout_endpoint() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/user/logout");
        then.status(200);
    });

    let client = test_client(&server);
    client.logout().await.unwrap();
    mock.assert();
}

// ---------------------------------------------------------------------------
// Cookie flow: login cookies ride along on later requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_cookie_rides_along_on_check() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/user/login");
        then.status(200)
            .header("set-cookie", "access=tok-1; Path=/");
    });
    let check = server.mock(|when, then| {
        when.method(GET)
            .path("/user/login/check")
            .header("cookie", "access=tok-1");
        then.status(200);
    });

    let client = test_client(&server);
    client.login("ada@example.com", "pw-pw-pw-pw").await.unwrap();
    client.check_login().await.unwrap();
    check.assert();
}

// ---------------------------------------------------------------------------
// SessionGateway classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_maps_check_401_to_credential_expired() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/user/login/check");
        then.status(401);
    });

    let client = test_client(&server);
    let gateway: &dyn SessionGateway = &client;
    assert!(matches!(
        gateway.check().await,
        Err(SessionFault::CredentialExpired)
    ));
}

#[tokio::test]
async fn gateway_maps_refresh_401_to_session_ended() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/user/login/refresh");
        then.status(401);
    });

    let client = test_client(&server);
    let gateway: &dyn SessionGateway = &client;
    assert!(matches!(
        gateway.refresh().await,
        Err(SessionFault::SessionEnded)
    ));
}

#[tokio::test]
async fn gateway_maps_server_errors_to_unreachable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/user/login/check");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(POST).path("/user/login/refresh");
        then.status(500);
    });

    let client = test_client(&server);
    let gateway: &dyn SessionGateway = &client;
    assert!(matches!(
        gateway.check().await,
        Err(SessionFault::Unreachable(_))
    ));
    assert!(matches!(
        gateway.refresh().await,
        Err(SessionFault::Unreachable(_))
    ));
}
