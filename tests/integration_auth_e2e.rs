//! End-to-end authentication flow tests against a mock platform server.

use d2s_client::{ACCESS_TOKEN_COOKIE, Auth, Error, REFRESH_TOKEN_COOKIE, Session};

const USER_BODY: &str = r#"{
    "id": "11111111-2222-3333-4444-555555555555",
    "email": "researcher@example.org",
    "first_name": "Ada",
    "last_name": "Lovelace",
    "api_access_token": "key-123"
}"#;

#[test]
fn login_stores_loopback_scoped_cookies_and_the_api_key() {
    let mut server = mockito::Server::new();

    let token = server
        .mock("POST", "/api/v1/auth/access-token")
        .with_status(200)
        .with_header("set-cookie", "access_token=tok-1; Path=/")
        .with_header("set-cookie", "refresh_token=ref-1; Path=/")
        .expect(1)
        .create();
    let user = server
        .mock("GET", "/api/v1/users/current")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER_BODY)
        .expect(1)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let session = auth
        .login("researcher@example.org", "hunter2")
        .expect("login");

    token.assert();
    user.assert();

    let access = session.cookie(ACCESS_TOKEN_COOKIE).expect("access cookie");
    assert_eq!(access.value, "tok-1");
    assert_eq!(access.domain, None); // mock server listens on a loopback host
    assert_eq!(access.path, "/");

    let refresh = session.cookie(REFRESH_TOKEN_COOKIE).expect("refresh cookie");
    assert_eq!(refresh.value, "ref-1");

    assert_eq!(session.api_key().as_deref(), Some("key-123"));
}

#[test]
fn login_with_bad_credentials_is_an_auth_error() {
    let mut server = mockito::Server::new();
    let token = server
        .mock("POST", "/api/v1/auth/access-token")
        .with_status(401)
        .expect(1)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let err = auth.login("researcher@example.org", "wrong").unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    token.assert();
}

#[test]
fn login_failures_carry_the_status_code() {
    let mut server = mockito::Server::new();
    let _token = server
        .mock("POST", "/api/v1/auth/access-token")
        .with_status(503)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let err = auth.login("researcher@example.org", "hunter2").unwrap_err();

    match err {
        Error::Auth(message) => assert!(message.contains("503"), "message: {message}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn login_without_an_access_token_cookie_fails() {
    let mut server = mockito::Server::new();
    let _token = server
        .mock("POST", "/api/v1/auth/access-token")
        .with_status(200)
        .create();
    let user = server
        .mock("GET", "/api/v1/users/current")
        .expect(0)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let err = auth.login("researcher@example.org", "hunter2").unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    user.assert();
}

#[test]
fn login_is_incomplete_without_the_user_lookup() {
    let mut server = mockito::Server::new();
    let _token = server
        .mock("POST", "/api/v1/auth/access-token")
        .with_status(200)
        .with_header("set-cookie", "access_token=tok-1; Path=/")
        .create();
    let user = server
        .mock("GET", "/api/v1/users/current")
        .with_status(500)
        .expect(1)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let err = auth.login("researcher@example.org", "hunter2").unwrap_err();

    match err {
        Error::Auth(message) => {
            assert!(message.contains("user information"), "message: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    user.assert();
}

#[test]
fn current_user_is_a_best_effort_lookup() {
    let mut server = mockito::Server::new();
    let user = server
        .mock("GET", "/api/v1/users/current")
        .with_status(403)
        .expect(1)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let session = Session::new();

    let result = auth.current_user(&session).expect("no transport error");
    assert!(result.is_none());
    user.assert();
}

#[test]
fn current_user_returns_the_identity_record() {
    let mut server = mockito::Server::new();
    let _user = server
        .mock("GET", "/api/v1/users/current")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER_BODY)
        .create();

    let auth = Auth::new(&server.url()).expect("auth");
    let session = Session::new();
    session.set_cookie(ACCESS_TOKEN_COOKIE, "tok-1", "127.0.0.1");

    let user = auth
        .current_user(&session)
        .expect("no transport error")
        .expect("user");
    assert_eq!(user.email, "researcher@example.org");
    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.last_name, "Lovelace");
    assert_eq!(user.api_access_token.as_deref(), Some("key-123"));
}
