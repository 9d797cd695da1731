//! End-to-end tests over the composed application: authentication,
//! validation, and the CRUD lifecycle against the shared directory.

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::{test as actix_test, web};
use serde_json::{Value, json};

use backend::api::health::HealthState;
use backend::domain::UserDirectory;
use backend::middleware::BearerAuth;
use backend::{AppDependencies, build_app};

const TOKEN: &str = "integration-token";

fn dependencies() -> AppDependencies {
    AppDependencies {
        directory: web::Data::new(UserDirectory::new()),
        health_state: web::Data::new(HealthState::new()),
        auth: BearerAuth::new([TOKEN.to_owned()]),
    }
}

fn bearer() -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {TOKEN}"))
}

fn user_json(username: &str, email: &str, age: i64) -> Value {
    json!({"username": username, "email": email, "age": age})
}

async fn create_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    body: &Value,
) -> actix_web::dev::ServiceResponse {
    let request = actix_test::TestRequest::post()
        .uri("/users")
        .insert_header(bearer())
        .set_json(body)
        .to_request();
    actix_test::call_service(app, request).await
}

#[actix_web::test]
async fn requests_without_token_are_unauthorised() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/users").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        value.get("code").and_then(Value::as_str),
        Some("unauthorized")
    );
}

#[actix_web::test]
async fn requests_with_unknown_token_are_unauthorised() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .insert_header((AUTHORIZATION, "Bearer nope"))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn health_probes_skip_authentication() {
    let deps = dependencies();
    deps.health_state.mark_ready();
    let app = actix_test::init_service(build_app(deps)).await;

    for uri in ["/health/live", "/health/ready"] {
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(uri).to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn root_answers_behind_authentication() {
    let app = actix_test::init_service(build_app(dependencies())).await;

    let anonymous = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/").to_request(),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let authenticated = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(authenticated.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(authenticated).await;
    assert_eq!(body, Value::String("I am root".to_owned()));
}

#[actix_web::test]
async fn malformed_json_body_uses_the_error_envelope() {
    let app = actix_test::init_service(build_app(dependencies())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users")
            .insert_header(bearer())
            .insert_header((CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("invalid_request")
    );
}

#[actix_web::test]
async fn non_numeric_id_uses_the_error_envelope() {
    let app = actix_test::init_service(build_app(dependencies())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users/not-a-number")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("code").and_then(Value::as_str), Some("not_found"));
}

#[actix_web::test]
async fn failure_route_reports_a_redacted_server_error() {
    let app = actix_test::init_service(build_app(dependencies())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/throw")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("Internal server error")
    );
}

#[actix_web::test]
async fn create_then_fetch_round_trip() {
    let app = actix_test::init_service(build_app(dependencies())).await;

    let created = create_user(&app, &user_json("alice", "a@x.com", 30)).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(created).await;
    assert_eq!(
        body,
        json!({"id": 1, "username": "alice", "email": "a@x.com", "age": 30})
    );

    let fetched = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users/1")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched_body: Value = actix_test::read_body_json(fetched).await;
    assert_eq!(fetched_body, body);
}

#[actix_web::test]
async fn duplicate_username_with_different_case_conflicts() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    create_user(&app, &user_json("alice", "a@x.com", 30)).await;

    let response = create_user(&app, &user_json("Alice", "other@x.com", 20)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn update_moves_the_username_index_entry() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    create_user(&app, &user_json("alice", "a@x.com", 30)).await;

    let update = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/users/1")
            .insert_header(bearer())
            .set_json(user_json("alice2", "a@x.com", 31))
            .to_request(),
    )
    .await;
    assert_eq!(update.status(), StatusCode::OK);

    let old_name = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users/by-username/alice")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(old_name.status(), StatusCode::NOT_FOUND);

    let new_name = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users/by-username/alice2")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(new_name.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(new_name).await;
    assert_eq!(
        body,
        json!({"id": 1, "username": "alice2", "email": "a@x.com", "age": 31})
    );
}

#[actix_web::test]
async fn updating_a_user_with_its_own_username_succeeds() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    create_user(&app, &user_json("alice", "a@x.com", 30)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/users/1")
            .insert_header(bearer())
            .set_json(user_json("alice", "a@x.com", 30))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn deleted_ids_are_not_reassigned() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    create_user(&app, &user_json("alice", "a@x.com", 30)).await;

    let deleted = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri("/users/1")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let recreated = create_user(&app, &user_json("bob", "b@x.com", 25)).await;
    assert_eq!(recreated.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(recreated).await;
    assert_eq!(body.get("id").and_then(Value::as_u64), Some(2));
}

#[actix_web::test]
async fn missing_user_is_not_found_on_an_empty_store() {
    let app = actix_test::init_service(build_app(dependencies())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users/999")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn invalid_payloads_never_reach_the_store() {
    let app = actix_test::init_service(build_app(dependencies())).await;

    let rejected = create_user(&app, &user_json("alice", "not-an-address", 30)).await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let listed = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(listed).await;
    assert_eq!(body, json!([]), "failed validation must not create records");
}
