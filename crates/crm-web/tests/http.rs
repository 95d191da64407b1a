use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use crm_core::{AuthConfig, AuthService};
use crm_web::session::SESSION_COOKIE;
use crm_web::AppState;
use database::Database;
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "test-key";

async fn test_app() -> Router {
    test_app_with_auth().await.0
}

/// The app plus its auth service, for flows that need a reset token.
async fn test_app_with_auth() -> (Router, AuthService) {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    let config = AuthConfig {
        password_iterations: 1_000,
        ..AuthConfig::default()
    };
    let auth = AuthService::new(db.clone(), config);
    let app = crm_web::app(AppState::new(db, auth.clone(), API_KEY));
    (app, auth)
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn api_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("apikey", API_KEY);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn page_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Sign up through the API and return the session token.
async fn sign_up(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "email": email,
                "password": "secreto123",
                "full_name": "Ana Pérez",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn cookie(token: &str) -> String {
    format!("{}={}", SESSION_COOKIE, token)
}

/// Send an API request and return status and JSON body (`Null` when empty).
async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(api_request(method, uri, token, body))
        .await
        .unwrap();
    let status = response.status();
    let text = body_text(response).await;
    let json = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, json)
}

async fn create_client(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/clients",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;

    let response = app.oneshot(page_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_api_requires_key() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/api/clients")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid API key");
}

#[tokio::test]
async fn test_api_requires_session() {
    let app = test_app().await;

    let response = app
        .oneshot(api_request("GET", "/api/clients", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Usuario no autenticado");
}

#[tokio::test]
async fn test_api_client_crud() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({ "name": "Client A", "status": "prospect" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "prospect");

    let response = app
        .clone()
        .oneshot(api_request(
            "PATCH",
            &format!("/api/clients/{}", id),
            Some(&token),
            Some(json!({ "status": "active" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "active");

    let response = app
        .clone()
        .oneshot(api_request("GET", "/api/clients", Some(&token), None))
        .await
        .unwrap();
    let clients = body_json(response).await;
    assert_eq!(clients.as_array().unwrap().len(), 1);
    assert_eq!(clients[0]["name"], "Client A");

    let response = app
        .clone()
        .oneshot(api_request(
            "DELETE",
            &format!("/api/clients/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(api_request(
            "GET",
            &format!("/api/clients/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_validation_error() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;

    let response = app
        .oneshot(api_request(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({ "name": "A" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(
        body["fields"]["name"],
        "El nombre debe tener al menos 2 caracteres"
    );
}

#[tokio::test]
async fn test_api_stats() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({ "name": "Client A" })),
        ))
        .await
        .unwrap();
    let client_id = body_json(response).await["id"].as_str().unwrap().to_string();

    for (title, value, stage) in [("Deal A", 1000.0, "closed_won"), ("Deal B", 500.0, "prospect")] {
        let response = app
            .clone()
            .oneshot(api_request(
                "POST",
                "/api/opportunities",
                Some(&token),
                Some(json!({
                    "client_id": client_id,
                    "title": title,
                    "value": value,
                    "stage": stage,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(api_request("GET", "/api/stats", Some(&token), None))
        .await
        .unwrap();
    let stats = body_json(response).await;
    assert_eq!(stats["total_opportunities"], 2);
    assert_eq!(stats["total_value"], 1500.0);
    assert_eq!(stats["won_opportunities"], 1);
    assert_eq!(stats["conversion_rate"], 50);
}

#[tokio::test]
async fn test_api_records_are_per_user() {
    let app = test_app().await;
    let owner = sign_up(&app, "ana@example.com").await;
    let other = sign_up(&app, "luis@example.com").await;

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/clients",
            Some(&owner),
            Some(json!({ "name": "Client A" })),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(api_request(
            "GET",
            &format!("/api/clients/{}", id),
            Some(&other),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(api_request("GET", "/api/clients", Some(&other), None))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_sign_in_with_bad_credentials() {
    let app = test_app().await;
    sign_up(&app, "ana@example.com").await;

    let response = app
        .oneshot(api_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "ana@example.com", "password": "incorrecta" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid login credentials");
}

#[tokio::test]
async fn test_root_redirects_to_sign_in() {
    let app = test_app().await;

    let response = app.oneshot(page_request("/", None)).await.unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/signin");
}

#[tokio::test]
async fn test_dashboard_requires_session() {
    let app = test_app().await;

    let response = app
        .oneshot(page_request("/dashboard", Some("crm_session=bogus")))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/signin");
}

#[tokio::test]
async fn test_sign_in_form_sets_cookie() {
    let app = test_app().await;
    sign_up(&app, "ana@example.com").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/auth/signin",
            None,
            "email=ana%40example.com&password=secreto123",
        ))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/dashboard");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("crm_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let session = set_cookie.split(';').next().unwrap();
    let response = app
        .oneshot(page_request("/dashboard", Some(session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Total Clientes"));
    assert!(html.contains("Ana Pérez"));
}

#[tokio::test]
async fn test_sign_in_form_shows_bad_credentials() {
    let app = test_app().await;
    sign_up(&app, "ana@example.com").await;

    let response = app
        .oneshot(form_request(
            "/auth/signin",
            None,
            "email=ana%40example.com&password=incorrecta",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(response).await.contains("Invalid login credentials"));
}

#[tokio::test]
async fn test_client_form_rerenders_with_errors() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/dashboard/clients/new",
            Some(&cookie(&token)),
            "name=A&status=prospect",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("El nombre debe tener al menos 2 caracteres"));

    let response = app
        .oneshot(api_request("GET", "/api/clients", Some(&token), None))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_client_form_creates_and_lists() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    let session = cookie(&token);

    let response = app
        .clone()
        .oneshot(form_request(
            "/dashboard/clients/new",
            Some(&session),
            "name=Acme+Corp&email=&phone=&company=Acme&position=&notes=&status=active",
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/dashboard/clients");

    let response = app
        .oneshot(page_request("/dashboard/clients?status=active", Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Acme Corp"));
    assert!(html.contains("1 de 1 clientes"));
}

#[tokio::test]
async fn test_other_users_client_page_is_not_found() {
    let app = test_app().await;
    let owner = sign_up(&app, "ana@example.com").await;
    let other = sign_up(&app, "luis@example.com").await;

    let response = app
        .clone()
        .oneshot(api_request(
            "POST",
            "/api/clients",
            Some(&owner),
            Some(json!({ "name": "Client A" })),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(page_request(
            &format!("/dashboard/clients/{}", id),
            Some(&cookie(&other)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    let session = cookie(&token);

    let response = app
        .clone()
        .oneshot(form_request("/auth/signout", Some(&session), ""))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/signin");

    let response = app
        .oneshot(page_request("/dashboard", Some(&session)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/auth/signin");
}

#[tokio::test]
async fn test_api_unknown_client_reference_is_not_found() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/opportunities",
        Some(&token),
        Some(json!({ "client_id": "missing", "title": "Huérfana" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Client"));

    let client_id = create_client(&app, &token, "Acme").await;
    let (_, created) = call(
        &app,
        "POST",
        "/api/opportunities",
        Some(&token),
        Some(json!({ "client_id": client_id, "title": "Contrato" })),
    )
    .await;
    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/api/opportunities/{}", created["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({ "client_id": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_cannot_reference_other_users_client() {
    let app = test_app().await;
    let owner = sign_up(&app, "ana@example.com").await;
    let other = sign_up(&app, "luis@example.com").await;
    let client_id = create_client(&app, &owner, "Acme").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/interactions",
        Some(&other),
        Some(json!({
            "client_id": client_id,
            "type": "note",
            "subject": "Intrusa",
            "date": "2024-05-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, interactions) = call(&app, "GET", "/api/interactions", Some(&other), None).await;
    assert!(interactions.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_opportunity_crud() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    let client_id = create_client(&app, &token, "Acme").await;

    let (status, created) = call(
        &app,
        "POST",
        "/api/opportunities",
        Some(&token),
        Some(json!({ "client_id": client_id, "title": "Contrato anual", "value": 1200.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["stage"], "prospect");
    assert_eq!(created["client"]["name"], "Acme");
    let uri = format!("/api/opportunities/{}", created["id"].as_str().unwrap());

    let (status, updated) = call(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "stage": "negotiation", "probability": 70 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stage"], "negotiation");
    assert_eq!(updated["probability"], 70);
    assert_eq!(updated["title"], "Contrato anual");

    let (_, listed) = call(&app, "GET", "/api/opportunities", Some(&token), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_task_crud() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    let client_id = create_client(&app, &token, "Acme").await;

    let (status, created) = call(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({
            "client_id": client_id,
            "title": "Enviar propuesta",
            "due_date": "2024-07-01",
            "priority": "high",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["client"]["name"], "Acme");
    let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());

    let (status, updated) = call(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "status": "in_progress", "client_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["client_id"], Value::Null);
    assert_eq!(updated["priority"], "high");

    let (status, fetched) = call(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Enviar propuesta");

    let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, listed) = call(&app, "GET", "/api/tasks", Some(&token), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_interactions_by_client() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    let acme = create_client(&app, &token, "Acme").await;
    let globex = create_client(&app, &token, "Globex").await;

    for (client_id, subject) in [(&acme, "Llamada inicial"), (&globex, "Demo")] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/interactions",
            Some(&token),
            Some(json!({
                "client_id": client_id,
                "type": "call",
                "subject": subject,
                "date": "2024-05-01",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, all) = call(&app, "GET", "/api/interactions", Some(&token), None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, for_acme) = call(
        &app,
        "GET",
        &format!("/api/interactions?client_id={}", acme),
        Some(&token),
        None,
    )
    .await;
    let for_acme = for_acme.as_array().unwrap().clone();
    assert_eq!(for_acme.len(), 1);
    assert_eq!(for_acme[0]["subject"], "Llamada inicial");
    let uri = format!("/api/interactions/{}", for_acme[0]["id"].as_str().unwrap());

    let (status, updated) = call(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "type": "meeting", "subject": "Reunión inicial" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["type"], "meeting");
    assert_eq!(updated["subject"], "Reunión inicial");

    let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_profile_update_and_email_conflict() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    sign_up(&app, "luis@example.com").await;

    let (status, profile) = call(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ana@example.com");

    let (status, profile) = call(
        &app,
        "PATCH",
        "/api/profile",
        Some(&token),
        Some(json!({ "full_name": "Ana María" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["full_name"], "Ana María");

    let (status, body) = call(
        &app,
        "PATCH",
        "/api/profile",
        Some(&token),
        Some(json!({ "email": "luis@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_api_password_reset_flow() {
    let (app, auth) = test_app_with_auth().await;
    sign_up(&app, "ana@example.com").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "email": "ana@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // Unknown emails get the same answer.
    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "email": "nadie@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let token = auth
        .request_password_reset("ana@example.com")
        .await
        .unwrap()
        .unwrap();
    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/reset-password/confirm",
        None,
        Some(json!({
            "token": token,
            "password": "nueva-clave1",
            "confirm_password": "nueva-clave1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "ana@example.com", "password": "nueva-clave1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Tokens are single-use.
    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/reset-password/confirm",
        None,
        Some(json!({
            "token": token,
            "password": "otra-clave1",
            "confirm_password": "otra-clave1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["error"],
        "El enlace de recuperación no es válido o ha expirado"
    );
}

#[tokio::test]
async fn test_task_status_and_delete_actions_redirect() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    let session = cookie(&token);

    let (_, task) = call(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Llamar a Acme" })),
    )
    .await;
    let id = task["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/dashboard/tasks/{}/status", id),
            Some(&session),
            "status=completed",
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/dashboard/tasks");
    let (_, fetched) = call(&app, "GET", &format!("/api/tasks/{}", id), Some(&token), None).await;
    assert_eq!(fetched["status"], "completed");

    // Unknown ids and bad values still land on the list.
    let response = app
        .clone()
        .oneshot(form_request(
            "/dashboard/tasks/missing/status",
            Some(&session),
            "status=completed",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard/tasks");
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/dashboard/tasks/{}/status", id),
            Some(&session),
            "status=bogus",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard/tasks");
    let response = app
        .clone()
        .oneshot(form_request("/dashboard/tasks/missing/delete", Some(&session), ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard/tasks");

    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/dashboard/tasks/{}/delete", id),
            Some(&session),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard/tasks");
    let (status, _) = call(&app, "GET", &format!("/api/tasks/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clients_page_shows_status_summary() {
    let app = test_app().await;
    let token = sign_up(&app, "ana@example.com").await;
    create_client(&app, &token, "Acme").await;
    let (status, _) = call(
        &app,
        "POST",
        "/api/clients",
        Some(&token),
        Some(json!({ "name": "Globex", "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let response = app
        .oneshot(page_request("/dashboard/clients", Some(&cookie(&token))))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Prospectos"));
    assert!(html.contains("Inactivos"));
    assert!(html.contains("2 de 2 clientes"));
}
