// tests/api.rs
//
// End-to-end coverage of the HTTP contract, driven through warp's test
// harness against the real filter tree with a fresh store per test.

use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use warp::reply::Response;
use warp::Filter;

use solar_customer_api::config::AppConfig;
use solar_customer_api::routes::routes;
use solar_customer_api::services::db::{record_id, DocumentStore};
use solar_customer_api::services::mailer::Mailer;
use solar_customer_api::services::otp::OtpClient;

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        jwt_secret: "test-secret".to_string(),
        base_url: "http://localhost:8000".to_string(),
        upload_dir: std::env::temp_dir().join(format!("solar-api-test-{}", record_id())),
        mail_api_url: String::new(),
        mail_api_key: String::new(),
        mail_from: "noreply@example.com".to_string(),
        otp_api_url: "http://127.0.0.1:1".to_string(),
        otp_api_key: String::new(),
        assumptions: Default::default(),
    }
}

fn test_api(
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone + Send + Sync + 'static {
    let mailer = Arc::new(Mailer::new(&cfg));
    let otp = Arc::new(OtpClient::new(&cfg));
    routes(db, cfg, mailer, otp)
}

fn body_json(response: &warp::http::Response<bytes::Bytes>) -> Value {
    serde_json::from_slice(response.body()).expect("response body is JSON")
}

async fn register_and_login<F>(api: &F, email: &str) -> String
where
    F: Filter<Extract = (Response,), Error = Infallible> + Clone + Send + Sync + 'static,
{
    let response = warp::test::request()
        .method("POST")
        .path("/register")
        .json(&json!({
            "name": "Asha",
            "email": email,
            "tele": format!("+91{}", &record_id()[..10]),
            "password": "secret-pw",
        }))
        .reply(api)
        .await;
    assert_eq!(response.status(), 200, "register: {:?}", response.body());

    let response = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": email, "password": "secret-pw" }))
        .reply(api)
        .await;
    assert_eq!(response.status(), 200, "login: {:?}", response.body());
    body_json(&response)["token"]
        .as_str()
        .expect("login returns a token")
        .to_string()
}

fn quote_body() -> Value {
    json!({
        "connectionType": "Residential",
        "contractLoad": 5,
        "monthlyUnits": 300,
        "selectedCity": "Pune",
        "roofArea": 50,
        "areaUnit": "sq. m",
    })
}

#[tokio::test]
async fn register_then_login_issues_a_token() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn login_with_unknown_email_is_not_found() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));

    let response = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": "nobody@example.com", "password": "pw" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(body_json(&response)["message"], "User not Found");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": "asha@example.com", "password": "wrong" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn quote_endpoint_requires_a_bearer_token() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));

    let response = warp::test::request()
        .method("POST")
        .path("/calculate-solar-quote")
        .json(&quote_body())
        .reply(&api)
        .await;
    assert_eq!(response.status(), 401);

    let response = warp::test::request()
        .method("POST")
        .path("/calculate-solar-quote")
        .header("authorization", "Bearer not-a-real-token")
        .json(&quote_body())
        .reply(&api)
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn quote_calculation_matches_the_reference_scenario() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("POST")
        .path("/calculate-solar-quote")
        .header("authorization", format!("Bearer {}", token))
        .json(&quote_body())
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200, "{:?}", response.body());

    let body = body_json(&response);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Solar quote calculated successfully");

    let data = &body["data"];
    assert_eq!(data["systemSize"], 2.4);
    assert_eq!(data["numberOfPanels"], 7);
    assert_eq!(data["requiredRoofArea"], 11.2);
    assert_eq!(data["isRoofAreaSufficient"], true);
    assert_eq!(data["estimatedCost"], 96970);
    assert_eq!(data["annualSavings"], 8640);
    assert_eq!(data["paybackPeriod"], 11.2);
    assert_eq!(data["annualCarbonOffset"], 2520);
    assert_eq!(data["selectedCity"], "Pune");
    assert_eq!(data["connectionType"], "Residential");
    assert_eq!(data["areaUnit"], "sq. m");
}

#[tokio::test]
async fn missing_roof_area_is_reported_by_name() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let mut body = quote_body();
    body.as_object_mut().unwrap().remove("roofArea");

    let response = warp::test::request()
        .method("POST")
        .path("/calculate-solar-quote")
        .header("authorization", format!("Bearer {}", token))
        .json(&body)
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);

    let body = body_json(&response);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "All fields are required");
    assert_eq!(body["missingFields"], json!(["roofArea"]));
}

#[tokio::test]
async fn a_square_foot_roof_is_converted_before_the_sufficiency_check() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    // 100 sq. ft = 9.2903 sq. m, below the 11.2 sq. m the array needs.
    let mut body = quote_body();
    body["roofArea"] = json!(100);
    body["areaUnit"] = json!("sq. ft");

    let response = warp::test::request()
        .method("POST")
        .path("/calculate-solar-quote")
        .header("authorization", format!("Bearer {}", token))
        .json(&body)
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response)["data"]["isRoofAreaSufficient"], false);
}

#[tokio::test]
async fn negative_consumption_is_a_validation_error() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let mut body = quote_body();
    body["monthlyUnits"] = json!(-10);

    let response = warp::test::request()
        .method("POST")
        .path("/calculate-solar-quote")
        .header("authorization", format!("Bearer {}", token))
        .json(&body)
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body_json(&response)["success"], false);
}

#[tokio::test]
async fn quote_history_is_appended_in_order() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    for units in [300, 450] {
        let mut body = quote_body();
        body["monthlyUnits"] = json!(units);
        let response = warp::test::request()
            .method("POST")
            .path("/calculate-solar-quote")
            .header("authorization", format!("Bearer {}", token))
            .json(&body)
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = warp::test::request()
        .method("GET")
        .path("/solar-quotes")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);

    let body = body_json(&response);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["monthlyUnits"], 300.0);
    assert_eq!(history[1]["monthlyUnits"], 450.0);
    assert!(history[0]["createdAt"].is_string());
}

#[tokio::test]
async fn project_status_is_public_and_has_eight_steps() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));

    let response = warp::test::request()
        .method("GET")
        .path("/project-status")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);

    let steps = body_json(&response);
    let steps = steps.as_array().unwrap();
    assert_eq!(steps.len(), 8);
    assert_eq!(steps[0]["title"], "Solar Proposal Finalised");
    assert_eq!(steps[7]["status"], "pending");
}

#[tokio::test]
async fn book_call_reports_missing_fields() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));

    let response = warp::test::request()
        .method("POST")
        .path("/book-call")
        .json(&json!({ "name": "Asha", "phone": "+911234567890" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);

    let body = body_json(&response);
    let missing = body["missingFields"].as_array().unwrap();
    assert!(missing.contains(&json!("email")));
    assert!(missing.contains(&json!("scheduleDate")));
    assert!(!missing.contains(&json!("name")));
}

#[tokio::test]
async fn book_call_stores_a_complete_booking() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db.clone(), Arc::new(test_config()));

    let response = warp::test::request()
        .method("POST")
        .path("/book-call")
        .json(&json!({
            "name": "Asha",
            "phone": "+911234567890",
            "email": "asha@example.com",
            "address": "12 MG Road",
            "landmark": "Near temple",
            "solarSystemSize": "3 kW",
            "scheduleDate": "2026-09-01T10:00:00Z",
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200, "{:?}", response.body());
    assert_eq!(body_json(&response)["message"], "Call booked successfully");
    assert_eq!(db.booked_call_count().await, 1);
}

#[tokio::test]
async fn loan_application_round_trips() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("POST")
        .path("/loan")
        .header("authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": "Asha",
            "phone": "+911234567890",
            "email": "asha@example.com",
            "address": "12 MG Road",
            "landmark": "Near temple",
            "solarSystemSize": "3 kW",
            "occupation": "Accountant",
            "annualincome": "600000",
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200, "{:?}", response.body());

    let response = warp::test::request()
        .method("GET")
        .path("/loan/details")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response)["data"]["occupation"], "Accountant");

    let response = warp::test::request()
        .method("PUT")
        .path("/loan/details")
        .header("authorization", format!("Bearer {}", token))
        .json(&json!({ "occupation": "Engineer" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"]["occupation"], "Engineer");
    assert_eq!(body["data"]["address"], "12 MG Road");

    // No documents uploaded yet.
    let response = warp::test::request()
        .method("GET")
        .path("/loan/documents")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn loan_application_lists_every_missing_field() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("POST")
        .path("/loan")
        .header("authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Asha" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);

    let body = body_json(&response);
    let missing = body["missingFields"].as_array().unwrap();
    assert_eq!(missing.len(), 7);
    assert!(missing.contains(&json!("annualincome")));
}

#[tokio::test]
async fn password_reset_rejects_wrong_and_accepts_right_codes() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db.clone(), Arc::new(test_config()));
    register_and_login(&api, "asha@example.com").await;

    // Seed the reset code directly; the mail vendor is not under test.
    let mut user = db
        .find_user_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    user.reset_code = Some("123456".to_string());
    user.reset_code_expiry = Some(chrono::Utc::now() + chrono::Duration::minutes(30));
    db.update_user(&user).await.unwrap();

    let response = warp::test::request()
        .method("POST")
        .path("/reset-password")
        .json(&json!({
            "email": "asha@example.com",
            "resetCode": "999999",
            "newPassword": "new-pw",
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body_json(&response)["message"], "Invalid reset code");

    let response = warp::test::request()
        .method("POST")
        .path("/reset-password")
        .json(&json!({
            "email": "asha@example.com",
            "resetCode": "123456",
            "newPassword": "new-pw",
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);

    let response = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": "asha@example.com", "password": "new-pw" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn expired_reset_codes_are_rejected() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db.clone(), Arc::new(test_config()));
    register_and_login(&api, "asha@example.com").await;

    let mut user = db
        .find_user_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    user.reset_code = Some("123456".to_string());
    user.reset_code_expiry = Some(chrono::Utc::now() - chrono::Duration::minutes(1));
    db.update_user(&user).await.unwrap();

    let response = warp::test::request()
        .method("POST")
        .path("/reset-password")
        .json(&json!({
            "email": "asha@example.com",
            "resetCode": "123456",
            "newPassword": "new-pw",
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body_json(&response)["message"], "Reset code has expired");
}

#[tokio::test]
async fn profile_fetch_and_partial_update() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("GET")
        .path("/user")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["name"], "Asha");
    assert_eq!(body["email"], "asha@example.com");

    let response = warp::test::request()
        .method("PUT")
        .path("/user")
        .header("authorization", format!("Bearer {}", token))
        .json(&json!({ "name": "Asha G" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);

    let response = warp::test::request()
        .method("GET")
        .path("/user")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    let body = body_json(&response);
    assert_eq!(body["name"], "Asha G");
    assert_eq!(body["email"], "asha@example.com");
}

fn multipart_body(boundary: &str, document_type: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\ncontent-disposition: form-data; name=\"files\"; filename=\"pan.pdf\"\r\ncontent-type: application/pdf\r\n\r\n%PDF-1.4 test content\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    if let Some(tag) = document_type {
        body.extend_from_slice(
            format!(
                "--{b}\r\ncontent-disposition: form-data; name=\"documentType\"\r\n\r\n{tag}\r\n",
                b = boundary,
                tag = tag
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{b}--\r\n", b = boundary).as_bytes());
    body
}

#[tokio::test]
async fn uploaded_files_can_be_listed_filtered_and_deleted() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let boundary = "----solarapitestboundary";
    let response = warp::test::request()
        .method("POST")
        .path("/upload")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(multipart_body(boundary, Some("Pancard")))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200, "{:?}", response.body());
    let body = body_json(&response);
    assert_eq!(body["message"], "Successfully uploaded 1 file(s)");

    let response = warp::test::request()
        .method("GET")
        .path("/files")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"][0]["originalName"], "pan.pdf");

    let response = warp::test::request()
        .method("GET")
        .path("/files/type/pdf")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let file_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let response = warp::test::request()
        .method("GET")
        .path("/files/document-type/Pancard")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response)["data"][0]["documentType"], "Pancard");

    let response = warp::test::request()
        .method("DELETE")
        .path(&format!("/files/{}", file_id))
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);

    let response = warp::test::request()
        .method("GET")
        .path("/files/type/pdf")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response)["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unsupported_upload_types_are_rejected() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let boundary = "----solarapitestboundary";
    let body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"files\"; filename=\"page.html\"\r\ncontent-type: text/html\r\n\r\n<html></html>\r\n--{b}--\r\n",
        b = boundary
    );
    let response = warp::test::request()
        .method("POST")
        .path("/upload")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(body)
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn loan_documents_accept_uploads() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let boundary = "----solarapitestboundary";
    let response = warp::test::request()
        .method("POST")
        .path("/loan/documents")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(multipart_body(boundary, Some("itr")))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200, "{:?}", response.body());

    let response = warp::test::request()
        .method("GET")
        .path("/loan/documents")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["data"][0]["documentType"], "itr");
}

#[tokio::test]
async fn file_listing_for_a_user_without_uploads_is_not_found() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    let token = register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("GET")
        .path("/files")
        .header("authorization", format!("Bearer {}", token))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(
        body_json(&response)["message"],
        "No files found for this user"
    );
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let db = Arc::new(DocumentStore::new());
    let api = test_api(db, Arc::new(test_config()));
    register_and_login(&api, "asha@example.com").await;

    let response = warp::test::request()
        .method("POST")
        .path("/register")
        .json(&json!({
            "name": "Other",
            "email": "asha@example.com",
            "tele": "+919999999999",
            "password": "pw",
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);
}
