use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{OriginalUri, Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use paydesk_client::http::HttpClient;
use paydesk_client::types::{
    FundRequestFilter, KycDocument, TransactionType, TransferRequest, UserTab,
};
use paydesk_client::{
    AdminClient, ApiError, ClientConfig, LoadOutcome, NotificationStatus, PanelPhase,
    PermissionPanel, RecordingNotifier, SaveOutcome, Session,
};
use paydesk_core::{Amount, UserId};
use paydesk_permissions::{ModuleKey, PermissionToken};
use serde_json::{Value, json};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeState {
    base_url: String,
    permissions: HashMap<String, Vec<String>>,
    /// `METHOD path?query` of every request that reached the server.
    calls: Vec<String>,
    /// Last JSON body received per path.
    bodies: HashMap<String, Value>,
}

type Shared = Arc<Mutex<FakeState>>;

struct TestServer {
    base_url: String,
    state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        paydesk_observability::init();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let state: Shared = Arc::new(Mutex::new(FakeState {
            base_url: base_url.clone(),
            ..FakeState::default()
        }));
        let app = router(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone()).with_token(TOKEN)
    }

    fn client(&self) -> (AdminClient, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let client = AdminClient::from_config(&self.config(), notifier.clone()).unwrap();
        (client, notifier)
    }

    fn seed_permissions(&self, user_id: &str, tokens: &[&str]) {
        self.state.lock().unwrap().permissions.insert(
            user_id.to_string(),
            tokens.iter().map(|t| t.to_string()).collect(),
        );
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn body(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().bodies.get(path).cloned()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/user/fetch", post(fetch_permissions))
        .route("/api/user/update-permissions", post(update_permissions))
        .route("/api/admin/user/info/:id", post(user_info))
        .route("/api/admin/new-fund", post(new_fund))
        .route("/api/admin/fetch-admin-funds", get(admin_funds))
        .route("/api/admin/fetch-admin-funds/:user_id", get(fund_requests))
        .route("/api/admin/update-fund-requests", post(record_body))
        .route("/api/admin/delete-fund", post(record_body))
        .route("/api/admin/users-list/:tab", get(users_list))
        .route("/api/admin/user/status/:id/:flag", get(|| async { Json(json!({})) }))
        .route("/api/admin/user/remarks", post(record_body))
        .route("/admin-send-creds", post(record_body))
        .route("/api/admin/file", post(kyc_file))
        .route("/api/admin/maintenance", get(|| async { "<html>down for maintenance</html>" }))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

async fn require_token(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_default();
    state
        .lock()
        .unwrap()
        .calls
        .push(format!("{} {}", req.method(), target));

    let expected = format!("Bearer {TOKEN}");
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthenticated." })),
        )
            .into_response();
    }
    next.run(req).await
}

async fn fetch_permissions(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let user_id = body["user_id"].as_str().unwrap_or_default().to_string();
    let state = state.lock().unwrap();
    match state.permissions.get(&user_id) {
        Some(pages) => Json(json!([{ "_id": format!("perm-{user_id}"), "allowed_pages": pages }])),
        None => Json(json!([])),
    }
}

async fn update_permissions(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let user_id = body["user_id"].as_str().unwrap_or_default().to_string();
    let pages: Vec<String> = body["allowed_pages"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    state.permissions.insert(user_id, pages);
    state.bodies.insert("/api/user/update-permissions".into(), body);
    Json(json!({ "message": "updated" }))
}

async fn user_info(Path(id): Path<String>) -> Response {
    if id != "42" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "" }))).into_response();
    }
    Json(json!({
        "data": {
            "id": 42,
            "first_name": "Meera",
            "last_name": "Iyer",
            "firm_name": "Iyer Telecom",
            "phone_number": "9800000042",
            "wallet": "1500.25"
        }
    }))
    .into_response()
}

async fn new_fund(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["mpin"] != "1234" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Invalid MPIN" })),
        )
            .into_response();
    }
    state
        .lock()
        .unwrap()
        .bodies
        .insert("/api/admin/new-fund".into(), body);
    Json(json!({ "message": "ok" })).into_response()
}

async fn admin_funds() -> Json<Value> {
    let rows: Vec<Value> = (1..=12)
        .map(|n| json!({ "transaction_id": format!("TXN{n}"), "amount": n * 100, "user_id": n }))
        .collect();
    Json(json!({ "data": rows }))
}

async fn fund_requests(Path(user_id): Path<String>) -> Json<Value> {
    Json(json!({
        "current_page": 1,
        "last_page": "1",
        "next_page_url": null,
        "prev_page_url": null,
        "data": [{
            "id": 7,
            "user_id": user_id,
            "amount": 2500,
            "status": "pending",
            "transaction_id": "UTR991"
        }]
    }))
}

async fn record_body(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .lock()
        .unwrap()
        .bodies
        .insert(uri.path().to_string(), body);
    Json(json!({ "message": "ok" }))
}

async fn users_list(
    State(state): State<Shared>,
    Path(tab): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let base_url = state.lock().unwrap().base_url.clone();
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let next = (page == 1).then(|| format!("{base_url}/api/admin/users-list/{tab}?page=2"));
    Json(json!({
        "current_page": page,
        "last_page": 2,
        "next_page_url": next,
        "prev_page_url": null,
        "data": [{
            "id": page * 10,
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "asha@example.com",
            "is_active": "1",
            "pan_photo": "kyc/pan/10.jpeg"
        }]
    }))
}

async fn kyc_file(Json(body): Json<Value>) -> Response {
    match body["address"].as_str() {
        Some(address) if !address.is_empty() => format!("image:{address}").into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

#[tokio::test]
async fn permissions_load_edit_save_round_trip() {
    let srv = TestServer::spawn().await;
    srv.seed_permissions("42", &["basic.dashboard", "aeps.transaction", "settings.beta"]);

    let (client, notifier) = srv.client();
    let panel = PermissionPanel::for_client(client, &srv.config()).unwrap();

    assert_eq!(
        panel.load_permissions(&uid("42")).await.unwrap(),
        LoadOutcome::Loaded { tokens: 3 }
    );
    let loaded = panel.snapshot().unwrap();
    assert_eq!(loaded.record_id().map(|r| r.as_str()), Some("perm-42"));
    assert!(loaded.selection(ModuleKey::Aeps).contains(&"aeps.transaction".into()));
    assert_eq!(loaded.unclassified(), &[PermissionToken::from("settings.beta")]);

    assert_eq!(panel.check(ModuleKey::Dmt, "dmt.send").unwrap(), 1);
    assert_eq!(panel.phase(), PanelPhase::Editing);

    let outcome = panel.save().await.unwrap();
    assert_eq!(
        outcome,
        SaveOutcome {
            tokens: 4,
            reloaded: true
        }
    );
    assert_eq!(panel.phase(), PanelPhase::Saved);

    let sent = srv.body("/api/user/update-permissions").unwrap();
    assert_eq!(sent["user_id"], "42");
    assert_eq!(
        sent["allowed_pages"],
        json!(["basic.dashboard", "aeps.transaction", "dmt.send", "settings.beta"])
    );
    assert_eq!(
        notifier.last().unwrap().description,
        "User permissions were updated!"
    );
    assert!(panel.snapshot().unwrap().selection(ModuleKey::Dmt).contains(&"dmt.send".into()));
}

#[tokio::test]
async fn empty_fetch_result_loads_as_no_permissions() {
    let srv = TestServer::spawn().await;
    let (client, notifier) = srv.client();
    let panel = PermissionPanel::for_client(client, &srv.config()).unwrap();

    assert_eq!(panel.load_permissions(&uid("77")).await.unwrap(), LoadOutcome::Empty);
    let state = panel.snapshot().unwrap();
    assert_eq!(state.total_checked(), 0);
    assert!(state.record_id().is_none());
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn unauthorized_response_expires_the_session_once() {
    let srv = TestServer::spawn().await;
    srv.seed_permissions("42", &["aeps.transaction"]);

    let hook_ran = Arc::new(AtomicBool::new(false));
    let flag = hook_ran.clone();
    let session = Arc::new(
        Session::new(Some("stale-token".into()))
            .with_expiry_hook(move || flag.store(true, Ordering::SeqCst)),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let client = AdminClient::new(&srv.config(), session.clone(), notifier.clone()).unwrap();
    let panel = PermissionPanel::for_client(client.clone(), &srv.config()).unwrap();

    let err = panel.load_permissions(&uid("42")).await.unwrap_err();
    assert_eq!(err, ApiError::AuthExpired);
    assert!(hook_ran.load(Ordering::SeqCst));
    assert!(session.is_expired());
    assert!(panel.snapshot().is_none());
    assert_eq!(panel.phase(), PanelPhase::Unloaded);

    let before = srv.calls().len();
    let err = client.recent_admin_funds().await.unwrap_err();
    assert_eq!(err, ApiError::AuthExpired);
    assert_eq!(srv.calls().len(), before, "no request after the session expired");
}

#[tokio::test]
async fn beneficiary_lookup_and_transfer() {
    let srv = TestServer::spawn().await;
    let (client, notifier) = srv.client();

    let info = client.verify_beneficiary(&uid("42")).await.unwrap();
    assert_eq!(info.name, "Meera Iyer");
    assert_eq!(info.wallet, Some(Amount::from_paise(150_025)));

    let err = client.verify_beneficiary(&uid("9")).await.unwrap_err();
    assert_eq!(err, ApiError::NotFound);
    let toast = notifier.last().unwrap();
    assert_eq!(toast.description, "User not found!");
    assert_eq!(toast.title.as_deref(), Some("Error while fetching user info"));

    let mut request = TransferRequest {
        beneficiary_id: uid("42"),
        amount: Amount::from_rupees(500),
        transaction_type: TransactionType::Transfer,
        remarks: String::new(),
        mpin: "0000".into(),
    };
    let err = client.transfer_funds(&request).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Backend {
            status: 422,
            message: Some("Invalid MPIN".into())
        }
    );
    let toast = notifier.last().unwrap();
    assert_eq!(toast.status, NotificationStatus::Error);
    assert_eq!(toast.description, "Invalid MPIN");
    assert_eq!(toast.title.as_deref(), Some("Error Occured"));

    request.mpin = "1234".into();
    client.transfer_funds(&request).await.unwrap();
    assert_eq!(notifier.last().unwrap().description, "Transaction successful!");
    let sent = srv.body("/api/admin/new-fund").unwrap();
    assert_eq!(sent["beneficiaryId"], "42");
    assert_eq!(sent["amount"], "500.00");
    assert_eq!(sent["transactionType"], "transfer");
}

#[tokio::test]
async fn reversal_without_remarks_never_reaches_the_backend() {
    let srv = TestServer::spawn().await;
    let (client, _) = srv.client();

    let request = TransferRequest {
        beneficiary_id: uid("42"),
        amount: Amount::from_rupees(10),
        transaction_type: TransactionType::Reversal,
        remarks: " ".into(),
        mpin: "1234".into(),
    };
    let err = client.transfer_funds(&request).await.unwrap_err();
    assert_eq!(err, ApiError::validation("Remarks are mandatory"));
    assert!(srv.calls().is_empty());
}

#[tokio::test]
async fn recent_transfers_are_capped_at_ten() {
    let srv = TestServer::spawn().await;
    let (client, _) = srv.client();

    let rows = client.recent_admin_funds().await.unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].transaction_id.as_deref(), Some("TXN1"));
}

#[tokio::test]
async fn fund_request_queue_actions() {
    let srv = TestServer::spawn().await;
    let (client, notifier) = srv.client();

    let filter = FundRequestFilter {
        user_id: Some(uid("42")),
        from: NaiveDate::from_ymd_opt(2024, 3, 1),
        to: NaiveDate::from_ymd_opt(2024, 3, 31),
    };
    let page = client.list_fund_requests(&filter, None).await.unwrap();
    assert_eq!(page.last_page, 1);
    assert!(!page.has_next());
    assert!(
        srv.calls()
            .contains(&"GET /api/admin/fetch-admin-funds/42?from=2024-03-01&to=2024-03-31".to_string())
    );

    let request = &page.data[0];
    assert!(request.is_pending());

    client.approve_fund_request(request).await.unwrap();
    assert_eq!(
        srv.body("/api/admin/update-fund-requests").unwrap(),
        json!({ "id": "7", "beneficiaryId": "42", "status": "approved", "amount": 2500 })
    );
    assert_eq!(notifier.last().unwrap().description, "Status Updated");

    client.decline_fund_request(request, "slip mismatch").await.unwrap();
    let declined = srv.body("/api/admin/update-fund-requests").unwrap();
    assert_eq!(declined["status"], "declined");
    assert_eq!(declined["amount"], 0);
    assert_eq!(declined["remarks"], "slip mismatch");

    client.delete_fund_request(request).await.unwrap();
    assert_eq!(srv.body("/api/admin/delete-fund").unwrap(), json!({ "fundId": "7" }));
    assert_eq!(notifier.last().unwrap().description, "Request Deleted");
}

#[tokio::test]
async fn user_management_calls() {
    let srv = TestServer::spawn().await;
    let (client, notifier) = srv.client();

    let first = client.list_users(UserTab::Retailer, "asha", None).await.unwrap();
    assert!(
        srv.calls()
            .contains(&"GET /api/admin/users-list/retailer?search=asha&page=1".to_string())
    );
    assert_eq!(first.data[0].full_name(), "Asha Rao");
    assert!(first.data[0].is_active);

    let next_link = first.next_page_url.clone().unwrap();
    let second = client
        .list_users(UserTab::Retailer, "ignored", Some(&next_link))
        .await
        .unwrap();
    assert_eq!(second.current_page, 2);
    assert!(!second.has_next());

    let user = &first.data[0];
    client.change_user_status(&user.id, false).await.unwrap();
    assert!(srv.calls().contains(&"GET /api/admin/user/status/10/0".to_string()));

    client.save_remarks(&user.id, "Documents pending").await.unwrap();
    assert_eq!(
        srv.body("/api/admin/user/remarks").unwrap(),
        json!({ "userId": "10", "remarks": "Documents pending" })
    );
    assert_eq!(notifier.last().unwrap().description, "Remarks Updated");
    client.remove_remarks(&user.id).await.unwrap();
    assert_eq!(srv.body("/api/admin/user/remarks").unwrap()["remarks"], " ");

    client
        .send_credentials("asha@example.com", "Asha Rao")
        .await
        .unwrap();
    assert_eq!(notifier.last().unwrap().description, "Credentials Sent!");

    let file = client
        .download_kyc_document(user, KycDocument::PanCard)
        .await
        .unwrap();
    assert_eq!(file.file_name, "PAN.jpeg");
    assert_eq!(file.bytes, b"image:kyc/pan/10.jpeg".to_vec());
}

#[tokio::test]
async fn non_json_success_body_is_a_parse_error() {
    let srv = TestServer::spawn().await;
    let http = HttpClient::new(
        reqwest::Client::new(),
        srv.base_url.clone(),
        Arc::new(Session::new(Some(TOKEN.into()))),
    );

    let err = http
        .get_json::<Value>("/api/admin/maintenance")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)), "{err:?}");
    assert!(!http.session().is_expired());
}
