use chrono::{Duration as ChronoDuration, Utc};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Profile {
    username: String,
    role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategorySpend {
    category: String,
    spent: f64,
    budget: Option<f64>,
    progress: f64,
    over_budget: bool,
}

#[derive(Debug, Deserialize)]
struct HomeSummary {
    categories: Vec<CategorySpend>,
}

#[derive(Debug, Deserialize)]
struct Expense {
    id: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct LoginCounts {
    labels: Vec<String>,
    counts: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisplayName {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Analytics {
    logins: LoginCounts,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

fn unique_data_path() -> String {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "expense_tracker_http_{}_{}.json",
        std::process::id(),
        unique_suffix()
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/session")).send().await {
            if resp.status() == StatusCode::UNAUTHORIZED || resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_expense_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn register_user(client: &Client, base_url: &str) -> String {
    let username = format!("user{}", unique_suffix());
    let response = client
        .post(format!("{base_url}/api/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret1",
            "confirmPassword": "secret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    username
}

async fn login(client: &Client, base_url: &str, identifier: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/login"))
        .json(&json!({ "identifier": identifier, "password": password }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_requires_login() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/logout", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/api/expenses", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn http_login_distinguishes_wrong_password() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let username = register_user(&client, &server.base_url).await;

    let wrong = login(&client, &server.base_url, &username, "nope-nope").await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.text().await.unwrap(), "Incorrect password. Please try again.");

    let missing = login(&client, &server.base_url, "nobody-here", "secret1").await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        missing.text().await.unwrap(),
        "User not found. Please check your credentials."
    );

    let email = format!("{}@EXAMPLE.com", username.to_uppercase());
    let ok = login(&client, &server.base_url, &email, "secret1").await;
    assert!(ok.status().is_success());
    let profile: Profile = ok.json().await.unwrap();
    assert_eq!(profile.username, username);
    assert_eq!(profile.role, "user");
}

#[tokio::test]
async fn http_home_reports_budget_progress() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let username = register_user(&client, &server.base_url).await;
    assert!(login(&client, &server.base_url, &username, "secret1").await.status().is_success());

    let category = format!("Cat{}", unique_suffix());
    let response = client
        .post(format!("{}/api/categories", server.base_url))
        .json(&json!({ "name": category }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/api/expenses", server.base_url))
        .json(&json!({ "amount": 100.0, "category": category, "paymentMethod": "Cash" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let now = Utc::now();
    let budget = json!({
        "category": category,
        "amount": 500.0,
        "startDate": (now - ChronoDuration::days(1)).to_rfc3339(),
        "endDate": (now + ChronoDuration::days(1)).to_rfc3339(),
    });
    let response = client
        .post(format!("{}/api/budgets", server.base_url))
        .json(&budget)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let duplicate = client
        .post(format!("{}/api/budgets", server.base_url))
        .json(&budget)
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let home: HomeSummary = client
        .get(format!("{}/api/home", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let spend = home
        .categories
        .iter()
        .find(|c| c.category == category)
        .expect("missing category");
    assert_eq!(spend.spent, 100.0);
    assert_eq!(spend.budget, Some(500.0));
    assert_eq!(spend.progress, 0.2);
    assert!(!spend.over_budget);

    let response = client
        .delete(format!("{}/api/categories/{}", server.base_url, category))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let expenses: Vec<Expense> = client
        .get(format!("{}/api/expenses", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(expenses.iter().all(|e| e.category != category && !e.id.is_empty()));
}

#[tokio::test]
async fn http_admin_sees_login_analytics() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let username = register_user(&client, &server.base_url).await;

    assert!(login(&client, &server.base_url, &username, "secret1").await.status().is_success());
    let forbidden = client
        .get(format!("{}/api/admin/analytics", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    assert!(login(&client, &server.base_url, "admin1", "admin1Pass").await.status().is_success());
    let analytics: Analytics = client
        .get(format!("{}/api/admin/analytics", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(analytics.logins.labels.len(), 5);
    assert!(analytics.logins.counts[4] >= 2);

    let users: Vec<Profile> = client
        .get(format!("{}/api/admin/users", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(users.iter().any(|u| u.username == username));
}

#[tokio::test]
async fn http_partial_bodies_get_field_messages() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let username = format!("user{}", unique_suffix());
    let response = client
        .post(format!("{}/api/register", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "All fields are required");

    let response = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "identifier": username }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "Please enter both username/email and password"
    );

    let response = client
        .post(format!("{}/api/register", server.base_url))
        .header("content-type", "application/json")
        .body("{\"username\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let username = register_user(&client, &server.base_url).await;
    assert!(login(&client, &server.base_url, &username, "secret1").await.status().is_success());
    let response = client
        .post(format!("{}/api/expenses", server.base_url))
        .json(&json!({ "category": "Food", "paymentMethod": "Cash" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Amount is required");
}

#[tokio::test]
async fn http_display_name_defaults_then_saves() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let url = format!("{}/api/profile/display-name", server.base_url);

    assert!(login(&client, &server.base_url, "admin1", "admin1Pass").await.status().is_success());
    let response = client
        .put(&url)
        .json(&json!({ "displayName": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(&url)
        .json(&json!({ "displayName": "Budget Boss" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let shown: DisplayName = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(shown.display_name, "Budget Boss");

    let session: Profile = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session.username, "admin1");
}
