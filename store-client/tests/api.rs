use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use store_client::board::{LikeAction, LikeBook};
use store_client::forms::{PostForm, SignupForm};
use store_client::models::Post;
use store_client::session::{Session, SessionStore};
use store_client::view_state::{StateCell, ViewState};
use store_client::{HttpOptions, StoreClient, StoreClientError};
use tempfile::TempDir;

#[derive(Default)]
struct FakeDb {
    posts: Vec<Value>,
    likes: HashMap<i64, i64>,
    like_calls: u32,
    signups: Vec<Value>,
}

type Db = Arc<Mutex<FakeDb>>;

fn post_json(id: i64, category: &str, title: &str) -> Value {
    json!({
        "id": id,
        "user_id": "kim",
        "category": category,
        "title": title,
        "content": format!("{title} body"),
        "like_count": 0,
        "comment_count": 0,
        "view_count": 3,
        "created_at": "2024-05-01 09:00:00"
    })
}

async fn login(Json(body): Json<Value>) -> Json<Value> {
    if body["user_id"] == "kim" && body["password"] == "secret1" {
        Json(json!({
            "success": true,
            "message": "",
            "user": {"user_id": "kim", "name": "Kim", "phone": "010-1234-5678", "store_name": "Kimbap Heaven"}
        }))
    } else {
        Json(json!({"success": false, "message": "아이디 또는 비밀번호가 틀렸습니다"}))
    }
}

async fn signup(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    let mut db = db.lock().expect("db lock");
    if body["user_id"] == "park01" {
        return Json(json!({"success": false, "message": "이미 존재하는 아이디입니다"}));
    }
    db.signups.push(body);
    Json(json!({"success": true, "message": "ok"}))
}

async fn post_list(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let db = db.lock().expect("db lock");
    // Как и настоящий сервер, сравнивает без учёта регистра.
    let posts: Vec<Value> = db
        .posts
        .iter()
        .filter(|p| match query.get("category") {
            Some(c) => p["category"].as_str().is_some_and(|pc| pc.eq_ignore_ascii_case(c)),
            None => true,
        })
        .cloned()
        .collect();
    Json(Value::Array(posts))
}

async fn post_detail(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let db = db.lock().expect("db lock");
    let id: i64 = query.get("id").and_then(|id| id.parse().ok()).unwrap_or(-1);
    db.posts
        .iter()
        .find(|p| p["id"] == id)
        .cloned()
        .map(|mut p| {
            p["like_count"] = json!(db.likes.get(&id).copied().unwrap_or(0));
            Json(p)
        })
        .ok_or((StatusCode::NOT_FOUND, Json(json!({"message": "no post"}))))
}

async fn post_insert(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    let mut db = db.lock().expect("db lock");
    let id = db.posts.len() as i64 + 1;
    let mut post = post_json(
        id,
        body["category"].as_str().unwrap_or_default(),
        body["title"].as_str().unwrap_or_default(),
    );
    post["user_id"] = body["user_id"].clone();
    post["content"] = body["content"].clone();
    db.posts.push(post);
    Json(json!({"success": true, "message": "ok", "id": id}))
}

async fn post_like(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    let mut db = db.lock().expect("db lock");
    let id = body["post_id"].as_i64().unwrap_or_default();
    db.like_calls += 1;
    if !db.posts.iter().any(|p| p["id"] == id) {
        return Json(json!({"success": false, "message": "게시글이 없습니다"}));
    }
    *db.likes.entry(id).or_default() += 1;
    Json(json!({"success": true, "message": "ok"}))
}

async fn post_unlike(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    let mut db = db.lock().expect("db lock");
    let id = body["post_id"].as_i64().unwrap_or_default();
    db.like_calls += 1;
    *db.likes.entry(id).or_default() -= 1;
    Json(json!({"success": true, "message": "ok"}))
}

async fn category_list() -> Json<Value> {
    Json(json!([]))
}

async fn recipe_detail() -> Json<Value> {
    Json(json!({"id": 1, "user_id": "kim", "name": "kimbap", "price": 4000}))
}

async fn ingredient_list() -> Json<Value> {
    Json(json!([
        {"id": 1, "recipe_id": 1, "name": "rice", "quantity": 200.0, "unit": "g", "cost": 600},
        {"id": 2, "recipe_id": 1, "name": "laver", "quantity": 1, "unit": "ea", "cost": 400}
    ]))
}

async fn margin_summary() -> Json<Value> {
    Json(json!([
        {"recipe_id": 1, "name": "kimbap", "price": 4000, "ingredient_cost": 1000},
        {"recipe_id": 2, "name": "special", "price": 0, "ingredient_cost": 500}
    ]))
}

async fn report_list() -> Json<Value> {
    Json(json!([
        {"id": 1, "user_id": "kim", "sale_date": "2024-05-01", "menu_name": "kimbap", "quantity": 10, "amount": 40000},
        {"id": 2, "user_id": "kim", "sale_date": "2024-05-02", "menu_name": "ramyeon", "quantity": 2, "amount": 10000}
    ]))
}

async fn broken() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "db down"})),
    )
}

async fn spawn_fake_server() -> (String, Db) {
    let db: Db = Arc::new(Mutex::new(FakeDb {
        posts: vec![
            post_json(1, "tip", "Cheap onions"),
            post_json(2, "market", "Selling fridge"),
            post_json(3, "Tip", "Upper-case category"),
        ],
        ..FakeDb::default()
    }));

    let app = Router::new()
        .route("/login.php", post(login))
        .route("/signup.php", post(signup))
        .route("/category_list.php", get(category_list))
        .route("/post_list.php", get(post_list))
        .route("/post_detail.php", get(post_detail))
        .route("/post_insert.php", post(post_insert))
        .route("/post_like.php", post(post_like))
        .route("/post_unlike.php", post(post_unlike))
        .route("/recipe_detail.php", get(recipe_detail))
        .route("/ingredient_list.php", get(ingredient_list))
        .route("/margin_summary.php", get(margin_summary))
        .route("/report_list.php", get(report_list))
        .route("/comment_list.php", get(broken))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });

    (format!("http://{addr}/"), db)
}

async fn logged_in_client() -> (StoreClient, Db) {
    let (base_url, db) = spawn_fake_server().await;
    let mut client = StoreClient::new(base_url, HttpOptions::default()).expect("client");
    client.login("kim", "secret1").await.expect("login must succeed");
    (client, db)
}

#[tokio::test]
async fn login_stores_login_id() {
    let (base_url, _db) = spawn_fake_server().await;
    let mut client = StoreClient::new(base_url, HttpOptions::default()).expect("client");

    let user = client.login(" kim ", "secret1").await.expect("login");
    assert_eq!(user.store_name, "Kimbap Heaven");
    assert_eq!(client.login_id(), Some("kim"));

    client.logout();
    assert!(matches!(client.recipes().await, Err(StoreClientError::Unauthorized)));
}

#[tokio::test]
async fn wrong_password_surfaces_server_message() {
    let (base_url, _db) = spawn_fake_server().await;
    let mut client = StoreClient::new(base_url, HttpOptions::default()).expect("client");

    let err = client.login("kim", "wrong").await.expect_err("login must fail");
    assert_eq!(err.user_message(), "아이디 또는 비밀번호가 틀렸습니다");
    assert!(client.login_id().is_none());
}

#[tokio::test]
async fn signup_validates_and_normalizes_business_number() {
    let (base_url, db) = spawn_fake_server().await;
    let client = StoreClient::new(base_url, HttpOptions::default()).expect("client");

    let mut form = SignupForm {
        user_id: "lee01".to_string(),
        password: "secret1".to_string(),
        name: "Lee".to_string(),
        phone: "010-9876-5432".to_string(),
        store_name: "Lee's Tteokbokki".to_string(),
        business_number: Some("123-45-67890".to_string()),
    };
    client.signup(&form).await.expect("signup");
    assert_eq!(db.lock().expect("db lock").signups[0]["business_number"], "1234567890");

    form.user_id = "park01".to_string();
    let err = client.signup(&form).await.expect_err("duplicate id");
    assert!(matches!(err, StoreClientError::InvalidRequest(_)));

    form.password = "123".to_string();
    let err = client.signup(&form).await.expect_err("short password");
    assert!(matches!(err, StoreClientError::Validation(_)));
}

#[tokio::test]
async fn posts_are_filtered_by_exact_category() {
    let (client, _db) = logged_in_client().await;

    let tips = client.posts(Some("tip")).await.expect("posts");
    let ids: Vec<i64> = tips.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1]);

    let all = client.posts(Some("all")).await.expect("posts");
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn create_post_returns_stored_post() {
    let (client, _db) = logged_in_client().await;

    let form = PostForm {
        category: "question".to_string(),
        title: "Where to buy rice?".to_string(),
        content: "Looking for a wholesaler".to_string(),
    };
    let post = client.create_post(&form).await.expect("create");
    assert_eq!(post.id, 4);
    assert_eq!(post.user_id, "kim");
    assert_eq!(post.category, "question");
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let (client, _db) = logged_in_client().await;
    assert!(matches!(client.post(99).await, Err(StoreClientError::NotFound)));
}

#[tokio::test]
async fn like_and_unlike_are_idempotent_against_server() {
    let (client, db) = logged_in_client().await;
    let mut book = LikeBook::new();
    let posts = loaded_posts(&client).await;

    assert!(client.like(&mut book, &posts, 1).await.expect("like").is_some());
    assert!(client.like(&mut book, &posts, 1).await.expect("like again").is_none());
    assert_eq!(client.post(1).await.expect("post").like_count, 1);
    assert_eq!(local_like_count(&posts, 1), 1);

    assert!(client.unlike(&mut book, &posts, 1).await.expect("unlike").is_some());
    assert!(client.unlike(&mut book, &posts, 1).await.expect("unlike again").is_none());
    assert_eq!(client.post(1).await.expect("post").like_count, 0);
    assert_eq!(local_like_count(&posts, 1), 0);

    assert_eq!(db.lock().expect("db lock").like_calls, 2);
}

async fn loaded_posts(client: &StoreClient) -> StateCell<Vec<Post>> {
    let posts = StateCell::new();
    posts.set(ViewState::Loaded(client.posts(None).await.expect("posts")));
    posts
}

fn local_like_count(posts: &StateCell<Vec<Post>>, id: i64) -> u32 {
    posts
        .get()
        .data()
        .and_then(|list| list.iter().find(|p| p.id == id))
        .map(|p| p.like_count)
        .expect("post is loaded")
}

#[tokio::test]
async fn rejected_like_is_rolled_back() {
    let (client, db) = logged_in_client().await;
    let mut book = LikeBook::new();

    let ghost: Post = serde_json::from_value(post_json(99, "tip", "Deleted")).expect("post");
    let posts = StateCell::new();
    posts.set(ViewState::Loaded(vec![ghost]));

    let err = client
        .like(&mut book, &posts, 99)
        .await
        .expect_err("server rejects like");
    assert!(matches!(err, StoreClientError::InvalidRequest(_)));
    assert!(!book.is_liked(99));
    assert_eq!(local_like_count(&posts, 99), 0);
    assert_eq!(db.lock().expect("db lock").like_calls, 1);
}

#[tokio::test]
async fn toggle_like_flips_against_server() {
    let (client, db) = logged_in_client().await;
    let mut book = LikeBook::new();
    let posts = loaded_posts(&client).await;

    let first = client.toggle_like(&mut book, &posts, 1).await.expect("toggle");
    assert_eq!(first, LikeAction::Increment(1));
    assert!(book.is_liked(1));
    assert_eq!(local_like_count(&posts, 1), 1);
    assert_eq!(client.post(1).await.expect("post").like_count, 1);

    let second = client.toggle_like(&mut book, &posts, 1).await.expect("toggle");
    assert_eq!(second, LikeAction::Decrement(1));
    assert!(!book.is_liked(1));
    assert_eq!(local_like_count(&posts, 1), 0);
    assert_eq!(client.post(1).await.expect("post").like_count, 0);

    assert_eq!(db.lock().expect("db lock").like_calls, 2);
}

#[tokio::test]
async fn likes_survive_logout_and_login() {
    let (mut client, db) = logged_in_client().await;
    let tmp = TempDir::new().expect("tempdir");
    let store = SessionStore::new(tmp.path().join("session.json"));
    let posts = StateCell::new();

    let mut session = Session {
        login_id: client.login_id().map(str::to_string),
        user: None,
        likes: store.likes_for("kim").expect("likes"),
    };
    assert!(client.like(&mut session.likes, &posts, 1).await.expect("like").is_some());
    store.save(&session).expect("save");

    client.logout();
    store.clear().expect("clear");
    assert!(!store.load().expect("load").is_logged_in());

    let user = client.login("kim", "secret1").await.expect("login");
    let mut likes = store.likes_for(&user.user_id).expect("likes");
    let again = client.like(&mut likes, &posts, 1).await.expect("like");

    assert!(again.is_none());
    assert_eq!(db.lock().expect("db lock").like_calls, 1);
    assert_eq!(client.post(1).await.expect("post").like_count, 1);
}

#[tokio::test]
async fn empty_category_list_falls_back_to_defaults() {
    let (base_url, _db) = spawn_fake_server().await;
    let client = StoreClient::new(base_url, HttpOptions::default()).expect("client");

    let categories = client.categories().await.expect("categories");
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["free", "question", "tip", "market"]);
}

#[tokio::test]
async fn recipe_loads_ingredients_separately() {
    let (client, _db) = logged_in_client().await;

    let recipe = client.recipe(1).await.expect("recipe");
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredient_cost(), 1000);
}

#[tokio::test]
async fn margin_summary_guards_zero_price() {
    let (client, _db) = logged_in_client().await;

    let summary = client.margin_summary().await.expect("summary");
    assert_eq!(summary.lines[0].margin_rate, 75);
    assert_eq!(summary.lines[1].margin, -500);
    assert_eq!(summary.lines[1].margin_rate, 0);
    assert_eq!(summary.total_margin, 2500);
}

#[tokio::test]
async fn reports_are_sorted_newest_first_and_summarized() {
    let (client, _db) = logged_in_client().await;

    let reports = client.reports().await.expect("reports");
    assert_eq!(reports[0].id, 2);

    let summary = client.sales_summary(None, None).await.expect("summary");
    assert_eq!(summary.total_revenue, 50_000);
    assert_eq!(summary.by_menu[0].menu_name, "kimbap");
    assert_eq!(summary.by_menu[0].share, 80);
}

#[tokio::test]
async fn server_error_maps_to_server_variant() {
    let (client, _db) = logged_in_client().await;

    let err = client.comments(1).await.expect_err("must fail");
    match &err {
        StoreClientError::Server(message) => assert_eq!(message, "db down"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Ошибка сервера");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client =
        StoreClient::new(format!("http://{addr}"), HttpOptions::default()).expect("client");
    let err = client.post(1).await.expect_err("must fail");
    assert!(matches!(err, StoreClientError::Http(_)));
}

#[tokio::test]
#[ignore = "requires running store server"]
async fn http_smoke_flow() {
    let base_url =
        std::env::var("STORE_HTTP_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let user_id = std::env::var("STORE_USER").unwrap_or_else(|_| "test01".to_string());
    let password = std::env::var("STORE_PASSWORD").unwrap_or_else(|_| "password123".to_string());

    let mut client = StoreClient::new(base_url, HttpOptions::default()).expect("client");
    client.login(&user_id, &password).await.expect("login must succeed");

    let categories = client.categories().await.expect("categories");
    assert!(!categories.is_empty());

    let posts = client.posts(None).await.expect("posts");
    for post in posts.iter().take(3) {
        client.comments(post.id).await.expect("comments");
    }

    client.margin_summary().await.expect("margin summary");
    client.reports().await.expect("reports");
}
