//! Integration tests for Shopfront.
//!
//! The tests drive the page controllers against [`FakeApi`], an in-process
//! axum server that speaks the storefront REST API from in-memory state.
//! Each test starts its own server on an ephemeral port, so tests run in
//! parallel without sharing data.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Knobs
//!
//! [`ApiState`] is public: tests seed it, flip [`ApiState::token_expired`] to
//! make every bearer call answer 401, queue delays for cart reads, and read
//! back [`ApiState::requests`] to check what was sent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use shopfront_core::UserInfo;
use shopfront_storefront::config::ClientConfig;
use shopfront_storefront::controllers::PageContext;
use shopfront_storefront::session::{MemorySessionStore, SessionStore};
use tokio::task::JoinHandle;
use url::Url;

/// Email of the seeded customer.
pub const ADA_EMAIL: &str = "ada@example.com";
/// Password of the seeded customer.
pub const ADA_PASSWORD: &str = "correct horse";
/// Bearer token the seeded customer starts signed in with.
pub const ADA_TOKEN: &str = "token-ada";
/// Id of the seeded customer.
pub const ADA_ID: u64 = 7;
/// Reset token the fake accepts.
pub const RESET_TOKEN: &str = "reset-123";
/// Number of products in the seeded catalog.
pub const CATALOG_SIZE: usize = 25;
/// Products per catalog page.
pub const PAGE_SIZE: usize = 10;

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: String,
}

impl FakeUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "role": self.role,
            "account_type": self.role,
            "created_at": self.created_at,
        })
    }
}

/// One line in a user's cart.
#[derive(Debug, Clone)]
pub struct FakeLine {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub price: String,
    pub quantity: u32,
}

impl FakeLine {
    fn to_json(&self) -> Value {
        json!({
            "_id": self.id,
            "product_id": self.product_id,
            "product_name": self.product_name,
            "price": self.price,
            "quantity": self.quantity,
            "product_available": true,
        })
    }
}

/// Everything the fake API knows, plus test knobs.
#[derive(Debug, Default)]
pub struct ApiState {
    pub users: Vec<FakeUser>,
    /// Bearer token to user id.
    pub tokens: HashMap<String, u64>,
    pub products: Vec<Value>,
    pub featured: Vec<Value>,
    pub carts: HashMap<u64, Vec<FakeLine>>,
    pub orders: HashMap<u64, Vec<Value>>,
    /// Every bearer-authenticated endpoint answers 401.
    pub token_expired: bool,
    /// The products endpoints answer 500.
    pub catalog_down: bool,
    /// Delays applied to successive cart reads. The cart is read before the
    /// delay, so a delayed response carries the state it saw on arrival.
    pub cart_delays: VecDeque<Duration>,
    /// `"METHOD path"` of every request, in arrival order.
    pub requests: Vec<String>,
    /// JSON bodies of every cart quantity update, in arrival order.
    pub quantity_updates: Vec<Value>,
    /// Shipping addresses of placed orders.
    pub placed_orders: Vec<String>,
    next_id: u64,
}

impl ApiState {
    /// State with one customer, a catalog, a two-line cart and one order.
    #[must_use]
    pub fn seeded() -> Self {
        let ada = FakeUser {
            id: ADA_ID,
            email: ADA_EMAIL.to_string(),
            password: ADA_PASSWORD.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: "customer".to_string(),
            created_at: "2024-03-15T10:30:00Z".to_string(),
        };

        let products: Vec<Value> = (1..=CATALOG_SIZE)
            .map(|n| {
                let name = if n % 5 == 0 {
                    format!("Mug {n}")
                } else {
                    format!("T-Shirt {n}")
                };
                json!({
                    "_id": format!("p{n}"),
                    "name": name,
                    "description": format!("Product number {n}"),
                    "price": format!("{n}.50"),
                    "stock": n,
                })
            })
            .collect();
        let featured = products.iter().take(3).cloned().collect();

        let cart = vec![
            FakeLine {
                id: "line-1".to_string(),
                product_id: "p12".to_string(),
                product_name: "Red Red T-Shirt Red Red T-Shirt".to_string(),
                price: "12.50".to_string(),
                quantity: 1,
            },
            FakeLine {
                id: "line-2".to_string(),
                product_id: "p5".to_string(),
                product_name: "Mug 5".to_string(),
                price: "5.50".to_string(),
                quantity: 2,
            },
        ];

        let order = json!({
            "id": 42,
            "status": "refunded",
            "total_amount": 33.5,
            "shipping_address": "12 St James's Square, London, SW1Y 4JH, UK",
            "created_at": "2024-04-01T09:00:00Z",
            "items": [
                {"product_name": "Mug 5", "price": "5.50", "quantity": 2},
                {"product_name": "T-Shirt 12", "price": "12.50", "quantity": 1},
            ],
        });

        Self {
            tokens: HashMap::from([(ADA_TOKEN.to_string(), ada.id)]),
            carts: HashMap::from([(ada.id, cart)]),
            orders: HashMap::from([(ada.id, vec![order])]),
            users: vec![ada],
            products,
            featured,
            next_id: 100,
            ..Self::default()
        }
    }

    /// The seeded customer as the session caches it after login.
    #[must_use]
    pub fn ada_session_user() -> UserInfo {
        UserInfo {
            id: Some(shopfront_core::UserId::new(ADA_ID.to_string())),
            role: Some("customer".to_string()),
            ..UserInfo::default()
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: u64) -> Option<&FakeUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn cart_mut(&mut self, user: u64) -> &mut Vec<FakeLine> {
        self.carts.entry(user).or_default()
    }

    /// Set one line's quantity directly, bypassing the API.
    pub fn set_quantity(&mut self, user: u64, line: &str, quantity: u32) {
        if let Some(line) = self.cart_mut(user).iter_mut().find(|l| l.id == line) {
            line.quantity = quantity;
        }
    }

    /// Quantity of one line as the server sees it.
    #[must_use]
    pub fn quantity(&self, user: u64, line: &str) -> Option<u32> {
        self.carts
            .get(&user)?
            .iter()
            .find(|l| l.id == line)
            .map(|l| l.quantity)
    }

    /// Number of requests that matched `"METHOD path"` exactly.
    #[must_use]
    pub fn count(&self, request: &str) -> usize {
        self.requests.iter().filter(|r| *r == request).count()
    }
}

type Shared = Arc<Mutex<ApiState>>;

fn lock(state: &Shared) -> MutexGuard<'_, ApiState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// FakeApi
// =============================================================================

/// A running fake API. The server stops when this is dropped.
pub struct FakeApi {
    base_url: Url,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeApi {
    /// Start a server over [`ApiState::seeded`].
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::with_state(ApiState::seeded()).await
    }

    /// Start a server over `state`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn with_state(state: ApiState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake API stopped");
            }
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).unwrap(),
            state,
            server,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Lock the server state for seeding or inspection.
    pub fn state(&self) -> MutexGuard<'_, ApiState> {
        lock(&self.state)
    }

    /// A page context over `store` with the default profile policy.
    #[must_use]
    pub fn context(&self, store: impl SessionStore + 'static) -> PageContext {
        self.context_with(store, |_| {})
    }

    /// A page context whose config is adjusted by `configure`.
    ///
    /// # Panics
    ///
    /// Panics if the API client cannot be built.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn context_with(
        &self,
        store: impl SessionStore + 'static,
        configure: impl FnOnce(&mut ClientConfig),
    ) -> PageContext {
        let mut config = ClientConfig::new(self.base_url.clone());
        configure(&mut config);
        PageContext::new(&config, Arc::new(store)).unwrap()
    }

    /// A page context signed in as the seeded customer.
    #[must_use]
    pub fn ada(&self) -> PageContext {
        self.context(MemorySessionStore::signed_in(
            ADA_TOKEN,
            ApiState::ada_session_user(),
        ))
    }

    /// A page context with no session.
    #[must_use]
    pub fn guest(&self) -> PageContext {
        self.context(MemorySessionStore::default())
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Routes
// =============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/user-info", get(user_info))
        .route("/api/products", get(list_products))
        .route("/api/products/featured", get(featured_products))
        .route("/api/cart", get(cart))
        .route("/api/cart/count", get(cart_count))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update/{id}", put(update_cart_item))
        .route("/api/cart/remove/{id}", delete(remove_cart_item))
        .route("/api/profile", get(profile).put(update_profile))
        .route("/api/orders", get(orders).post(place_order))
        .route("/api/orders/{id}", get(order))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn record(state: &Shared, request: String) {
    lock(state).requests.push(request);
}

/// Resolve the bearer token to a user id.
fn bearer_user(state: &ApiState, headers: &HeaderMap) -> Result<u64, Response> {
    if state.token_expired {
        return Err(error(StatusCode::UNAUTHORIZED, "Token has expired"));
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| state.tokens.get(token).copied())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Missing or invalid token"))
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn grant(state: &mut ApiState, user_id: u64, role: &str) -> Value {
    let token = format!("token-{}", state.fresh_id());
    state.tokens.insert(token.clone(), user_id);
    json!({
        "access_token": token,
        "role": role,
        "user": {"id": user_id, "role": role},
    })
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/auth/login".to_string());
    let mut state = lock(&state);
    let email = str_field(&body, "email");
    let password = str_field(&body, "password");
    let Some(user) = state
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned()
    else {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    };
    Json(grant(&mut state, user.id, &user.role)).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/auth/register".to_string());
    let mut state = lock(&state);
    let email = str_field(&body, "email").to_string();
    if state.users.iter().any(|u| u.email == email) {
        return error(StatusCode::CONFLICT, "Email exists");
    }

    let id = state.fresh_id();
    let name = str_field(&body, "name");
    let (first_name, last_name) = name.split_once(' ').unwrap_or((name, ""));
    let role = str_field(&body, "account_type").to_string();
    state.users.push(FakeUser {
        id,
        email,
        password: str_field(&body, "password").to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role: role.clone(),
        created_at: "2024-05-01T00:00:00Z".to_string(),
    });
    (StatusCode::CREATED, Json(grant(&mut state, id, &role))).into_response()
}

async fn forgot_password(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/auth/forgot-password".to_string());
    let state = lock(&state);
    let email = str_field(&body, "email");
    if state.users.iter().any(|u| u.email == email) {
        Json(json!({"message": "Reset link sent"})).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "No such user")
    }
}

async fn reset_password(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/auth/reset-password".to_string());
    if str_field(&body, "token") != RESET_TOKEN {
        return error(StatusCode::BAD_REQUEST, "Token invalid");
    }
    let mut state = lock(&state);
    let password = str_field(&body, "new_password").to_string();
    if let Some(user) = state.users.iter_mut().find(|u| u.id == ADA_ID) {
        user.password = password;
    }
    Json(json!({"message": "Password updated"})).into_response()
}

#[derive(Debug, Deserialize)]
struct UserInfoQuery {
    id: String,
}

async fn user_info(State(state): State<Shared>, Query(query): Query<UserInfoQuery>) -> Response {
    record(&state, "GET /api/auth/user-info".to_string());
    let state = lock(&state);
    let user = query.id.parse().ok().and_then(|id| state.user(id));
    match user {
        Some(user) => Json(json!({"success": true, "user": user.to_json()})).into_response(),
        None => Json(json!({"success": false})).into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProductsQuery {
    page: Option<usize>,
    search: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

fn price_of(product: &Value) -> f64 {
    str_field(product, "price").parse().unwrap_or_default()
}

async fn list_products(
    State(state): State<Shared>,
    Query(query): Query<ProductsQuery>,
) -> Response {
    record(&state, "GET /api/products".to_string());
    let state = lock(&state);
    if state.catalog_down {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }

    let search = query.search.unwrap_or_default().to_lowercase();
    let matching: Vec<&Value> = state
        .products
        .iter()
        .filter(|p| str_field(p, "name").to_lowercase().contains(&search))
        .filter(|p| query.min_price.is_none_or(|min| price_of(p) >= min))
        .filter(|p| query.max_price.is_none_or(|max| price_of(p) <= max))
        .collect();

    let page = query.page.unwrap_or(1).max(1);
    let total_pages = matching.len().div_ceil(PAGE_SIZE);
    let products: Vec<&Value> = matching
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .copied()
        .collect();

    Json(json!({
        "products": products,
        "total": matching.len(),
        "total_pages": total_pages,
    }))
    .into_response()
}

async fn featured_products(State(state): State<Shared>) -> Response {
    record(&state, "GET /api/products/featured".to_string());
    let state = lock(&state);
    if state.catalog_down {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    Json(json!(state.featured)).into_response()
}

async fn cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /api/cart".to_string());
    let (body, delay) = {
        let mut state = lock(&state);
        let user = match bearer_user(&state, &headers) {
            Ok(user) => user,
            Err(response) => return response,
        };
        let items: Vec<Value> = state.cart_mut(user).iter().map(FakeLine::to_json).collect();
        (json!({ "items": items }), state.cart_delays.pop_front())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(body).into_response()
}

async fn cart_count(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /api/cart/count".to_string());
    let mut state = lock(&state);
    let count: u32 = match bearer_user(&state, &headers) {
        Ok(user) => state.cart_mut(user).iter().map(|l| l.quantity).sum(),
        Err(_) if !headers.contains_key(header::AUTHORIZATION) => 0,
        Err(response) => return response,
    };
    Json(json!({ "count": count })).into_response()
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "POST /api/cart/add".to_string());
    let mut state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let product_id = str_field(&body, "product_id").to_string();
    let Some(product) = state
        .products
        .iter()
        .find(|p| str_field(p, "_id") == product_id)
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    let price = body
        .get("price")
        .map(|p| p.as_str().map_or_else(|| p.to_string(), str::to_owned))
        .unwrap_or_default();

    let id = format!("line-{}", state.fresh_id());
    let cart = state.cart_mut(user);
    if let Some(line) = cart.iter_mut().find(|l| l.product_id == product_id) {
        line.quantity += 1;
    } else {
        cart.push(FakeLine {
            id,
            product_id,
            product_name: str_field(&product, "name").to_string(),
            price,
            quantity: 1,
        });
    }
    (StatusCode::CREATED, Json(json!({"message": "Added"}))).into_response()
}

async fn update_cart_item(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, format!("PUT /api/cart/update/{id}"));
    let mut state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    state.quantity_updates.push(body.clone());

    let quantity = body
        .get("quantity")
        .and_then(Value::as_u64)
        .and_then(|q| u32::try_from(q).ok());
    let Some(quantity) = quantity.filter(|q| *q >= 1) else {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    };
    match state.cart_mut(user).iter_mut().find(|l| l.id == id) {
        Some(line) => {
            line.quantity = quantity;
            Json(json!({"message": "Updated"})).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Cart item not found"),
    }
}

async fn remove_cart_item(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("DELETE /api/cart/remove/{id}"));
    let mut state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let cart = state.cart_mut(user);
    let before = cart.len();
    cart.retain(|l| l.id != id);
    if cart.len() == before {
        return error(StatusCode::NOT_FOUND, "Cart item not found");
    }
    Json(json!({"message": "Removed"})).into_response()
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /api/profile".to_string());
    let state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.user(user) {
        Some(user) => Json(json!({ "user": user.to_json() })).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "PUT /api/profile".to_string());
    let mut state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(user) = state.users.iter_mut().find(|u| u.id == user) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    str_field(&body, "first_name").clone_into(&mut user.first_name);
    str_field(&body, "last_name").clone_into(&mut user.last_name);
    if let Some(password) = body.get("password").and_then(Value::as_str) {
        password.clone_into(&mut user.password);
    }
    Json(json!({"message": "Profile updated"})).into_response()
}

async fn orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /api/orders".to_string());
    let state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let orders = state.orders.get(&user).cloned().unwrap_or_default();
    Json(json!({ "orders": orders })).into_response()
}

async fn order(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("GET /api/orders/{id}"));
    let state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let found = state
        .orders
        .get(&user)
        .and_then(|orders| orders.iter().find(|o| o["id"].to_string() == id));
    match found {
        Some(order) => Json(json!({ "order": order })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn place_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "POST /api/orders".to_string());
    let mut state = lock(&state);
    let user = match bearer_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if state.cart_mut(user).is_empty() {
        return error(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let address = str_field(&body, "shipping_address").to_string();
    let id = state.fresh_id();
    let total: f64 = state
        .cart_mut(user)
        .iter()
        .map(|l| l.price.parse::<f64>().unwrap_or_default() * f64::from(l.quantity))
        .sum();
    state.cart_mut(user).clear();
    state.orders.entry(user).or_default().push(json!({
        "id": id,
        "status": "pending",
        "total_amount": total + 10.0,
        "shipping_address": address,
        "created_at": "2024-06-01T12:00:00Z",
        "items": [],
    }));
    state.placed_orders.push(address);
    (StatusCode::CREATED, Json(json!({"order_id": id}))).into_response()
}
