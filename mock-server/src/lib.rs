use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const USER_TOKEN_HEADER: &str = "user-token";

/// Public view of a stored user.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "objectId")]
    pub object_id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "avatarURL", skip_serializing_if = "Option::is_none", default)]
    pub avatar_url: Option<String>,
    #[serde(rename = "avatarRotation", default)]
    pub avatar_rotation: i64,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginUser {
    pub login: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginReply {
    #[serde(rename = "user-token")]
    pub user_token: String,
    #[serde(flatten)]
    pub user: User,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    #[serde(rename = "avatarURL")]
    pub avatar_url: Option<String>,
    #[serde(rename = "avatarRotation")]
    pub avatar_rotation: Option<i64>,
    pub username: Option<String>,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub props: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub message: String,
}

type Failure = (StatusCode, Json<ErrorBody>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (
        status,
        Json(ErrorBody {
            message: message.to_string(),
        }),
    )
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    /// Session token to object id.
    sessions: HashMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", get(logout))
        .route("/users/{id}", get(get_user).put(update_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterUser>,
) -> Result<Json<User>, Failure> {
    if input.email.is_empty() || input.password.is_empty() || input.username.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "email, password and username are required"));
    }
    let mut store = db.write().await;
    if store.accounts.values().any(|a| a.user.email == input.email) {
        return Err(failure(StatusCode::CONFLICT, "user already exists"));
    }
    let user = User {
        object_id: Uuid::new_v4().to_string().to_uppercase(),
        email: input.email,
        username: input.username,
        avatar_url: None,
        avatar_rotation: 0,
    };
    info!(object_id = %user.object_id, "registered user");
    store.accounts.insert(
        user.object_id.clone(),
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok(Json(user))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginUser>,
) -> Result<Json<LoginReply>, Failure> {
    let mut store = db.write().await;
    let user = store
        .accounts
        .values()
        .find(|a| a.user.email == input.login && a.password == input.password)
        .map(|a| a.user.clone())
        .ok_or_else(|| {
            warn!("login rejected");
            failure(StatusCode::UNAUTHORIZED, "invalid login or password")
        })?;
    let token = Uuid::new_v4().to_string().to_uppercase();
    store.sessions.insert(token.clone(), user.object_id.clone());
    info!(object_id = %user.object_id, "logged in");
    Ok(Json(LoginReply {
        user_token: token,
        user,
    }))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, Failure> {
    let token = user_token(&headers)?;
    let mut store = db.write().await;
    match store.sessions.remove(&token) {
        Some(object_id) => {
            info!(%object_id, "logged out");
            Ok(StatusCode::OK)
        }
        None => {
            warn!("logout with unknown token");
            Err(failure(StatusCode::UNAUTHORIZED, "not logged in"))
        }
    }
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    let user = store
        .accounts
        .get(&id)
        .map(|a| &a.user)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    let Value::Object(fields) = serde_json::to_value(user).unwrap_or_default() else {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "user is not an object"));
    };
    Ok(Json(Value::Object(project(fields, query.props.as_deref()))))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, Failure> {
    let token = user_token(&headers)?;
    let mut store = db.write().await;
    if store.sessions.get(&token) != Some(&id) {
        warn!(object_id = %id, "update rejected for token");
        return Err(failure(StatusCode::UNAUTHORIZED, "token does not own this user"));
    }
    let account = store
        .accounts
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    if let Some(avatar_url) = input.avatar_url {
        account.user.avatar_url = Some(avatar_url);
    }
    if let Some(rotation) = input.avatar_rotation {
        account.user.avatar_rotation = rotation;
    }
    if let Some(username) = input.username {
        account.user.username = username;
    }
    Ok(Json(account.user.clone()))
}

fn user_token(headers: &HeaderMap) -> Result<String, Failure> {
    headers
        .get(USER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            warn!("request without user-token");
            failure(StatusCode::UNAUTHORIZED, "missing user-token header")
        })
}

/// Keep `objectId` plus the comma-separated `props`; everything when absent.
fn project(fields: Map<String, Value>, props: Option<&str>) -> Map<String, Value> {
    let Some(props) = props else {
        return fields;
    };
    let wanted: Vec<&str> = props.split(',').map(str::trim).collect();
    fields
        .into_iter()
        .filter(|(key, _)| key == "objectId" || wanted.contains(&key.as_str()))
        .collect()
}
