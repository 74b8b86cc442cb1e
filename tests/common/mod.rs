//! In-process stand-in for the workshop REST API.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use etrier_workshop::{
    backend, config,
    session::MemoryStore,
    Session,
};

pub const ADMIN: (&str, &str) = ("nadia", "secret-admin");
pub const TECHNICIAN: (&str, &str) = ("sami", "secret-tech");

type Shared = Arc<Mutex<Db>>;

pub struct Db {
    users: Vec<(Value, String)>,
    receptions: Vec<Value>,
    pieces: Vec<Value>,
    clients: Vec<Value>,
    etriers: Vec<Value>,
    next_id: usize,
    fail_complete_return: bool,
    requests: Vec<String>,
}

impl Db {
    fn seeded() -> Self {
        let garage = json!({ "_id": "c1", "name": "Garage Ali" });
        let golf = json!({ "_id": "e1", "carModel": "Golf 7" });
        let receptions = vec![
            json!({
                "_id": "r1",
                "receptionNumber": "0001",
                "client": garage,
                "etrier": golf,
                "position": "avant gauche",
                "user": { "_id": "u-tech", "name": "sami" },
                "etat": "recus",
                "isReturned": false,
                "extra": {},
                "observation": "",
                "date": "2025-03-01T08:00:00.000Z"
            }),
            json!({
                "_id": "r2",
                "receptionNumber": "0002",
                "client": garage,
                "etrier": golf,
                "position": "avant droit",
                "user": "u-tech",
                "etat": "en cours",
                "date": "2025-03-02T08:00:00.000Z",
                "updatedAt": "2025-03-03T08:00:00.000Z"
            }),
            json!({
                "_id": "r3",
                "receptionNumber": "0003",
                "client": garage,
                "etrier": golf,
                "position": "arrière gauche",
                "user": "u-tech",
                "etat": "finit",
                "delivered": false,
                "extra": {
                    "serialNumber": "SBS25ET0007",
                    "pieces": ["p1"],
                    "pieceCounters": { "p1": 2 }
                },
                "date": "2025-03-02T09:00:00.000Z",
                "updatedAt": "2025-03-05T08:00:00.000Z"
            }),
            json!({
                "_id": "r4",
                "receptionNumber": "0004",
                "client": garage,
                "etrier": golf,
                "position": "arrière droit",
                "user": "u-tech",
                "etat": "finit",
                "delivered": "yes",
                "extra": { "serialNumber": { "serialNumber": "SBS24ET0100" } },
                "date": "2025-02-10T08:00:00.000Z",
                "updatedAt": "2025-02-12T08:00:00.000Z"
            }),
            json!({
                "_id": "r5",
                "receptionNumber": "0005",
                "client": "c1",
                "etrier": "e1",
                "user": "u-tech",
                "etat": "returner",
                "delivered": true,
                "observation": "fuite",
                "date": "2025-02-15T08:00:00.000Z"
            }),
        ];

        Self {
            users: vec![
                (
                    json!({ "_id": "u-admin", "name": ADMIN.0, "role": "admin" }),
                    ADMIN.1.to_owned(),
                ),
                (
                    json!({ "_id": "u-tech", "name": TECHNICIAN.0, "role": "user" }),
                    TECHNICIAN.1.to_owned(),
                ),
            ],
            next_id: receptions.len() + 1,
            receptions,
            pieces: vec![
                json!({
                    "_id": "p1",
                    "designation": "Piston 54mm",
                    "referenceArticle": "PST-54",
                    "barCode": "6191234567890"
                }),
                json!({
                    "_id": "p2",
                    "designation": "Joint de piston",
                    "referenceArticle": "JNT-01"
                }),
            ],
            clients: vec![garage],
            etriers: vec![golf],
            fail_complete_return: false,
            requests: Vec::new(),
        }
    }

    fn reception_mut(&mut self, id: &str) -> Result<&mut Value, ApiError> {
        self.receptions
            .iter_mut()
            .find(|r| r["_id"] == id)
            .ok_or(ApiError(StatusCode::NOT_FOUND, "reception not found"))
    }
}

pub struct Server {
    pub base_url: String,
    db: Shared,
}

impl Server {
    pub async fn spawn() -> Self {
        let db = Arc::new(Mutex::new(Db::seeded()));

        let api = Router::new()
            .route("/users", get(list_users))
            .route("/users/login", post(login))
            .route("/users/users", post(create_user))
            .route("/users/:id", delete(delete_user))
            .route("/receptions", get(list_receptions).post(create_reception))
            .route("/receptions/:id", get(get_reception))
            .route("/receptions/:id/etat", patch(set_etat))
            .route("/receptions/:id/delivered", patch(mark_delivered))
            .route("/receptions/:id/request-return", post(request_return))
            .route("/receptions/:id/approve-return", patch(approve_return))
            .route("/receptions/:id/complete-return", post(complete_return))
            .route("/receptions/:id/extra", patch(update_extra))
            .route("/pieces", get(list_pieces))
            .route("/clients", get(list_clients))
            .route("/etriers", get(list_etriers));
        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(db.clone(), record))
            .with_state(db.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("no local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            db,
        }
    }

    pub fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap()
    }

    /// Stored JSON of a reception.
    pub fn reception(&self, id: &str) -> Value {
        self.db()
            .receptions
            .iter()
            .find(|r| r["_id"] == id)
            .cloned()
            .unwrap_or_else(|| panic!("no reception {id}"))
    }

    pub fn edit_reception(&self, id: &str, edit: impl FnOnce(&mut Value)) {
        let mut db = self.db();
        edit(db.reception_mut(id).unwrap_or_else(|_| panic!("no reception {id}")));
    }

    pub fn user_names(&self) -> Vec<String> {
        self.db()
            .users
            .iter()
            .map(|(u, _)| u["name"].as_str().unwrap().to_owned())
            .collect()
    }

    /// `METHOD /path` of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.db().requests.clone()
    }

    pub fn fail_complete_return(&self, fail: bool) {
        self.db().fail_complete_return = fail;
    }

    pub fn client(&self) -> backend::Client {
        backend::connect(&config::Api {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
        })
        .expect("failed to build client")
    }

    pub async fn login(
        &self,
        (name, password): (&str, &str),
    ) -> (backend::Client, Session, MemoryStore) {
        let mut client = self.client();
        let store = MemoryStore::default();
        let session = Session::login(&mut client, &store, name, password)
            .await
            .expect("login failed");
        (client, session, store)
    }
}

async fn record(State(db): State<Shared>, req: Request, next: Next) -> Response {
    db.lock()
        .unwrap()
        .requests
        .push(format!("{} {}", req.method(), req.uri().path()));
    next.run(req).await
}

struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

const FORBIDDEN: ApiError = ApiError(StatusCode::FORBIDDEN, "admin only");

struct Caller {
    id: String,
    is_admin: bool,
}

#[async_trait]
impl FromRequestParts<Shared> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &Shared,
    ) -> Result<Self, Self::Rejection> {
        const UNAUTHORIZED: ApiError =
            ApiError(StatusCode::UNAUTHORIZED, "invalid token");

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| UNAUTHORIZED)?;

        let db = state.lock().unwrap();
        let (user, _) = db
            .users
            .iter()
            .find(|(u, _)| token_of(u) == bearer.token())
            .ok_or(UNAUTHORIZED)?;
        Ok(Self {
            id: user["_id"].as_str().unwrap().to_owned(),
            is_admin: user["role"] == "admin",
        })
    }
}

fn token_of(user: &Value) -> String {
    format!("token-{}", user["_id"].as_str().unwrap())
}

async fn login(
    State(db): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let db = db.lock().unwrap();
    let (user, _) = db
        .users
        .iter()
        .find(|(u, password)| u["name"] == body["name"] && *password == body["password"])
        .ok_or(ApiError(StatusCode::UNAUTHORIZED, "invalid credentials"))?;
    Ok(Json(json!({ "token": token_of(user), "user": user })))
}

async fn list_users(
    State(db): State<Shared>,
    caller: Caller,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_admin {
        return Err(FORBIDDEN);
    }
    let db = db.lock().unwrap();
    Ok(Json(db.users.iter().map(|(u, _)| u.clone()).collect()))
}

async fn create_user(
    State(db): State<Shared>,
    caller: Caller,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_admin {
        return Err(FORBIDDEN);
    }
    let mut db = db.lock().unwrap();
    let user = json!({
        "_id": format!("u{}", db.users.len() + 1),
        "name": body["name"],
        "role": body["role"],
    });
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    db.users.push((user.clone(), password));
    Ok(Json(user))
}

async fn delete_user(
    State(db): State<Shared>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut db = db.lock().unwrap();
    let index = db
        .users
        .iter()
        .position(|(u, _)| u["_id"] == id.as_str())
        .ok_or(ApiError(StatusCode::NOT_FOUND, "user not found"))?;
    if caller.id == id {
        if db.users[index].1 != body["password"] {
            return Err(ApiError(StatusCode::FORBIDDEN, "wrong password"));
        }
    } else if !caller.is_admin {
        return Err(FORBIDDEN);
    }
    db.users.remove(index);
    Ok(Json(json!({ "message": "deleted" })))
}

async fn list_receptions(
    State(db): State<Shared>,
    _: Caller,
) -> Json<Value> {
    Json(json!({ "data": db.lock().unwrap().receptions }))
}

async fn get_reception(
    State(db): State<Shared>,
    _: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(db.lock().unwrap().reception_mut(&id)?.clone()))
}

async fn create_reception(
    State(db): State<Shared>,
    caller: Caller,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut db = db.lock().unwrap();
    let client = db
        .clients
        .iter()
        .find(|c| c["_id"] == body["client"])
        .cloned()
        .ok_or(ApiError(StatusCode::BAD_REQUEST, "unknown client"))?;
    let etrier = db
        .etriers
        .iter()
        .find(|e| e["_id"] == body["etrier"])
        .cloned()
        .ok_or(ApiError(StatusCode::BAD_REQUEST, "unknown etrier"))?;
    if body["user"] != caller.id.as_str() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "user mismatch"));
    }

    let n = db.next_id;
    db.next_id += 1;
    let reception = json!({
        "_id": format!("r{n}"),
        "receptionNumber": format!("{n:04}"),
        "client": client,
        "etrier": etrier,
        "position": body["position"],
        "user": body["user"],
        "etat": body["etat"],
        "isReturned": false,
        "delivered": false,
        "extra": {},
        "observation": body["observation"],
        "date": "2025-03-10T09:00:00.000Z"
    });
    db.receptions.push(reception.clone());
    Ok(Json(reception))
}

async fn set_etat(
    State(db): State<Shared>,
    _: Caller,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut db = db.lock().unwrap();
    let reception = db.reception_mut(&id)?;
    reception["etat"] = body["etat"].clone();
    if !body["serialNumber"].is_null() {
        reception["extra"]["serialNumber"] = body["serialNumber"].clone();
    }
    reception["updatedAt"] = json!("2025-03-11T10:00:00.000Z");
    Ok(Json(reception.clone()))
}

async fn mark_delivered(
    State(db): State<Shared>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_admin {
        return Err(FORBIDDEN);
    }
    let mut db = db.lock().unwrap();
    let reception = db.reception_mut(&id)?;
    reception["delivered"] = json!("yes");
    reception["updatedAt"] = json!("2025-03-12T10:00:00.000Z");
    Ok(Json(reception.clone()))
}

async fn request_return(
    State(db): State<Shared>,
    _: Caller,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut db = db.lock().unwrap();
    let reception = db.reception_mut(&id)?;
    reception["returnStatus"] = json!("requested");
    reception["returnReason"] = body["reason"].clone();
    Ok(Json(reception.clone()))
}

async fn approve_return(
    State(db): State<Shared>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_admin {
        return Err(FORBIDDEN);
    }
    let mut db = db.lock().unwrap();
    let reception = db.reception_mut(&id)?;
    reception["returnStatus"] = json!("approved");
    Ok(Json(reception.clone()))
}

async fn complete_return(
    State(db): State<Shared>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !caller.is_admin {
        return Err(FORBIDDEN);
    }
    let mut db = db.lock().unwrap();
    if db.fail_complete_return {
        return Err(ApiError(
            StatusCode::INTERNAL_SERVER_ERROR,
            "database unavailable",
        ));
    }
    let reception = db.reception_mut(&id)?;
    reception["returnStatus"] = json!("completed");
    reception["isReturned"] = json!(true);
    reception["updatedAt"] = json!("2025-03-13T10:00:00.000Z");
    Ok(Json(reception.clone()))
}

async fn update_extra(
    State(db): State<Shared>,
    _: Caller,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut db = db.lock().unwrap();
    let reception = db.reception_mut(&id)?;
    reception["extra"]["pieces"] = body["pieces"].clone();
    reception["extra"]["pieceCounters"] = body["pieceCounters"].clone();
    Ok(Json(reception.clone()))
}

async fn list_pieces(State(db): State<Shared>, _: Caller) -> Json<Value> {
    Json(Value::from(db.lock().unwrap().pieces.clone()))
}

async fn list_clients(State(db): State<Shared>, _: Caller) -> Json<Value> {
    Json(Value::from(db.lock().unwrap().clients.clone()))
}

async fn list_etriers(State(db): State<Shared>, _: Caller) -> Json<Value> {
    Json(Value::from(db.lock().unwrap().etriers.clone()))
}
