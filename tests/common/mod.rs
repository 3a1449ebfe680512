//! In-process CouchDB stub for integration tests.
//!
//! A small axum app that implements the slice of the CouchDB REST surface the
//! server talks to: database CRUD, document CRUD with revision checking,
//! `_find` with equality/`$gt`/`$lt` selectors, `_all_docs`, and `_index`.
//! State lives in memory; each test spawns its own instance on an ephemeral
//! port.

// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct StubDb {
    /// Documents keyed by id; each carries its `_id` and `_rev` inline.
    docs: BTreeMap<String, Value>,
    /// Index definitions in CouchDB's list shape.
    indexes: Vec<Value>,
}

#[derive(Default)]
struct StubState {
    dbs: HashMap<String, StubDb>,
    /// Counter behind generated ids and revision suffixes.
    seq: u64,
    /// When set, `_find` answers with a response shape the typed client
    /// path cannot decode (warning as an object), forcing the fallback.
    legacy_find: bool,
}

impl StubState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Revision tokens look like CouchDB's: generation dash opaque suffix.
fn make_rev(generation: u64, seq: u64) -> String {
    format!("{generation}-{seq:08x}")
}

fn rev_generation(rev: &str) -> u64 {
    rev.split('-')
        .next()
        .and_then(|g| g.parse().ok())
        .unwrap_or(0)
}

type Shared = Arc<Mutex<StubState>>;

/// Handle to a running stub server.
pub struct StubCouch {
    pub addr: std::net::SocketAddr,
    state: Shared,
}

impl StubCouch {
    /// Spawn a stub on an ephemeral port.
    pub async fn spawn() -> Self {
        Self::spawn_inner(false).await
    }

    /// Spawn a stub whose `_find` responses defeat the typed decode path.
    pub async fn spawn_legacy_find() -> Self {
        Self::spawn_inner(true).await
    }

    async fn spawn_inner(legacy_find: bool) -> Self {
        let state: Shared = Arc::new(Mutex::new(StubState {
            legacy_find,
            ..StubState::default()
        }));

        let app = Router::new()
            .route("/", get(welcome))
            .route("/_all_dbs", get(all_dbs))
            .route("/{db}", put(create_db).delete(delete_db).post(post_doc))
            .route("/{db}/_all_docs", get(all_docs))
            .route("/{db}/_find", post(find))
            .route("/{db}/_index", post(create_index).get(list_indexes))
            .route(
                "/{db}/{docid}",
                get(get_doc).put(put_doc).delete(delete_doc),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL of the stub.
    pub fn url(&self) -> url::Url {
        url::Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// Number of documents currently stored in a database.
    pub fn doc_count(&self, db: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.dbs.get(db).map(|d| d.docs.len()).unwrap_or(0)
    }
}

fn error_response(status: StatusCode, error: &str, reason: &str) -> Response {
    (status, Json(json!({"error": error, "reason": reason}))).into_response()
}

fn db_missing() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "not_found",
        "Database does not exist.",
    )
}

fn conflict() -> Response {
    error_response(
        StatusCode::CONFLICT,
        "conflict",
        "Document update conflict.",
    )
}

async fn welcome() -> Json<Value> {
    Json(json!({"couchdb": "Welcome", "version": "3.3.3"}))
}

async fn all_dbs(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let mut names: Vec<&String> = state.dbs.keys().collect();
    names.sort();
    Json(json!(names))
}

async fn create_db(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if state.dbs.contains_key(&db) {
        return error_response(
            StatusCode::PRECONDITION_FAILED,
            "file_exists",
            "The database could not be created, the file already exists.",
        );
    }
    state.dbs.insert(db, StubDb::default());
    (StatusCode::CREATED, Json(json!({"ok": true}))).into_response()
}

async fn delete_db(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if state.dbs.remove(&db).is_none() {
        return db_missing();
    }
    Json(json!({"ok": true})).into_response()
}

async fn post_doc(
    State(state): State<Shared>,
    Path(db): Path<String>,
    Json(mut doc): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let seq = state.next_seq();
    let id = match doc.get("_id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => format!("{seq:032x}"),
    };
    let rev = make_rev(1, seq);

    let Some(stub_db) = state.dbs.get_mut(&db) else {
        return db_missing();
    };
    if stub_db.docs.contains_key(&id) {
        return conflict();
    }
    doc["_id"] = json!(id);
    doc["_rev"] = json!(rev);
    stub_db.docs.insert(id.clone(), doc);
    (
        StatusCode::CREATED,
        Json(json!({"ok": true, "id": id, "rev": rev})),
    )
        .into_response()
}

async fn put_doc(
    State(state): State<Shared>,
    Path((db, docid)): Path<(String, String)>,
    Json(mut doc): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let seq = state.next_seq();

    let Some(stub_db) = state.dbs.get_mut(&db) else {
        return db_missing();
    };

    let current_rev = stub_db
        .docs
        .get(&docid)
        .and_then(|d| d.get("_rev"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let supplied_rev = doc.get("_rev").and_then(Value::as_str);

    let generation = match &current_rev {
        Some(current) => {
            if supplied_rev != Some(current.as_str()) {
                return conflict();
            }
            rev_generation(current) + 1
        }
        None => 1,
    };

    let rev = make_rev(generation, seq);
    doc["_id"] = json!(docid);
    doc["_rev"] = json!(rev);
    stub_db.docs.insert(docid.clone(), doc);
    (
        StatusCode::CREATED,
        Json(json!({"ok": true, "id": docid, "rev": rev})),
    )
        .into_response()
}

async fn get_doc(
    State(state): State<Shared>,
    Path((db, docid)): Path<(String, String)>,
) -> Response {
    let state = state.lock().unwrap();
    let Some(stub_db) = state.dbs.get(&db) else {
        return db_missing();
    };
    match stub_db.docs.get(&docid) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "not_found", "missing"),
    }
}

async fn delete_doc(
    State(state): State<Shared>,
    Path((db, docid)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let seq = state.next_seq();

    let Some(stub_db) = state.dbs.get_mut(&db) else {
        return db_missing();
    };
    let Some(doc) = stub_db.docs.get(&docid) else {
        return error_response(StatusCode::NOT_FOUND, "not_found", "deleted");
    };
    let current_rev = doc
        .get("_rev")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if params.get("rev").map(String::as_str) != Some(current_rev.as_str()) {
        return conflict();
    }
    let rev = make_rev(rev_generation(&current_rev) + 1, seq);
    stub_db.docs.remove(&docid);
    Json(json!({"ok": true, "id": docid, "rev": rev})).into_response()
}

/// Minimal Mango matcher: field equality plus `$gt`/`$lt`/`$gte`/`$lte`.
fn selector_matches(doc: &Value, selector: &Value) -> bool {
    let Some(fields) = selector.as_object() else {
        return true;
    };
    fields.iter().all(|(field, expected)| {
        let actual = doc.get(field);
        match expected {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                ops.iter().all(|(op, operand)| {
                    let (Some(a), Some(b)) =
                        (actual.and_then(Value::as_f64), operand.as_f64())
                    else {
                        return false;
                    };
                    match op.as_str() {
                        "$gt" => a > b,
                        "$lt" => a < b,
                        "$gte" => a >= b,
                        "$lte" => a <= b,
                        _ => false,
                    }
                })
            }
            _ => actual == Some(expected),
        }
    })
}

async fn find(
    State(state): State<Shared>,
    Path(db): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let state = state.lock().unwrap();
    let Some(stub_db) = state.dbs.get(&db) else {
        return db_missing();
    };

    let selector = body.get("selector").cloned().unwrap_or(json!({}));
    let skip = body.get("skip").and_then(Value::as_u64).unwrap_or(0) as usize;
    let limit = body.get("limit").and_then(Value::as_u64).unwrap_or(25) as usize;

    let docs: Vec<Value> = stub_db
        .docs
        .values()
        .filter(|doc| selector_matches(doc, &selector))
        .skip(skip)
        .take(limit)
        .cloned()
        .collect();

    // Real CouchDB warns when no index covers the selector; the stub warns
    // whenever the database has no user-defined indexes at all.
    let warning = stub_db
        .indexes
        .is_empty()
        .then_some("No matching index found, create an index to optimize query time.");

    if state.legacy_find {
        // Warning as an object defeats the typed decode; docs stay readable
        // for the raw fallback path.
        return Json(json!({
            "docs": docs,
            "warning": {"code": "no_index", "text": warning},
        }))
        .into_response();
    }

    let mut resp = json!({"docs": docs, "bookmark": "nil"});
    if let Some(warning) = warning {
        resp["warning"] = json!(warning);
    }
    Json(resp).into_response()
}

async fn all_docs(
    State(state): State<Shared>,
    Path(db): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock().unwrap();
    let Some(stub_db) = state.dbs.get(&db) else {
        return db_missing();
    };

    let include_docs = params.get("include_docs").map(String::as_str) == Some("true");
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let rows: Vec<Value> = stub_db
        .docs
        .iter()
        .take(limit)
        .map(|(id, doc)| {
            let rev = doc.get("_rev").cloned().unwrap_or(Value::Null);
            let mut row = json!({"id": id, "key": id, "value": {"rev": rev}});
            if include_docs {
                row["doc"] = doc.clone();
            }
            row
        })
        .collect();

    Json(json!({
        "total_rows": stub_db.docs.len(),
        "offset": 0,
        "rows": rows,
    }))
    .into_response()
}

async fn create_index(
    State(state): State<Shared>,
    Path(db): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let seq = state.next_seq();

    let Some(stub_db) = state.dbs.get_mut(&db) else {
        return db_missing();
    };

    let fields = body
        .get("index")
        .and_then(|i| i.get("fields"))
        .cloned()
        .unwrap_or(json!([]));
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{seq:x}-index"));

    let existing = stub_db
        .indexes
        .iter()
        .find(|idx| idx.get("def").and_then(|d| d.get("fields")) == Some(&fields));
    if let Some(existing) = existing {
        let ddoc = existing.get("ddoc").cloned().unwrap_or(Value::Null);
        let name = existing.get("name").cloned().unwrap_or(Value::Null);
        return Json(json!({"result": "exists", "id": ddoc, "name": name})).into_response();
    }

    let ddoc = format!("_design/{seq:x}");
    stub_db.indexes.push(json!({
        "ddoc": ddoc,
        "name": name,
        "type": "json",
        "def": {"fields": fields},
    }));
    Json(json!({"result": "created", "id": ddoc, "name": name})).into_response()
}

async fn list_indexes(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let state = state.lock().unwrap();
    let Some(stub_db) = state.dbs.get(&db) else {
        return db_missing();
    };

    // CouchDB always reports the built-in primary index first.
    let mut indexes = vec![json!({
        "ddoc": Value::Null,
        "name": "_all_docs",
        "type": "special",
        "def": {"fields": [{"_id": "asc"}]},
    })];
    indexes.extend(stub_db.indexes.iter().cloned());

    Json(json!({
        "total_rows": indexes.len(),
        "indexes": indexes,
    }))
    .into_response()
}
