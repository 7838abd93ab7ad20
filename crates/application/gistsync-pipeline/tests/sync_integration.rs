use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use camino::Utf8PathBuf;
use chrono::{Duration, TimeZone, Utc};
use gistsync_core::{ChangeState, Visibility};
use gistsync_infra::GistApiError;
use gistsync_pipeline::{
    default_engine, PushOutcome, SyncContext, SyncError, SyncOutcome,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

const TOKEN: &str = "secret";

struct MockGist {
    description: String,
    public: bool,
    revision: i64,
    files: BTreeMap<String, String>,
}

#[derive(Default)]
struct MockState {
    base: String,
    gists: BTreeMap<String, MockGist>,
    patches: usize,
    next_id: usize,
}

type Shared = Arc<Mutex<MockState>>;

fn gist_json(base: &str, id: &str, g: &MockGist) -> Value {
    let updated = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(g.revision);
    let files: Map<String, Value> = g
        .files
        .iter()
        .map(|(name, text)| {
            (
                name.clone(),
                json!({
                    "filename": name,
                    "raw_url": format!("{base}/raw/{id}/{name}"),
                    "size": text.len(),
                }),
            )
        })
        .collect();
    json!({
        "id": id,
        "description": g.description,
        "public": g.public,
        "html_url": format!("https://gist.example/{id}"),
        "updated_at": updated.to_rfc3339(),
        "files": files,
        "history": [{ "version": format!("rev-{}", g.revision) }],
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == format!("Bearer {TOKEN}"))
}

async fn list_gists(State(s): State<Shared>) -> Json<Value> {
    let s = s.lock().unwrap();
    let items: Vec<Value> = s
        .gists
        .iter()
        .map(|(id, g)| {
            let mut v = gist_json(&s.base, id, g);
            v.as_object_mut().unwrap().remove("history");
            v
        })
        .collect();
    Json(Value::Array(items))
}

async fn create_gist(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = s.lock().unwrap();
    s.next_id += 1;
    let id = format!("created{}", s.next_id);
    let files = body["files"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v["content"].as_str().unwrap().to_string()))
        .collect();
    let gist = MockGist {
        description: body["description"].as_str().unwrap_or_default().to_string(),
        public: body["public"].as_bool().unwrap(),
        revision: 1,
        files,
    };
    let out = gist_json(&s.base, &id, &gist);
    s.gists.insert(id, gist);
    (StatusCode::CREATED, Json(out)).into_response()
}

async fn get_gist(State(s): State<Shared>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let s = s.lock().unwrap();
    match s.gists.get(&id) {
        Some(g) => Json(gist_json(&s.base, &id, g)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn edit_gist(
    State(s): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut guard = s.lock().unwrap();
    let s = &mut *guard;
    s.patches += 1;
    let Some(g) = s.gists.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    for (name, change) in body["files"].as_object().unwrap() {
        if change.is_null() {
            g.files.remove(name);
        } else {
            g.files
                .insert(name.clone(), change["content"].as_str().unwrap().to_string());
        }
    }
    g.revision += 1;
    Json(gist_json(&s.base, &id, g)).into_response()
}

async fn raw_file(State(s): State<Shared>, Path((id, name)): Path<(String, String)>) -> Response {
    let s = s.lock().unwrap();
    match s.gists.get(&id).and_then(|g| g.files.get(&name)) {
        Some(text) => text.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_server(state: Shared) -> tokio::task::JoinHandle<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    state.lock().unwrap().base = format!("http://{addr}");

    let app = Router::new()
        .route("/gists", get(list_gists).post(create_gist))
        .route("/gists/:id", get(get_gist).patch(edit_gist))
        .route("/raw/:id/:name", get(raw_file))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    })
}

fn context(state: &Shared, token: &str) -> SyncContext {
    SyncContext {
        token: token.to_string(),
        api_url: state.lock().unwrap().base.clone(),
    }
}

fn seed(state: &Shared, id: &str, description: &str, files: &[(&str, &str)]) {
    state.lock().unwrap().gists.insert(
        id.to_string(),
        MockGist {
            description: description.to_string(),
            public: false,
            revision: 1,
            files: files
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect(),
        },
    );
}

#[tokio::test]
async fn init_edit_sync_and_pull_back() {
    let state: Shared = Arc::default();
    let handle = start_server(state.clone()).await;
    seed(&state, "abc123", "Shell snippets", &[("a.txt", "hi"), ("b.sh", "echo")]);

    let tmp = tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    let engine = default_engine(&context(&state, TOKEN)).unwrap();

    let pulled = engine.init(&root, "snippets").await.unwrap();
    let dir = root.join("abc123");
    assert_eq!(pulled.dir, dir);
    assert_eq!(pulled.version.as_deref(), Some("rev-1"));
    assert_eq!(std::fs::read_to_string(dir.join("a.txt")).unwrap(), "hi");
    assert_eq!(engine.check(&dir).await.unwrap().state, ChangeState::NoChange);

    std::fs::write(dir.join("a.txt"), "hello").unwrap();
    let report = engine.sync(&dir).await.unwrap();
    assert!(matches!(report.outcome, SyncOutcome::Pushed(_)));
    {
        let s = state.lock().unwrap();
        assert_eq!(s.patches, 1);
        assert_eq!(s.gists["abc123"].files["a.txt"], "hello");
    }

    {
        let mut s = state.lock().unwrap();
        let g = s.gists.get_mut("abc123").unwrap();
        g.files.insert("c.md".into(), "# new".into());
        g.revision += 1;
    }
    let report = engine.sync(&dir).await.unwrap();
    assert!(matches!(report.outcome, SyncOutcome::Pulled(ref p) if p.files == 3));
    assert_eq!(std::fs::read_to_string(dir.join("c.md")).unwrap(), "# new");
    assert_eq!(engine.check(&dir).await.unwrap().state, ChangeState::NoChange);

    handle.abort();
}

#[tokio::test]
async fn push_without_snapshot_creates_public_gist() {
    let state: Shared = Arc::default();
    let handle = start_server(state.clone()).await;

    let tmp = tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    std::fs::write(dir.join("readme.md"), "shared").unwrap();
    let engine = default_engine(&context(&state, TOKEN)).unwrap();

    let outcome = engine.push(&dir, Visibility::Public).await.unwrap();
    let PushOutcome::Created(created) = outcome else {
        panic!("expected a new gist, got {outcome:?}");
    };
    {
        let s = state.lock().unwrap();
        let gist = &s.gists[&created.gist_id];
        assert!(gist.public);
        assert_eq!(gist.files["readme.md"], "shared");
    }
    assert!(engine.is_synced(&dir));
    assert_eq!(engine.check(&dir).await.unwrap().state, ChangeState::NoChange);

    handle.abort();
}

#[tokio::test]
async fn rejected_token_surfaces_as_remote_error() {
    let state: Shared = Arc::default();
    let handle = start_server(state.clone()).await;
    seed(&state, "abc123", "", &[("a.txt", "hi")]);

    let tmp = tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    let engine = default_engine(&context(&state, "wrong")).unwrap();

    let err = engine.init(&root, "abc123").await.unwrap_err();
    assert!(
        matches!(err, SyncError::Remote(GistApiError::Unauthorized(401))),
        "{err:?}"
    );
    assert!(!root.join("abc123").exists());

    handle.abort();
}

#[tokio::test]
async fn deleted_gist_is_remote_not_found() {
    let state: Shared = Arc::default();
    let handle = start_server(state.clone()).await;
    seed(&state, "gone", "", &[("a.txt", "hi")]);

    let tmp = tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    let engine = default_engine(&context(&state, TOKEN)).unwrap();
    engine.init(&root, "gone").await.unwrap();
    state.lock().unwrap().gists.clear();

    let err = engine.pull(&root.join("gone")).await.unwrap_err();
    assert!(matches!(err, SyncError::RemoteNotFound(ref id) if id == "gone"), "{err:?}");
    assert_eq!(
        std::fs::read_to_string(root.join("gone").join("a.txt")).unwrap(),
        "hi"
    );

    handle.abort();
}
