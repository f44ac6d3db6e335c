// Integration tests for usrdir-manager

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use usrdir_manager::error::{Error, RemoteError};
use usrdir_manager::model::{RemoteCompany, RemoteUser, UserId, UserInput, UserPayload};
use usrdir_manager::remote::UserApi;

fn temp_path(tag: &str) -> String {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("udm_{tag}_{}_{}.conf", std::process::id(), nonce));
    path.to_string_lossy().to_string()
}

fn remote_user(id: u64, name: &str, company: &str) -> RemoteUser {
    RemoteUser {
        id: Some(id),
        name: Some(name.to_string()),
        email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        company: Some(RemoteCompany {
            name: Some(company.to_string()),
        }),
    }
}

/// In-memory API that records calls and can be told to fail.
#[derive(Default)]
struct FakeApi {
    users: Vec<RemoteUser>,
    fail: bool,
    create_id: Option<u64>,
    crash_on_create: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn with_users(users: Vec<RemoteUser>) -> Self {
        Self {
            users,
            create_id: Some(11),
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, call: String) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(RemoteError::Status {
                status: 500,
                url: "http://fake/users".into(),
            });
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserApi for FakeApi {
    async fn list(&self) -> Result<Vec<RemoteUser>, RemoteError> {
        self.record("list".into())?;
        Ok(self.users.clone())
    }

    async fn get(&self, id: u64) -> Result<RemoteUser, RemoteError> {
        self.record(format!("get {id}"))?;
        self.users
            .iter()
            .find(|u| u.id == Some(id))
            .cloned()
            .ok_or(RemoteError::Status {
                status: 404,
                url: format!("http://fake/users/{id}"),
            })
    }

    async fn create(&self, payload: &UserPayload) -> Result<RemoteUser, RemoteError> {
        self.record(format!("create {}", payload.name))?;
        if self.crash_on_create {
            panic!("create handler crashed");
        }
        Ok(RemoteUser {
            id: self.create_id,
            name: Some(payload.name.clone()),
            email: Some(payload.email.clone()),
            company: Some(payload.company.clone()),
        })
    }

    async fn update(&self, id: u64, payload: &UserPayload) -> Result<RemoteUser, RemoteError> {
        self.record(format!("update {id} {}", payload.name))?;
        Ok(RemoteUser {
            id: Some(id),
            name: Some(payload.name.clone()),
            ..RemoteUser::default()
        })
    }

    async fn delete(&self, id: u64) -> Result<(), RemoteError> {
        self.record(format!("delete {id}"))
    }
}

// 1) Theme config roundtrip and init
#[test]
fn theme_roundtrip_and_init() {
    use std::path::PathBuf;
    use usrdir_manager::app::Theme;

    let path = temp_path("theme");
    let t = Theme::mocha();
    t.write_file(&path).expect("write theme");
    let t2 = Theme::from_file(&path).expect("read theme");
    assert_eq!(t.text, t2.text);
    assert_eq!(t.title, t2.title);
    assert_eq!(t.error, t2.error);

    // Partial files keep defaults for missing keys.
    std::fs::write(&path, "title = #010203\nbogus = #FFFFFF\nborder = nonsense\n").unwrap();
    let t3 = Theme::from_file(&path).expect("read partial theme");
    assert_eq!(t3.title, ratatui::style::Color::Rgb(1, 2, 3));
    assert_eq!(t3.border, Theme::mocha().border);

    let init = temp_path("theme_init");
    let _ = std::fs::remove_file(&init);
    let _created = Theme::load_or_init(&init);
    assert!(PathBuf::from(&init).exists());

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&init);
}

// 2) Keybinds file written on first start and read back
#[test]
fn keymap_init_writes_loadable_file() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use usrdir_manager::app::keymap::{KeyAction, Keymap};

    let path = temp_path("keybinds");
    let _ = std::fs::remove_file(&path);
    let _ = Keymap::load_or_init(&path);
    let text = std::fs::read_to_string(&path).expect("keybinds written");
    assert!(text.contains("Refresh = r"));

    std::fs::write(&path, format!("{text}\nRefresh = Ctrl+l\n")).unwrap();
    let km = Keymap::load_or_init(&path);
    let key = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
    assert_eq!(km.resolve(&key), Some(KeyAction::Refresh));

    let _ = std::fs::remove_file(&path);
}

// 3) Store against an in-memory API
mod store_flow {
    use super::*;
    use usrdir_manager::store::{ActionTag, UserStore};

    #[tokio::test]
    async fn fetch_maps_remote_records() {
        let api = FakeApi::with_users(vec![
            remote_user(1, "Leanne Graham", "Romaguera-Crona"),
            remote_user(2, "Ervin Howell", "Deckow-Crist"),
        ]);
        let mut store = UserStore::new();
        assert_eq!(store.fetch_all(&api).await.unwrap(), 2);
        assert!(!store.loading());
        let first = &store.users()[0];
        assert_eq!(first.first_name, "Leanne");
        assert_eq!(first.last_name, "Graham");
        assert_eq!(first.department, "Romaguera-Crona");
    }

    #[tokio::test]
    async fn create_update_remove_round() {
        let api = FakeApi::with_users(vec![remote_user(1, "Leanne Graham", "Romaguera-Crona")]);
        let mut store = UserStore::new();
        store.fetch_all(&api).await.unwrap();

        let created = store
            .create(&api, UserInput::new("Ann", "Lee", "ann@example.com", "Ops"))
            .await
            .unwrap();
        assert_eq!(created.id, UserId::Remote(11));
        assert_eq!(store.users()[0].id, UserId::Remote(11));
        assert_eq!(store.action(), ActionTag::Idle);

        store
            .update(&api, UserId::Remote(1), UserInput::new("Lea", "Graham", "lea@example.com", "R&D"))
            .await
            .unwrap();
        let edited = store.get(UserId::Remote(1)).unwrap();
        assert_eq!(edited.first_name, "Lea");
        assert_eq!(edited.department, "R&D");

        store.remove(&api, UserId::Remote(11)).await.unwrap();
        assert!(store.get(UserId::Remote(11)).is_none());
        assert_eq!(store.users().len(), 1);

        assert_eq!(
            api.calls(),
            vec!["list", "create Ann Lee", "update 1 Lea Graham", "delete 11"]
        );
    }

    #[tokio::test]
    async fn pending_records_never_reach_the_api() {
        let api = FakeApi::with_users(Vec::new());
        let mut store = UserStore::new();
        let first = store
            .create(&api, UserInput::new("A", "", "a@x.io", ""))
            .await
            .unwrap();
        let second = store
            .create(&api, UserInput::new("B", "", "b@x.io", ""))
            .await
            .unwrap();
        assert_eq!(first.id, UserId::Remote(11));
        assert!(second.id.is_pending());

        store
            .update(&api, second.id, UserInput::new("Bee", "", "b@x.io", ""))
            .await
            .unwrap();
        store.remove(&api, second.id).await.unwrap();
        assert_eq!(api.calls(), vec!["create A", "create B"]);
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn failures_leave_dataset_untouched() {
        let good = FakeApi::with_users(vec![remote_user(1, "Leanne Graham", "Romaguera-Crona")]);
        let mut store = UserStore::new();
        store.fetch_all(&good).await.unwrap();
        let before = store.users().to_vec();

        let bad = FakeApi::failing();
        assert!(matches!(store.fetch_all(&bad).await, Err(Error::FetchFailed(_))));
        assert!(store.error().is_some());
        let err = store
            .create(&bad, UserInput::new("X", "", "x@x.io", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MutationFailed { action: "create", .. }));
        assert!(
            store
                .update(&bad, UserId::Remote(1), UserInput::new("Y", "", "y@x.io", ""))
                .await
                .is_err()
        );
        assert!(store.remove(&bad, UserId::Remote(1)).await.is_err());

        assert_eq!(store.users(), before.as_slice());
        assert!(store.action().is_idle());
    }

    #[tokio::test]
    async fn create_without_remote_id_gets_pending_id() {
        let api = FakeApi::default();
        let mut store = UserStore::new();
        let user = store
            .create(&api, UserInput::new("N", "", "n@x.io", ""))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::Pending(1));
        assert_eq!(user.id.to_string(), "local-1");
    }
}

// 4) HTTP client against a local server
mod http_client {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        routing::get,
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use usrdir_manager::remote::HttpUserApi;

    #[derive(Clone, Default)]
    struct ServerState {
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    async fn list_users() -> Json<Value> {
        Json(json!([
            {"id": 1, "name": "Leanne Graham", "username": "Bret", "email": "Sincere@april.biz",
             "company": {"name": "Romaguera-Crona", "bs": "harness"}},
            {"id": 2, "name": "Ervin Howell", "email": "Shanna@melissa.tv"}
        ]))
    }

    async fn get_user(Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
        if id == 1 {
            Ok(Json(json!({"id": 1, "name": "Leanne Graham"})))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn create_user(
        State(state): State<ServerState>,
        Json(mut body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        state.bodies.lock().unwrap().push(body.clone());
        body["id"] = json!(11);
        (StatusCode::CREATED, Json(body))
    }

    async fn update_user(
        State(state): State<ServerState>,
        Path(id): Path<u64>,
        Json(mut body): Json<Value>,
    ) -> Result<Json<Value>, StatusCode> {
        if id > 10 {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        state.bodies.lock().unwrap().push(body.clone());
        body["id"] = json!(id);
        Ok(Json(body))
    }

    async fn delete_user(Path(_id): Path<u64>) -> Json<Value> {
        Json(json!({}))
    }

    async fn spawn_server() -> (String, ServerState) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let state = ServerState::default();
        let app = Router::new()
            .route("/users", get(list_users).post(create_user))
            .route(
                "/users/:id",
                get(get_user).put(update_user).delete(delete_user),
            )
            .route("/broken/users", get(|| async { "not json" }))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), state)
    }

    fn client(base: &str) -> HttpUserApi {
        HttpUserApi::new(base, Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn list_and_get_decode_users() {
        let (base, _) = spawn_server().await;
        let api = client(&base);
        let users = api.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(
            users[0].company.as_ref().and_then(|c| c.name.as_deref()),
            Some("Romaguera-Crona")
        );
        assert!(users[1].company.is_none());

        let one = api.get(1).await.unwrap();
        assert_eq!(one.name.as_deref(), Some("Leanne Graham"));
    }

    #[tokio::test]
    async fn create_and_update_send_payload() {
        let (base, state) = spawn_server().await;
        let api = client(&base);
        let payload = UserPayload {
            name: "Ann Lee".into(),
            email: "ann@example.com".into(),
            company: RemoteCompany {
                name: Some("Ops".into()),
            },
        };
        let created = api.create(&payload).await.unwrap();
        assert_eq!(created.id, Some(11));
        assert_eq!(created.name.as_deref(), Some("Ann Lee"));

        let updated = api.update(3, &payload).await.unwrap();
        assert_eq!(updated.id, Some(3));

        let bodies = state.bodies.lock().unwrap().clone();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["company"]["name"], "Ops");
        assert_eq!(bodies[1]["email"], "ann@example.com");
    }

    #[tokio::test]
    async fn error_statuses_are_reported() {
        let (base, _) = spawn_server().await;
        let api = client(&base);
        match api.get(99).await {
            Err(RemoteError::Status { status, url }) => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/users/99"));
            }
            other => panic!("expected 404, got {other:?}"),
        }
        let payload = UserPayload {
            name: "X".into(),
            email: "x@x.io".into(),
            company: RemoteCompany::default(),
        };
        assert!(matches!(
            api.update(42, &payload).await,
            Err(RemoteError::Status { status: 500, .. })
        ));
        api.delete(5).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (base, _) = spawn_server().await;
        let api = client(&format!("{base}/broken"));
        assert!(matches!(api.list().await, Err(RemoteError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = client(&format!("http://{addr}"));
        assert!(matches!(api.list().await, Err(RemoteError::Request(_))));
    }
}

// 5) Controller driven through the worker bridge
mod bridge_flow {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Instant;
    use usrdir_manager::app::keymap::Keymap;
    use usrdir_manager::app::update::{
        apply_remote_event, drain_events, request_fetch, start_create, start_delete,
    };
    use usrdir_manager::app::{AppState, ModalState, Theme};
    use usrdir_manager::bridge::{Bridge, RemoteCommand, RemoteEvent};
    use usrdir_manager::query::PageSize;
    use usrdir_manager::store::ActionTag;

    fn app() -> AppState {
        AppState::new("http://fake", PageSize::Ten, Theme::mocha(), Keymap::default())
    }

    fn pump(app: &mut AppState, bridge: &Bridge) {
        let ev = bridge
            .events
            .recv_timeout(Duration::from_secs(5))
            .expect("worker answered");
        apply_remote_event(app, ev);
    }

    #[test]
    fn fetch_then_delete_through_worker() {
        let users = (1..=12)
            .map(|i| remote_user(i, &format!("User{i} Test"), "Ops"))
            .collect();
        let bridge = Bridge::launch(Arc::new(FakeApi::with_users(users)));
        let mut app = app();

        request_fetch(&mut app, &bridge.commands);
        assert!(app.store.loading());
        pump(&mut app, &bridge);
        assert!(!app.store.loading());
        assert_eq!(app.view.total_count, 12);
        assert_eq!(app.view.total_pages, 2);

        app.last_page();
        assert_eq!(app.view.items.len(), 2);
        let target = app.view.items[1].id;
        start_delete(&mut app, target, &bridge.commands);
        pump(&mut app, &bridge);
        assert!(app.store.get(target).is_none());
        assert!(app.store.action().is_idle());
        assert_eq!(app.query.page, 2);

        // Removing the last row of page 2 snaps back to page 1.
        let last = app.view.items[0].id;
        start_delete(&mut app, last, &bridge.commands);
        pump(&mut app, &bridge);
        assert_eq!(app.query.page, 1);
        assert_eq!(app.view.total_pages, 1);
    }

    #[test]
    fn failed_mutation_surfaces_notice() {
        let bridge = Bridge::launch(Arc::new(FakeApi::failing()));
        let mut app = app();
        request_fetch(&mut app, &bridge.commands);
        pump(&mut app, &bridge);
        assert!(app.store.error().is_some());
        assert!(app.modal.is_none());

        app.store
            .begin(ActionTag::Adding)
            .unwrap();
        bridge
            .commands
            .send(RemoteCommand::Create {
                input: UserInput::new("A", "", "a@x.io", ""),
            })
            .unwrap();
        pump(&mut app, &bridge);
        assert!(matches!(app.modal, Some(ModalState::Info { .. })));
        assert!(app.store.action().is_idle());
        assert!(app.store.users().is_empty());
    }

    #[test]
    fn worker_crash_mid_create_returns_to_idle() {
        let api = FakeApi {
            crash_on_create: true,
            ..FakeApi::default()
        };
        let bridge = Bridge::launch(Arc::new(api));
        let mut app = app();

        start_create(&mut app, UserInput::new("A", "", "a@x.io", ""), &bridge.commands);
        assert_eq!(app.store.action(), ActionTag::Adding);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !app.store.action().is_idle() && Instant::now() < deadline {
            drain_events(&mut app, &bridge.events);
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(app.store.action().is_idle(), "tag stuck at {:?}", app.store.action());
        assert!(app.in_flight.is_none());
        assert!(app.store.users().is_empty());
        assert!(matches!(app.modal, Some(ModalState::Info { .. })));

        // The next mutation is accepted again.
        app.close_modal();
        assert!(app.store.begin(ActionTag::Editing).is_ok());
    }

    #[test]
    fn second_refresh_while_loading_is_ignored() {
        let (tx, rx) = unbounded();
        let mut app = app();
        request_fetch(&mut app, &tx);
        request_fetch(&mut app, &tx);
        assert_eq!(rx.try_iter().count(), 1);

        apply_remote_event(&mut app, RemoteEvent::Fetched(Ok(Vec::new())));
        assert!(!app.store.loading());
        assert_eq!(app.view.total_count, 0);
    }
}
