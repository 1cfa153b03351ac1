//! Application state and logic

use std::sync::Arc;

use papshop_core::{
    ApiClient, ApiError, Config, FileTokenStore, LoginForm, LoginOutcome, LogoutOutcome, Navigator,
    Resource, Route, Session, SessionError, TokenStore,
};
use serde_json::Value;
use tokio::sync::{mpsc, watch};

/// Application result for main loop
pub enum AppResult {
    Continue,
    Quit,
}

/// Status message severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Login form field with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Password,
}

/// Completion of a background request
pub enum AppEvent {
    LoginFinished(Result<(), SessionError>),
    LoggedOut(LogoutOutcome),
    Loaded {
        resource: Resource,
        result: Result<Value, ApiError>,
    },
    Deleted {
        resource: Resource,
        id: u64,
        result: Result<(), ApiError>,
    },
}

/// One line of a resource listing
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: Option<u64>,
    pub label: String,
    pub detail: String,
}

/// Record awaiting delete confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelete {
    pub resource: Resource,
    pub id: u64,
}

/// Main application struct
pub struct App {
    pub config: Config,
    pub session: Arc<Session<ApiClient>>,
    pub logged_in: watch::Receiver<bool>,
    pub nav: Navigator,

    // Login screen
    pub login: LoginForm,
    pub focus: Field,

    // Resource screens
    pub rows: Vec<Row>,
    pub cursor: usize,
    pub loading: bool,
    pub confirm: Option<PendingDelete>,

    pub status: Option<(String, StatusLevel)>,

    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

/// Listing behind a screen
pub fn resource_for(route: Route) -> Option<Resource> {
    match route {
        Route::Login => None,
        Route::Dashboard => Some(Resource::DashboardStats),
        Route::Products => Some(Resource::Products),
        Route::Categories => Some(Resource::Categories),
        Route::Orders => Some(Resource::Orders),
        Route::Users => Some(Resource::Users),
        Route::Announcements => Some(Resource::Announcements),
    }
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenStore> = Arc::new(match config.session.token_path {
            Some(ref path) => FileTokenStore::new(path),
            None => FileTokenStore::default_location()?,
        });
        let api = ApiClient::from_config(&config.api, Arc::clone(&tokens))?;
        tracing::info!("Backend API: {}", api.base_url());

        Ok(Self::with_session(config, Session::new(api, tokens)))
    }

    pub fn with_session(config: Config, session: Session<ApiClient>) -> Self {
        let session = Arc::new(session);
        let logged_in = session.subscribe();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            config,
            session,
            logged_in,
            nav: Navigator::new(),
            login: LoginForm::new(),
            focus: Field::Identifier,
            rows: Vec::new(),
            cursor: 0,
            loading: false,
            confirm: None,
            status: None,
            events_tx,
            events_rx,
        };

        // The empty path opens the default screen, guard permitting
        app.go_to(Route::DEFAULT);
        app
    }

    /// Whether the navigation bar is shown
    pub fn is_logged_in(&self) -> bool {
        *self.logged_in.borrow()
    }

    /// Navigate through the guard and load the screen's listing
    pub fn go_to(&mut self, route: Route) {
        let shown = self.nav.navigate(&self.session, route);
        self.rows.clear();
        self.cursor = 0;
        self.confirm = None;

        if shown == Route::Login {
            self.loading = false;
        } else {
            self.refresh();
        }
    }

    /// Move to the neighbouring protected screen
    pub fn cycle_screen(&mut self, forward: bool) {
        let screens = Route::PROTECTED;
        let pos = screens
            .iter()
            .position(|r| *r == self.nav.current())
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % screens.len()
        } else {
            (pos + screens.len() - 1) % screens.len()
        };
        self.go_to(screens[next]);
    }

    /// Re-fetch the current screen's listing
    pub fn refresh(&mut self) {
        let Some(resource) = resource_for(self.nav.current()) else {
            return;
        };

        self.loading = true;
        let session = Arc::clone(&self.session);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = session.api().fetch(resource).await;
            let _ = tx.send(AppEvent::Loaded { resource, result });
        });
    }

    /// Start the login request unless the form is invalid or already busy
    pub fn submit_login(&mut self) {
        let credentials = match self.login.begin() {
            Ok(credentials) => credentials,
            Err(outcome) => {
                tracing::debug!("Login not sent: {:?}", outcome);
                return;
            }
        };

        let session = Arc::clone(&self.session);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = session.login(&credentials).await;
            let _ = tx.send(AppEvent::LoginFinished(result));
        });
    }

    pub fn logout(&mut self) {
        let session = Arc::clone(&self.session);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = session.logout().await;
            let _ = tx.send(AppEvent::LoggedOut(outcome));
        });
    }

    /// Ask for confirmation before deleting the row under the cursor
    pub fn request_delete(&mut self) {
        let Some(resource) = resource_for(self.nav.current()) else {
            return;
        };
        let Some(id) = self.current_row().and_then(|row| row.id) else {
            return;
        };

        if resource.delete_path(id).is_none() {
            self.set_status(format!("{} cannot be deleted", resource), StatusLevel::Info);
            return;
        }

        self.confirm = Some(PendingDelete { resource, id });
    }

    pub fn confirm_delete(&mut self) {
        let Some(PendingDelete { resource, id }) = self.confirm.take() else {
            return;
        };

        let session = Arc::clone(&self.session);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = session.api().delete(resource, id).await;
            let _ = tx.send(AppEvent::Deleted { resource, id, result });
        });
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.cursor)
    }

    pub fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.status = Some((message.into(), level));
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Apply completed background requests and session changes
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        if self.logged_in.has_changed().unwrap_or(false) {
            let logged_in = *self.logged_in.borrow_and_update();
            if !logged_in && self.nav.current() != Route::Login {
                self.go_to(Route::Login);
            }
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoginFinished(result) => {
                if let LoginOutcome::Success { redirect } = self.login.finish(result) {
                    self.focus = Field::Identifier;
                    self.go_to(redirect);
                }
            }
            AppEvent::LoggedOut(outcome) => {
                let message = match outcome {
                    LogoutOutcome::Remote => "Đã đăng xuất",
                    LogoutOutcome::LocalOnly => "Đã đăng xuất (máy chủ không phản hồi)",
                };
                self.set_status(message, StatusLevel::Info);
                self.login.reset();
                self.focus = Field::Identifier;
                self.go_to(Route::Login);
            }
            AppEvent::Loaded { resource, result } => {
                // Ignore responses for a screen we already left
                if resource_for(self.nav.current()) != Some(resource) {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(body) => {
                        self.rows = rows_from_json(&body);
                        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
                    }
                    Err(e) => self.handle_api_error(e),
                }
            }
            AppEvent::Deleted { resource, id, result } => match result {
                Ok(()) => {
                    self.set_status(format!("Deleted {} #{}", resource, id), StatusLevel::Success);
                    if resource_for(self.nav.current()) == Some(resource) {
                        self.refresh();
                    }
                }
                Err(e) => self.handle_api_error(e),
            },
        }
    }

    fn handle_api_error(&mut self, e: ApiError) {
        tracing::warn!("API request failed: {}", e);
        if e.is_unauthorized() {
            // The backend is authoritative: drop the local session
            self.session.logout_local();
            self.login.reset();
            self.go_to(Route::Login);
        }
        self.set_status(e.to_string(), StatusLevel::Error);
    }
}

const LABEL_KEYS: [&str; 6] = ["name", "title", "username", "fullName", "email", "message"];
const DETAIL_KEYS: [&str; 5] = ["status", "price", "totalAmount", "role", "createdAt"];

/// Flatten a listing body into display rows.
///
/// Arrays (or paged bodies with a `content` array) give one row per item;
/// other objects give one row per field.
pub fn rows_from_json(body: &Value) -> Vec<Row> {
    let items = match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("content").and_then(Value::as_array),
        _ => None,
    };

    if let Some(items) = items {
        return items.iter().map(item_row).collect();
    }

    match body {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Row {
                id: None,
                label: key.clone(),
                detail: scalar_text(value),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![Row {
            id: None,
            label: scalar_text(other),
            detail: String::new(),
        }],
    }
}

fn item_row(item: &Value) -> Row {
    let id = item.get("id").and_then(Value::as_u64);
    let label = LABEL_KEYS
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(String::from)
        .unwrap_or_else(|| scalar_text(item));
    let detail = DETAIL_KEYS
        .iter()
        .filter_map(|key| item.get(*key).map(scalar_text))
        .collect::<Vec<_>>()
        .join("  ");

    Row { id, label, detail }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papshop_core::MemoryTokenStore;
    use serde_json::json;

    const ADMIN_TOKEN: &str = "abc.eyJzY29wZSI6IkFETUlOIn0=.sig";

    /// App restored from a stored admin token, opened on the dashboard.
    ///
    /// Background requests target a closed port and are only applied on
    /// `tick`, so tests drive `handle_event` directly.
    fn admin_app() -> (App, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::with_token(ADMIN_TOKEN));
        let api = ApiClient::new("http://127.0.0.1:9/api", store.clone());
        let app = App::with_session(Config::default(), Session::new(api, store.clone()));
        assert_eq!(app.nav.current(), Route::Dashboard);
        (app, store)
    }

    fn sample_rows() -> Vec<Row> {
        vec![Row {
            id: Some(7),
            label: "Ưu đãi".to_string(),
            detail: "ACTIVE".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_unauthorized_listing_tears_down_session() {
        let (mut app, store) = admin_app();
        app.rows = sample_rows();

        app.handle_event(AppEvent::Loaded {
            resource: Resource::DashboardStats,
            result: Err(ApiError::Unauthorized("/dashboard/stats".to_string())),
        });

        assert!(!app.session.is_logged_in());
        assert!(!app.session.is_admin());
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(app.nav.current(), Route::Login);
        assert!(app.rows.is_empty());
        assert!(matches!(app.status, Some((_, StatusLevel::Error))));
    }

    #[tokio::test]
    async fn test_unauthorized_delete_tears_down_session() {
        let (mut app, _store) = admin_app();
        app.go_to(Route::Products);

        app.handle_event(AppEvent::Deleted {
            resource: Resource::Products,
            id: 1,
            result: Err(ApiError::Unauthorized("/products/1".to_string())),
        });

        assert!(!app.session.is_logged_in());
        assert_eq!(app.nav.current(), Route::Login);
    }

    #[tokio::test]
    async fn test_late_listing_for_another_screen_is_dropped() {
        let (mut app, _store) = admin_app();
        app.rows = sample_rows();

        app.handle_event(AppEvent::Loaded {
            resource: Resource::Products,
            result: Ok(json!([{"id": 1, "name": "iPhone 15"}])),
        });
        assert_eq!(app.rows, sample_rows());
        assert!(app.loading);

        // A stale failure must not log the operator out either
        app.handle_event(AppEvent::Loaded {
            resource: Resource::Users,
            result: Err(ApiError::Unauthorized("/user".to_string())),
        });
        assert!(app.session.is_logged_in());
        assert_eq!(app.nav.current(), Route::Dashboard);
        assert_eq!(app.rows, sample_rows());

        app.handle_event(AppEvent::Loaded {
            resource: Resource::DashboardStats,
            result: Ok(json!({"totalOrders": 2})),
        });
        assert!(!app.loading);
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.rows[0].label, "totalOrders");
    }

    #[tokio::test]
    async fn test_logged_out_resets_form_and_returns_to_login() {
        let (mut app, _store) = admin_app();
        app.login.identifier = "admin@pap.com".to_string();
        app.login.password = "admin123".to_string();
        app.focus = Field::Password;

        app.handle_event(AppEvent::LoggedOut(LogoutOutcome::LocalOnly));

        assert_eq!(app.nav.current(), Route::Login);
        assert!(app.login.identifier.is_empty());
        assert!(app.login.password.is_empty());
        assert_eq!(app.focus, Field::Identifier);
        assert!(matches!(app.status, Some((_, StatusLevel::Info))));
    }

    #[tokio::test]
    async fn test_tick_follows_session_flag() {
        let (mut app, _store) = admin_app();
        assert!(app.is_logged_in());

        app.session.logout_local();
        app.tick();

        assert!(!app.is_logged_in());
        assert_eq!(app.nav.current(), Route::Login);
    }

    #[test]
    fn test_rows_from_array() {
        let rows = rows_from_json(&json!([
            {"id": 1, "name": "iPhone 15", "price": 25000000},
            {"id": 2, "title": "Sale", "status": "ACTIVE"},
            {"sku": "X"}
        ]));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, Some(1));
        assert_eq!(rows[0].label, "iPhone 15");
        assert_eq!(rows[0].detail, "25000000");
        assert_eq!(rows[1].label, "Sale");
        assert_eq!(rows[1].detail, "ACTIVE");
        assert_eq!(rows[2].id, None);
        assert_eq!(rows[2].label, r#"{"sku":"X"}"#);
    }

    #[test]
    fn test_rows_from_paged_body() {
        let rows = rows_from_json(&json!({"content": [{"id": 9, "email": "a@b.c"}], "totalPages": 1}));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "a@b.c");
    }

    #[test]
    fn test_rows_from_stats_object() {
        let rows = rows_from_json(&json!({"totalOrders": 12, "totalRevenue": 1500.5}));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.label == "totalOrders" && r.detail == "12"));
    }

    #[test]
    fn test_every_protected_screen_has_a_listing() {
        for route in Route::PROTECTED {
            assert!(resource_for(route).is_some());
        }
        assert_eq!(resource_for(Route::Login), None);
    }
}
