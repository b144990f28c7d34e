use std::io;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use pagewise::{
    api::create_router,
    config::{DatabaseConfig, Environment, LoggingConfig, ServerConfig},
    AppState, Config,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt as _;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_config() -> Config {
    Config {
        environment: Environment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 10,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            create_schema: true,
            count_strategy: None,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            json: false,
        },
    }
}

impl TestApp {
    /// Fresh in-memory database with the schema in place and no rows.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> anyhow::Result<Self> {
        let state = AppState::new(config)
            .await
            .context("initialize AppState")?;
        let router = create_router(state.clone());
        Ok(Self { router, state })
    }

    pub fn pool(&self) -> anyhow::Result<&SqlitePool> {
        self.state.sqlite_pool().context("test app runs on SQLite")
    }

    pub async fn insert_customer(
        &self,
        store_id: i64,
        name: &str,
        phone: Option<&str>,
        phone_backup: Option<&str>,
    ) -> anyhow::Result<i64> {
        let email = format!("{}@example.org", name.to_lowercase().replace(' ', "."));
        let result = sqlx::query(
            "INSERT INTO customers (store_id, name, email, phone, phone_backup) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(store_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(phone_backup)
        .execute(self.pool()?)
        .await
        .context("insert customer")?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_package(&self, customer_id: i64, status: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO packages (customer_id, status) VALUES (?, ?)")
            .bind(customer_id)
            .bind(status)
            .execute(self.pool()?)
            .await
            .context("insert package")?;
        Ok(())
    }

    pub async fn get(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.get_with_headers(path_and_query, &[]).await
    }

    pub async fn get_with_headers(
        &self,
        path_and_query: &str,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut request = Request::builder()
            .method(Method::GET)
            .uri(path_and_query)
            .header("host", "example.org")
            .header("accept", "application/json")
            .body(Body::empty())
            .context("build request")?;

        for (name, value) in extra_headers {
            request.headers_mut().insert(
                name.parse::<HeaderName>().context("parse header name")?,
                value.parse::<HeaderValue>().context("parse header value")?,
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    pub async fn get_json(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, body) = self.get(path_and_query).await?;
        let json = serde_json::from_slice(&body)
            .with_context(|| format!("response body is JSON: {}", String::from_utf8_lossy(&body)))?;
        Ok((status, json))
    }
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {context}");
}

/// Names in `data`, in response order.
pub fn customer_names(body: &Value) -> anyhow::Result<Vec<String>> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .context("data is an array")?;
    data.iter()
        .map(|c| {
            c.get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .context("customer has a name")
        })
        .collect()
}

pub fn error_message(body: &Value) -> Option<&str> {
    body.pointer("/error/message").and_then(Value::as_str)
}

/// Collects formatted log lines emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Start capturing at debug level until the guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
