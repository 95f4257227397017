#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tradebook_server::config::Config;
use tradebook_sheets::{
    AppendOutcome, ClearOutcome, InsertDataOption, Row, SheetsError, SpreadsheetClient,
    ValueInputOption,
};

/// One recorded append call.
#[derive(Debug, Clone)]
pub struct Appended {
    pub range: String,
    pub rows: Vec<Row>,
    pub input: ValueInputOption,
    pub insert: InsertDataOption,
}

/// In-memory spreadsheet keyed by range prefix.
#[derive(Default)]
pub struct FakeSheets {
    pub users: Mutex<Vec<Row>>,
    pub units: Mutex<Vec<Row>>,
    pub appended: Mutex<Vec<Appended>>,
    pub cleared: Mutex<Vec<String>>,
    pub user_queries: AtomicUsize,
    pub failing: AtomicBool,
}

impl FakeSheets {
    pub fn with_users(users: &[(&str, &str)]) -> Arc<Self> {
        let fake = Self::default();
        *fake.users.lock().unwrap() = users.iter().map(|(u, p)| vec![json!(u), json!(p)]).collect();
        *fake.units.lock().unwrap() = vec![
            vec![json!("alice"), json!(40)],
            vec![json!("bob"), json!("-5")],
        ];
        Arc::new(fake)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, operation: &'static str) -> tradebook_sheets::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SheetsError::NullResponse(operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SpreadsheetClient for FakeSheets {
    async fn query(&self, _sheet_id: &str, range: &str) -> tradebook_sheets::Result<Vec<Row>> {
        self.check("get")?;
        if range.starts_with("Users") {
            self.user_queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.users.lock().unwrap().clone())
        } else if range.starts_with("Units") {
            Ok(self.units.lock().unwrap().clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn append(
        &self,
        _sheet_id: &str,
        range: &str,
        rows: Vec<Row>,
        input: ValueInputOption,
        insert: InsertDataOption,
    ) -> tradebook_sheets::Result<AppendOutcome> {
        self.check("append")?;
        let updated_rows = rows.len() as u64;
        self.appended.lock().unwrap().push(Appended {
            range: range.to_string(),
            rows,
            input,
            insert,
        });
        Ok(AppendOutcome {
            updated_range: Some(range.to_string()),
            updated_rows,
        })
    }

    async fn clear(&self, _sheet_id: &str, range: &str) -> tradebook_sheets::Result<ClearOutcome> {
        self.check("clear")?;
        self.cleared.lock().unwrap().push(range.to_string());
        Ok(ClearOutcome {
            cleared_range: Some(range.to_string()),
        })
    }
}

/// Default configuration pointed at the fake spreadsheet
pub fn test_config() -> Config {
    Config {
        spreadsheet_id: "sheet-1".to_string(),
        static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string(),
        ..Config::default()
    }
}

/// Helper to create app with the default test configuration
pub fn create_test_app(sheets: Arc<FakeSheets>) -> axum::Router {
    tradebook_server::create_app(sheets, &test_config())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Helper to send a request and get response
pub async fn send_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    form: Option<&str>,
    credentials: Option<(&str, &str)>,
) -> TestResponse {
    send_with_headers(app, method, uri, form, credentials, &[]).await
}

pub async fn send_with_headers(
    app: &axum::Router,
    method: &str,
    uri: &str,
    form: Option<&str>,
    credentials: Option<(&str, &str)>,
    extra_headers: &[(&str, &str)],
) -> TestResponse {
    let mut request_builder = Request::builder().uri(uri).method(method);

    // Add Authorization header if provided
    if let Some((user, password)) = credentials {
        let encoded = STANDARD.encode(format!("{user}:{password}"));
        request_builder = request_builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
    }
    for (name, value) in extra_headers {
        request_builder = request_builder.header(*name, *value);
    }

    let request = if let Some(form) = form {
        request_builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body_bytes).into_owned(),
    }
}

pub fn cell(row: &Row, index: usize) -> &Value {
    &row[index]
}
