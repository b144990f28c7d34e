#[allow(unused)]
mod support;

use axum::http::StatusCode;
use pagewise::config::Environment;
use support::{assert_status, customer_names, error_message, test_config, LogCapture, TestApp};

/// Store 1:
/// - "Active 01".."Active 50": phone 555-1234 (every fifth one only as the
///   backup phone), at least one in-flight package, some with two
/// - "Dormant 01".."Dormant 10": phone 555-1234, only delivered packages
/// - "Elsewhere 01".."Elsewhere 10": in flight, different phone
///
/// Store 2:
/// - "Active 00": phone 555-1234, in flight
async fn seed_store(app: &TestApp) -> anyhow::Result<()> {
    for n in 1..=50 {
        let name = format!("Active {:02}", n);
        let id = if n % 5 == 0 {
            app.insert_customer(1, &name, Some("555-0000"), Some("555-1234"))
                .await?
        } else {
            app.insert_customer(1, &name, Some("555-1234"), None).await?
        };
        app.insert_package(id, "SORTED").await?;
        if n % 3 == 0 {
            app.insert_package(id, "OUT_FOR_DELIVERY").await?;
        }
    }
    for n in 1..=10 {
        let id = app
            .insert_customer(1, &format!("Dormant {:02}", n), Some("555-1234"), None)
            .await?;
        app.insert_package(id, "DELIVERED").await?;
    }
    for n in 1..=10 {
        let id = app
            .insert_customer(1, &format!("Elsewhere {:02}", n), Some("555-9876"), None)
            .await?;
        app.insert_package(id, "CREATED").await?;
    }
    let id = app
        .insert_customer(2, "Active 00", Some("555-1234"), None)
        .await?;
    app.insert_package(id, "PICKED_UP").await?;
    Ok(())
}

#[tokio::test]
async fn second_page_of_active_customers_matching_a_phone() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    seed_store(&app).await?;

    let (status, body) = app
        .get_json(
            "/stores/1/customers?scopes=Active&terms=555-1234&sort=name-asc&pageIndex=2&itemsPerPage=20",
        )
        .await?;
    assert_status(status, StatusCode::OK, "active customer search");

    let expected: Vec<String> = (21..=40).map(|n| format!("Active {:02}", n)).collect();
    assert_eq!(customer_names(&body)?, expected);

    let page_info = &body["searchParams"]["pageInfo"];
    assert_eq!(page_info["pageIndex"], 2);
    assert_eq!(page_info["itemsPerPage"], 20);
    assert_eq!(page_info["totalItemCount"], 50);
    assert_eq!(page_info["totalPageCount"], 3);
    assert_eq!(body["searchParams"]["terms"][0], "555-1234");
    assert_eq!(body["message"], "");
    Ok(())
}

#[tokio::test]
async fn customer_fields_are_camel_case_with_nulls() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    seed_store(&app).await?;

    let (status, body) = app
        .get_json("/stores/2/customers?scopes=All&sort=name-asc")
        .await?;
    assert_status(status, StatusCode::OK, "store 2 listing");

    let customer = &body["data"][0];
    assert_eq!(customer["name"], "Active 00");
    assert_eq!(customer["storeId"], 2);
    assert_eq!(customer["email"], "active.00@example.org");
    assert!(customer["phoneBackup"].is_null());
    assert_eq!(body["searchParams"]["pageInfo"]["totalItemCount"], 1);
    Ok(())
}

#[tokio::test]
async fn name_terms_match_name_or_email_across_stores() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    seed_store(&app).await?;

    let (status, body) = app
        .get_json("/customers?scopes=All&terms=dormant.0&sort=name-desc&itemsPerPage=250")
        .await?;
    assert_status(status, StatusCode::OK, "email term");
    let names = customer_names(&body)?;
    assert_eq!(names.len(), 9);
    assert_eq!(names.first().map(String::as_str), Some("Dormant 09"));

    let (_, body) = app
        .get_json("/customers?scopes=Active&terms=Active&sort=name-asc")
        .await?;
    assert_eq!(body["searchParams"]["pageInfo"]["totalItemCount"], 51);
    assert_eq!(body["searchParams"]["pageInfo"]["itemsPerPage"], 100);
    Ok(())
}

#[tokio::test]
async fn page_size_is_clamped() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    seed_store(&app).await?;

    let (status, body) = app
        .get_json("/customers?scopes=All&sort=name-asc&itemsPerPage=5")
        .await?;
    assert_status(status, StatusCode::OK, "small page");
    assert_eq!(body["searchParams"]["pageInfo"]["itemsPerPage"], 20);
    assert_eq!(customer_names(&body)?.len(), 20);
    assert_eq!(body["searchParams"]["pageInfo"]["totalItemCount"], 71);
    assert_eq!(body["searchParams"]["pageInfo"]["totalPageCount"], 4);
    Ok(())
}

#[tokio::test]
async fn missing_or_extra_scopes_are_bad_requests() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.get_json("/customers?sort=name-asc").await?;
    assert_status(status, StatusCode::BAD_REQUEST, "no scope");
    assert_eq!(error_message(&body), Some("No scope specified."));
    assert_eq!(body["error"]["code"], 400);

    let (status, body) = app
        .get_json("/customers?scopes=All,Active&sort=name-asc")
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "two scopes");
    assert_eq!(
        error_message(&body),
        Some("We currently only support a single scope.")
    );

    let (status, body) = app
        .get_json("/customers?scopes=Archived&sort=name-asc")
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "unknown scope");
    assert_eq!(error_message(&body), Some("Found unknown scope: 'Archived'."));
    Ok(())
}

#[tokio::test]
async fn unknown_sort_is_unprocessable() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .get_json("/customers?scopes=All&sort=phone-asc")
        .await?;
    assert_status(status, StatusCode::UNPROCESSABLE_ENTITY, "bad sort");
    assert_eq!(error_message(&body), Some("Bad sort value: 'phone-asc'."));
    assert_eq!(body["error"]["code"], 422);

    let (status, _) = app.get_json("/customers?scopes=All").await?;
    assert_status(status, StatusCode::UNPROCESSABLE_ENTITY, "empty sort");
    Ok(())
}

#[tokio::test]
async fn malformed_paging_is_a_bad_request() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .get_json("/customers?scopes=All&sort=name-asc&pageIndex=two")
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "bad page index");
    assert_eq!(error_message(&body), Some("Could not parse pageIndex: two"));

    let (status, body) = app
        .get_json("/customers?scopes=All&sort=name-asc&itemsPerPage=many")
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "bad page size");
    assert_eq!(error_message(&body), Some("Could not parse itemsPerPage: many"));
    Ok(())
}

#[tokio::test]
async fn empty_result_reports_zero_pages() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.get_json("/customers?scopes=Active&sort=name-asc").await?;
    assert_status(status, StatusCode::OK, "empty table");
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["searchParams"]["pageInfo"]["totalItemCount"], 0);
    assert_eq!(body["searchParams"]["pageInfo"]["totalPageCount"], 0);
    Ok(())
}

#[tokio::test]
async fn rejected_requests_are_logged_outside_production() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let (logs, _guard) = LogCapture::install();

    let (status, _) = app
        .get_json("/customers?scopes=Archived&sort=name-asc")
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "unknown scope");
    assert!(logs.contents().contains("Rejected list request"));
    Ok(())
}

#[tokio::test]
async fn rejected_requests_are_quiet_in_production() -> anyhow::Result<()> {
    let mut config = test_config();
    config.environment = Environment::Production;
    let app = TestApp::with_config(config).await?;
    let (logs, _guard) = LogCapture::install();

    let (status, body) = app
        .get_json("/customers?scopes=Archived&sort=name-asc")
        .await?;
    assert_status(status, StatusCode::BAD_REQUEST, "unknown scope");
    assert_eq!(error_message(&body), Some("Found unknown scope: 'Archived'."));
    assert!(!logs.contents().contains("Rejected list request"));
    Ok(())
}

#[tokio::test]
async fn failed_query_logs_one_error() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    sqlx::query("DROP TABLE customers").execute(app.pool()?).await?;
    let (logs, _guard) = LogCapture::install();

    let (status, body) = app.get_json("/customers?scopes=All&sort=name-asc").await?;
    assert_status(status, StatusCode::INTERNAL_SERVER_ERROR, "missing table");
    assert_eq!(error_message(&body), Some("Could not retrieve customers."));

    let contents = logs.contents();
    let errors: Vec<&str> = contents.lines().filter(|l| l.contains(" ERROR ")).collect();
    assert_eq!(errors.len(), 1, "error lines: {:?}", errors);
    assert!(errors[0].contains("List query failed"));
    Ok(())
}

#[tokio::test]
async fn completed_queries_log_at_debug() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    app.insert_customer(1, "Solo", None, None).await?;
    let (logs, _guard) = LogCapture::install();

    let (status, _) = app.get_json("/customers?scopes=All&sort=name-asc").await?;
    assert_status(status, StatusCode::OK, "single customer");

    let contents = logs.contents();
    let completed: Vec<&str> = contents
        .lines()
        .filter(|l| l.contains("paged query completed"))
        .collect();
    assert_eq!(completed.len(), 1);
    assert!(completed[0].contains("DEBUG"));
    Ok(())
}
