use page_sentry::config::{
    Config, ExtractorConfig, FetcherConfig, FilesConfig, ScannerConfig, TelegramConfig,
};
use page_sentry::notify::LogNotifier;
use page_sentry::scanner::{
    build_http_client, LinkTextExtractor, PageFetcher, RateLimiter, RetryPolicy, ScanSinks,
    Scanner,
};
use page_sentry::storage::{
    CsvMatchLog, FileCheckpointStore, MatchRecord, MatchSink, SeenLog, StorageError,
    StorageResult,
};
use page_sentry::{ScanError, ScanPhase, ScanState, WatchList};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WATCHED_A: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
const WATCHED_B: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";

/// Creates a test configuration scanning `{server}/dio/` with files under `dir`
fn create_test_config(server: &MockServer, dir: &Path, threads: u32, idle: u32) -> Config {
    let file = |name: &str| dir.join(name).to_string_lossy().into_owned();

    Config {
        scanner: ScannerConfig {
            base_url: format!("{}/dio/", server.uri()),
            threads,
            max_requests_per_second: 1000.0,
            idle_batch_limit: idle,
        },
        fetcher: FetcherConfig {
            max_attempts: 2,
            backoff_base_ms: 5,
            timeout_secs: 5,
            user_agent: "TestSentry/1.0".to_string(),
        },
        extractor: ExtractorConfig::default(),
        files: FilesConfig {
            watchlist_path: file("addresses.txt"),
            matches_path: file("matches.csv"),
            checkpoint_path: file("checkpoint.txt"),
            seen_path: None,
        },
        telegram: None,
    }
}

fn write_watchlist(dir: &Path, addresses: &[&str]) {
    fs::write(dir.join("addresses.txt"), addresses.join("\n")).unwrap();
}

/// Renders a listing page the way the data source does
fn page_html(addresses: &[&str]) -> String {
    let rows: String = addresses
        .iter()
        .map(|a| {
            format!(
                r#"<tr><td><a href="https://blockchain.info/address/{a}">{a}</a></td></tr>"#,
                a = a
            )
        })
        .collect();
    format!(
        r#"<html><body><a href="/dio/2">next</a><table>{}</table></body></html>"#,
        rows
    )
}

async fn mount_page(server: &MockServer, page: u64, addresses: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/dio/{}", page)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_html(addresses))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Match sink whose every write fails
struct FailingSink;

impl MatchSink for FailingSink {
    fn append(&mut self, _record: &MatchRecord) -> StorageResult<()> {
        Err(StorageError::file(
            Path::new("matches.csv"),
            io::Error::new(io::ErrorKind::Other, "disk full"),
        ))
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

fn read_checkpoint(dir: &Path) -> Option<String> {
    fs::read_to_string(dir.join("checkpoint.txt")).ok()
}

#[tokio::test]
async fn test_match_recorded_and_checkpoint_advanced() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A, WATCHED_B]);

    mount_page(&server, 1, &["1AAA", "1BBB"]).await;
    mount_page(&server, 2, &[WATCHED_B, "XYZ"]).await;
    mount_page(&server, 3, &["1CCC"]).await;

    let config = create_test_config(&server, dir.path(), 2, 2);
    let mut scanner = Scanner::from_config(&config).unwrap();
    let report = scanner.run().await.unwrap();

    assert_eq!(report.phase, ScanPhase::Halted);
    assert_eq!(report.matches_recorded, 1);
    assert_eq!(report.pages_with_new_addresses, 3);
    assert_eq!(report.checkpoint, Some(4));
    assert_eq!(
        report.failed_pages.iter().copied().collect::<Vec<_>>(),
        vec![4, 5, 6, 7]
    );

    let content = fs::read_to_string(dir.path().join("matches.csv")).unwrap();
    assert_eq!(content, format!("page,address\n2,{}\n", WATCHED_B));
    assert_eq!(read_checkpoint(dir.path()).as_deref(), Some("4"));
}

#[tokio::test]
async fn test_halts_after_idle_batches_without_further_fetches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    let config = create_test_config(&server, dir.path(), 3, 5);
    let mut scanner = Scanner::from_config(&config).unwrap();
    let report = scanner.run().await.unwrap();

    assert_eq!(report.batches, 5);
    assert_eq!(report.checkpoint, None);
    assert_eq!(scanner.cursor(), 16);
    assert!(scanner.phase().is_halted());

    // 404 is not retried, so exactly one request per page
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 15);

    assert_eq!(read_checkpoint(dir.path()), None);
}

#[tokio::test]
async fn test_resume_never_rereports_earlier_matches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A, WATCHED_B]);

    mount_page(&server, 1, &[WATCHED_A, "1AAA"]).await;
    mount_page(&server, 2, &["1BBB"]).await;

    let config = create_test_config(&server, dir.path(), 2, 1);
    let first = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.matches_recorded, 1);
    assert_eq!(read_checkpoint(dir.path()).as_deref(), Some("3"));

    // Page 3 repeats the old match next to a new one
    mount_page(&server, 3, &[WATCHED_A, WATCHED_B, "1DDD"]).await;

    let mut scanner = Scanner::from_config(&config).unwrap();
    assert_eq!(scanner.cursor(), 3);
    let second = scanner.run().await.unwrap();
    assert_eq!(second.start_page, 3);
    assert_eq!(second.matches_recorded, 1);

    let records = CsvMatchLog::read_records(&dir.path().join("matches.csv")).unwrap();
    assert_eq!(
        records,
        vec![MatchRecord::new(1, WATCHED_A), MatchRecord::new(3, WATCHED_B)]
    );
    assert_eq!(read_checkpoint(dir.path()).as_deref(), Some("4"));
}

#[tokio::test]
async fn test_shared_address_reported_once_per_batch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 1, &[WATCHED_A, "1AAA"]).await;
    mount_page(&server, 2, &[WATCHED_A, "1BBB"]).await;

    let config = create_test_config(&server, dir.path(), 2, 1);
    let report = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.matches_recorded, 1);
    let records = CsvMatchLog::read_records(&dir.path().join("matches.csv")).unwrap();
    assert_eq!(records, vec![MatchRecord::new(1, WATCHED_A)]);
}

#[tokio::test]
async fn test_starts_from_saved_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_B]);
    fs::write(dir.path().join("checkpoint.txt"), "10").unwrap();

    mount_page(&server, 10, &[WATCHED_B, "XYZ"]).await;

    let config = create_test_config(&server, dir.path(), 1, 1);
    let report = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.start_page, 10);
    assert_eq!(report.checkpoint, Some(11));
    assert_eq!(read_checkpoint(dir.path()).as_deref(), Some("11"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/dio/1"));

    let records = CsvMatchLog::read_records(&dir.path().join("matches.csv")).unwrap();
    assert_eq!(records, vec![MatchRecord::new(10, WATCHED_B)]);
}

#[tokio::test]
async fn test_batch_summary_for_single_batch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 2, &[WATCHED_A]).await;

    let config = create_test_config(&server, dir.path(), 3, 5);
    let mut scanner = Scanner::from_config(&config).unwrap();
    let summary = scanner.run_batch().await.unwrap();

    assert_eq!(summary.pages, 1..4);
    assert_eq!(summary.productive_pages, vec![2]);
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.checkpoint, Some(3));
    assert_eq!(scanner.cursor(), 3);
    assert_eq!(scanner.phase(), ScanPhase::Running);
    assert!(scanner.state().is_seen(WATCHED_A));
}

#[tokio::test]
async fn test_transient_error_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    Mock::given(method("GET"))
        .and(path("/dio/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, 1, &[WATCHED_A]).await;

    let config = create_test_config(&server, dir.path(), 1, 1);
    let report = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.matches_recorded, 1);
    assert!(!report.failed_pages.contains(&1));
}

#[tokio::test]
async fn test_telegram_notified_for_page_with_matches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 1, &[WATCHED_A]).await;
    mount_page(&server, 2, &["1NOMATCH"]).await;

    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_string_contains("chat_id=77"))
        .and(body_string_contains(WATCHED_A))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, dir.path(), 2, 1);
    config.telegram = Some(TelegramConfig {
        token: Some("TOKEN".to_string()),
        chat_id: Some("77".to_string()),
        api_base: server.uri(),
    });

    let report = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.matches_recorded, 1);
}

#[tokio::test]
async fn test_failing_notifier_does_not_stop_scan() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 1, &[WATCHED_A]).await;

    let mut config = create_test_config(&server, dir.path(), 1, 1);
    config.telegram = Some(TelegramConfig {
        token: Some("TOKEN".to_string()),
        chat_id: Some("77".to_string()),
        api_base: "http://127.0.0.1:9".to_string(),
    });

    let report = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.matches_recorded, 1);
    assert_eq!(read_checkpoint(dir.path()).as_deref(), Some("2"));
}

#[tokio::test]
async fn test_seen_log_prevents_rescan_of_known_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 1, &["1AAA", "1BBB"]).await;

    let mut config = create_test_config(&server, dir.path(), 1, 1);
    config.files.seen_path = Some(dir.path().join("seen.txt").to_string_lossy().into_owned());

    let first = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.pages_with_new_addresses, 1);

    let seen = SeenLog::read_addresses(&dir.path().join("seen.txt")).unwrap();
    assert_eq!(seen, vec!["1AAA", "1BBB"]);

    // Rewind: page 1 is fetched again but has nothing new
    fs::remove_file(dir.path().join("checkpoint.txt")).unwrap();
    let second = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(second.pages_with_new_addresses, 0);
    assert_eq!(second.checkpoint, None);
    assert_eq!(read_checkpoint(dir.path()), None);
}

#[tokio::test]
async fn test_checkpoint_write_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 1, &["1AAA"]).await;

    let mut config = create_test_config(&server, dir.path(), 1, 1);
    config.files.checkpoint_path = dir
        .path()
        .join("missing-dir")
        .join("checkpoint.txt")
        .to_string_lossy()
        .into_owned();

    let result = Scanner::from_config(&config).unwrap().run().await;
    assert!(matches!(result, Err(ScanError::Storage(_))));
}

#[tokio::test]
async fn test_missing_watchlist_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&server, dir.path(), 1, 1);
    assert!(matches!(
        Scanner::from_config(&config),
        Err(ScanError::Storage(_))
    ));
}

#[tokio::test]
async fn test_lower_page_wins_when_it_finishes_last() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    Mock::given(method("GET"))
        .and(path("/dio/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_html(&[WATCHED_A, "1AAA"]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_page(&server, 2, &[WATCHED_A, "1BBB"]).await;

    let config = create_test_config(&server, dir.path(), 2, 5);
    let mut scanner = Scanner::from_config(&config).unwrap();
    let summary = scanner.run_batch().await.unwrap();

    assert_eq!(summary.productive_pages, vec![1, 2]);
    assert_eq!(summary.matches, 1);

    let records = CsvMatchLog::read_records(&dir.path().join("matches.csv")).unwrap();
    assert_eq!(records, vec![MatchRecord::new(1, WATCHED_A)]);
}

#[tokio::test]
async fn test_failed_match_write_keeps_address_unseen_for_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_watchlist(dir.path(), &[WATCHED_A]);

    mount_page(&server, 1, &[WATCHED_A, "1AAA"]).await;

    let seen_path = dir.path().join("seen.txt");
    let mut config = create_test_config(&server, dir.path(), 1, 1);
    config.files.seen_path = Some(seen_path.to_string_lossy().into_owned());

    let fetcher = PageFetcher::new(
        build_http_client(&config.fetcher).unwrap(),
        config.scanner.base_url.clone(),
        Arc::new(RateLimiter::new(config.scanner.max_requests_per_second)),
        RetryPolicy::from(&config.fetcher),
    );
    let sinks = ScanSinks {
        checkpoint: Box::new(FileCheckpointStore::new(dir.path().join("checkpoint.txt"))),
        matches: Box::new(FailingSink),
        seen_log: Some(SeenLog::open(&seen_path).unwrap()),
        notifier: Box::new(LogNotifier),
    };
    let mut scanner = Scanner::new(
        1,
        1,
        fetcher,
        Arc::new(LinkTextExtractor::new(config.extractor.link_pattern.clone())),
        ScanState::new(WatchList::parse(WATCHED_A), Vec::new()),
        sinks,
    )
    .unwrap();

    let result = scanner.run().await;
    assert!(matches!(result, Err(ScanError::Storage(_))));
    drop(scanner);

    assert!(SeenLog::read_addresses(&seen_path).unwrap().is_empty());
    assert_eq!(read_checkpoint(dir.path()), None);

    // Restart with a working match log: page 1 is scanned again
    let report = Scanner::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.matches_recorded, 1);

    let records = CsvMatchLog::read_records(&dir.path().join("matches.csv")).unwrap();
    assert_eq!(records, vec![MatchRecord::new(1, WATCHED_A)]);
    assert_eq!(read_checkpoint(dir.path()).as_deref(), Some("2"));
}
