use std::net::SocketAddr;

use armory_infra::checksum::Crc32;
use armory_infra::net::{FetchRequest, MirrorDownloader};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use camino::Utf8PathBuf;
use tempfile::tempdir;

fn crc_of(data: &[u8]) -> String {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finish()
}

async fn start_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn staging_file(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
}

#[tokio::test]
async fn server_error_falls_through_to_next_mirror() {
    let payload = b"mirror payload".to_vec();
    let served = payload.clone();
    let app = Router::new()
        .route("/bad/a.bin", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Vec::<u8>::new()) }))
        .route("/good/a.bin", get(move || {
            let data = served.clone();
            async move { (StatusCode::OK, data) }
        }));
    let (addr, handle) = start_server(app).await;

    let dir = tempdir().unwrap();
    let dest = staging_file(&dir, "a.bin");
    let downloader = MirrorDownloader::new(reqwest::Client::new(), None);

    let result = downloader
        .fetch(&FetchRequest {
            id: 0,
            mirrors: vec![
                format!("http://{addr}/bad/a.bin"),
                format!("http://{addr}/good/a.bin"),
            ],
            staging_path: dest.clone(),
            expected_crc: Some(crc_of(&payload)),
        })
        .await;

    assert!(result.success);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    handle.abort();
}

#[tokio::test]
async fn checksum_mismatch_falls_through_and_next_mirror_overwrites() {
    let corrupt = b"corrupted bytes that are longer".to_vec();
    let good = b"good".to_vec();
    let served_corrupt = corrupt.clone();
    let served_good = good.clone();
    let app = Router::new()
        .route("/m1/a.bin", get(move || {
            let data = served_corrupt.clone();
            async move { (StatusCode::OK, data) }
        }))
        .route("/m2/a.bin", get(move || {
            let data = served_good.clone();
            async move { (StatusCode::OK, data) }
        }));
    let (addr, handle) = start_server(app).await;

    let dir = tempdir().unwrap();
    let dest = staging_file(&dir, "a.bin");
    let downloader = MirrorDownloader::new(reqwest::Client::new(), None);

    let result = downloader
        .fetch(&FetchRequest {
            id: 0,
            mirrors: vec![
                format!("http://{addr}/m1/a.bin"),
                format!("http://{addr}/m2/a.bin"),
            ],
            staging_path: dest.clone(),
            expected_crc: Some(crc_of(&good)),
        })
        .await;

    assert!(result.success);
    // The second attempt truncated the longer corrupt write.
    assert_eq!(std::fs::read(&dest).unwrap(), good);
    handle.abort();
}

#[tokio::test]
async fn exhausting_all_mirrors_reports_failure() {
    let payload = b"whatever".to_vec();
    let served = payload.clone();
    let app = Router::new().route("/a.bin", get(move || {
        let data = served.clone();
        async move { (StatusCode::OK, data) }
    }));
    let (addr, handle) = start_server(app).await;

    let dir = tempdir().unwrap();
    let dest = staging_file(&dir, "a.bin");
    let downloader = MirrorDownloader::new(reqwest::Client::new(), None);

    let result = downloader
        .fetch(&FetchRequest {
            id: 7,
            mirrors: vec![
                format!("http://{addr}/a.bin"),
                format!("http://{addr}/a.bin"),
            ],
            staging_path: dest,
            expected_crc: Some("00000000".into()),
        })
        .await;

    assert!(!result.success);
    assert_eq!(result.id, 7);
    handle.abort();
}

#[tokio::test]
async fn unreachable_mirror_falls_through() {
    let payload = b"reachable".to_vec();
    let served = payload.clone();
    let app = Router::new().route("/a.bin", get(move || {
        let data = served.clone();
        async move { (StatusCode::OK, data) }
    }));
    let (addr, handle) = start_server(app).await;

    let dir = tempdir().unwrap();
    let dest = staging_file(&dir, "a.bin");
    let downloader = MirrorDownloader::new(reqwest::Client::new(), None);

    let result = downloader
        .fetch(&FetchRequest {
            id: 0,
            // Port 1 refuses the connection outright.
            mirrors: vec![
                "http://127.0.0.1:1/a.bin".to_string(),
                format!("http://{addr}/a.bin"),
            ],
            staging_path: dest.clone(),
            expected_crc: Some(crc_of(&payload)),
        })
        .await;

    assert!(result.success);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    handle.abort();
}

#[tokio::test]
async fn missing_expected_checksum_accepts_first_mirror() {
    let payload = b"unverified".to_vec();
    let served = payload.clone();
    let app = Router::new().route("/a.bin", get(move || {
        let data = served.clone();
        async move { (StatusCode::OK, data) }
    }));
    let (addr, handle) = start_server(app).await;

    let dir = tempdir().unwrap();
    let dest = staging_file(&dir, "a.bin");
    let downloader = MirrorDownloader::new(reqwest::Client::new(), None);

    let result = downloader
        .fetch(&FetchRequest {
            id: 0,
            mirrors: vec![format!("http://{addr}/a.bin")],
            staging_path: dest.clone(),
            expected_crc: None,
        })
        .await;

    assert!(result.success);
    assert_eq!(result.bytes_downloaded, payload.len() as u64);
    handle.abort();
}
