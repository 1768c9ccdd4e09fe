//! Unix socket IPC round trips against a live server task.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use revue_core::ipc::{DashboardRequest, DashboardResponse};
use revue_core::{CategoryField, RevueConfig, ReviewTable};
use revue_server::router::DashboardContext;
use revue_server::server::{frame_codec, run_unix_server};
use tokio::net::UnixStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;

const DATA: &str = "\
review,rating,sentiment,topic,aspect,aspect_index,company,data_source,time
app crashes on launch,1,Negative,performance,crash,c1,Spotify,Google Play,2021-01-05
great sound quality,5,Positive,audio,sound,s1,Pandora,Google Play,2020-03-05
";

async fn connect(path: &std::path::Path) -> UnixStream {
    for _ in 0..50 {
        if let Ok(stream) = UnixStream::connect(path).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server never came up at {}", path.display());
}

async fn roundtrip(
    framed: &mut Framed<UnixStream, tokio_util::codec::LengthDelimitedCodec>,
    payload: Vec<u8>,
) -> DashboardResponse {
    framed.send(Bytes::from(payload)).await.unwrap();
    let frame = framed.next().await.expect("response frame").unwrap();
    rmp_serde::from_slice(&frame).unwrap()
}

// ===========================================================================
// TEST 1: ping, rating request and a malformed frame over one connection
// ===========================================================================
#[tokio::test]
async fn test_ipc_round_trips_and_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("revue.sock");
    let socket_str = socket.to_str().unwrap().to_string();

    let table = ReviewTable::from_reader(DATA.as_bytes()).unwrap();
    let context = Arc::new(DashboardContext::new(table, RevueConfig::default()));
    let (tx, _rx) = broadcast::channel(1);

    let server = tokio::spawn({
        let rx = tx.subscribe();
        async move { run_unix_server(&socket_str, context, rx).await }
    });

    let stream = connect(&socket).await;
    let mut framed = Framed::new(stream, frame_codec());

    let ping = rmp_serde::to_vec_named(&DashboardRequest::Ping).unwrap();
    let resp = roundtrip(&mut framed, ping).await;
    assert!(resp.is_ok());
    assert_eq!(resp.data.unwrap()["pong"], true);

    let ratings = rmp_serde::to_vec_named(&DashboardRequest::AverageRating {
        field: CategoryField::Company,
    })
    .unwrap();
    let resp = roundtrip(&mut framed, ratings).await;
    let data = resp.data.unwrap();
    assert_eq!(data["groups"][0]["key"], "Spotify");

    let resp = roundtrip(&mut framed, vec![0xc1, 0x00]).await;
    assert!(!resp.is_ok());
    assert!(resp.error.unwrap().contains("Deserialization error"));

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert!(!socket.exists(), "socket file removed on shutdown");
}
