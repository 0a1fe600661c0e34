mod support;

use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn status_reports_a_known_scene() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/status", server.base_url))
        .send()
        .await
        .expect("status request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = res.json().await.expect("status body is json");
    let scene = body["scene"].as_str().expect("scene is a string");
    assert!(
        ["withme", "hugs", "flock", "herd", "mimic", "kaleido"].contains(&scene),
        "unexpected scene {scene}"
    );
}

#[tokio::test]
async fn unknown_scene_is_rejected_with_the_error_schema() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/scene", server.base_url))
        .json(&serde_json::json!({ "scene": "bogus" }))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.expect("error body is json");
    assert!(body["error"].as_str().unwrap_or("").contains("unknown scene"));
}

#[tokio::test]
async fn scene_switch_shows_up_in_status() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/scene", server.base_url))
        .json(&serde_json::json!({ "scene": "flock" }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let body: serde_json::Value = client
            .get(format!("{}/status", server.base_url))
            .send()
            .await
            .expect("status request should succeed")
            .json()
            .await
            .expect("status body is json");
        if body["scene"] == "flock" {
            break;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("scene never switched to flock: {body}");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn tracked_blob_appears_in_the_feed() {
    let server = support::ensure_server();

    let ws_url = format!("{}/feed", server.base_url.replace("http://", "ws://"));
    let (mut ws, _resp) = connect_async(ws_url).await.expect("feed should upgrade");

    // First message announces the current scene.
    let first = tokio::time::timeout(Duration::from_secs(3), ws.next())
        .await
        .expect("expected a first feed message")
        .expect("stream open")
        .expect("message ok");
    let first: serde_json::Value = match first {
        Message::Text(txt) => serde_json::from_str(&txt).expect("feed message is json"),
        other => panic!("unexpected first message {other:?}"),
    };
    assert_eq!(first["type"], "SceneState");

    // Stream camera-center blobs for player 7 while we watch the feed.
    let udp = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind udp sender");
    let tracking_addr = server.tracking_addr;
    let datagram = br#"{"id":7,"x":320.0,"y":320.0}"#;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let player = loop {
        let _ = udp.send_to(datagram, tracking_addr);

        let msg = tokio::time::timeout(Duration::from_secs(3), ws.next())
            .await
            .expect("expected feed traffic")
            .expect("stream open")
            .expect("message ok");
        if let Message::Text(txt) = msg {
            let value: serde_json::Value =
                serde_json::from_str(&txt).expect("feed message is json");
            if value["type"] == "WorldUpdate" {
                if let Some(player) = value["data"]["players"]
                    .as_array()
                    .and_then(|ps| ps.iter().find(|p| p["id"] == 7))
                {
                    break player.clone();
                }
            }
        }
        if tokio::time::Instant::now() > deadline {
            panic!("player 7 never appeared in the feed");
        }
    };

    // Camera center projects to the dome apex.
    let x = player["x"].as_f64().expect("x");
    let y = player["y"].as_f64().expect("y");
    let z = player["z"].as_f64().expect("z");
    assert!(x.abs() < 0.5 && z.abs() < 0.5, "({x}, {z}) should be near the axis");
    assert!(y > 5.0, "player should sit high on the dome, got {y}");
}
