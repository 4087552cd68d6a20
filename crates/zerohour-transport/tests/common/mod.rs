//! Shared helpers for boundary client tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use reqwest::Client;
use serde_json::Value;
use zerohour_transport::build_client;

/// Bodies received by a stub endpoint, in order.
pub type Received = Arc<Mutex<Vec<Value>>>;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A client with a short timeout.
pub fn client() -> Client {
    build_client(Duration::from_secs(5)).unwrap()
}

/// A URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/simulate")
}
