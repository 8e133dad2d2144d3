//! Shared fixtures: a throw-away document server and generated PDFs.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// A valid PDF with `n` pages and no text.
pub fn blank_pdf(n: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..n {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => n as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Serve `/docs/ok.pdf` (3 blank pages), `/docs/corrupt.pdf`, `/docs/missing.pdf` (404)
/// and `/docs/slow.pdf` (answers after two seconds) on an ephemeral port.
pub async fn spawn_document_server() -> SocketAddr {
    let app = Router::new()
        .route("/docs/ok.pdf", get(|| async { blank_pdf(3) }))
        .route("/docs/corrupt.pdf", get(|| async { b"definitely not a pdf".to_vec() }))
        .route(
            "/docs/missing.pdf",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        )
        .route(
            "/docs/slow.pdf",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                blank_pdf(1)
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}
