use axum::body::Body;
use axum::response::Response;
use http_body_util::BodyExt;

pub async fn response_to_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes()
        .to_vec()
}

pub async fn response_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response_to_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

pub async fn response_to_text(response: Response<Body>) -> String {
    let bytes = response_to_bytes(response).await;
    String::from_utf8(bytes).expect("response body is not UTF-8")
}
