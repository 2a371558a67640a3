use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Redirect,
    routing::{any, delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the server saw, echoed back as JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub url: String,
    pub args: BTreeMap<String, String>,
    /// Request headers keyed by title-cased name, repeated values joined.
    pub headers: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub files: BTreeMap<String, String>,
    pub json: Option<serde_json::Value>,
    pub data: String,
}

#[derive(Deserialize)]
pub struct RedirectTo {
    pub url: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/get", get(echo))
        .route("/post", post(echo))
        .route("/put", put(echo))
        .route("/patch", patch(echo))
        .route("/delete", delete(echo))
        .route("/anything", any(echo))
        .route("/status/{code}", any(status))
        .route("/redirect-to", get(redirect_to))
        .route("/delay/{secs}", get(delay))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// `x-requested-with` becomes `X-Requested-With`.
pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn echo_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut echoed: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        echoed
            .entry(title_case(name.as_str()))
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    echoed
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(args): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    request: Request,
) -> Result<Json<Echo>, StatusCode> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let mut echo = Echo {
        method: method.to_string(),
        url: format!("http://{host}{uri}"),
        args,
        headers: echo_headers(&headers),
        ..Default::default()
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;
        while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
            let name = field.name().unwrap_or_default().to_string();
            let is_file = field.file_name().is_some();
            let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            if is_file {
                echo.files.insert(name, text);
            } else {
                echo.form.insert(name, text);
            }
        }
        return Ok(Json(echo));
    }

    let body = Bytes::from_request(request, &())
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    echo.data = String::from_utf8_lossy(&body).into_owned();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
        echo.form = pairs.into_iter().collect();
    } else if content_type.starts_with("application/json") && !body.is_empty() {
        echo.json = serde_json::from_slice(&body).ok();
    }
    Ok(Json(echo))
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn redirect_to(Query(target): Query<RedirectTo>) -> Redirect {
    Redirect::to(&target.url)
}

async fn delay(Path(secs): Path<u64>, uri: Uri) -> Json<Echo> {
    tokio::time::sleep(Duration::from_secs(secs.min(10))).await;
    Json(Echo {
        method: Method::GET.to_string(),
        url: uri.to_string(),
        ..Default::default()
    })
}
