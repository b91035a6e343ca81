use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use micro_dispatch::{handler_fn, init_tracing, Router, Server};
use serde::Serialize;
use tracing::{info, Level};

#[derive(Serialize, Debug)]
struct User {
    id: i64,
    name: String,
}

fn build_router() -> Router {
    let mut router = Router::new();
    router
        .get("/", handler_fn(|ctx| Box::pin(async move { ctx.string(StatusCode::OK, "hello world") })))
        .unwrap()
        .get(
            "/users/:id",
            handler_fn(|ctx| {
                Box::pin(async move {
                    let user = User { id: ctx.int_param("id"), name: ctx.query_param("name") };
                    ctx.json(StatusCode::OK, &user)
                })
            }),
        )
        .unwrap()
        .post(
            "/users",
            handler_fn(|ctx| {
                Box::pin(async move {
                    let name = ctx.form_value("name").await;
                    ctx.xml(StatusCode::CREATED, &User { id: 1, name })
                })
            }),
        )
        .unwrap()
        .get("/static/*file", handler_fn(|ctx| Box::pin(async move { ctx.redirect(StatusCode::FOUND, "/") })))
        .unwrap();
    router
}

#[tokio::main]
async fn main() {
    init_tracing(Level::DEBUG);

    let server = Server::builder().router(build_router()).build().unwrap();

    let requests = [
        (Method::GET, "/", ""),
        (Method::GET, "/users/42?name=Jon+Snow&pretty", ""),
        (Method::POST, "/users", "name=Arya+Stark"),
        (Method::GET, "/static/css/site.css", ""),
        (Method::DELETE, "/users/42", ""),
        (Method::GET, "/nowhere", ""),
    ];

    for (method, uri, body) in requests {
        let request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();

        let response = server.dispatch(request).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        info!(%method, uri, %status, body = %String::from_utf8_lossy(&body), "dispatched");
    }
}
