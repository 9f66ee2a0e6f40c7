//! Behavior tests for the HTTP engine: matching, replies, recording.

use std::time::{Duration, Instant};

use mock_http_server::{Handler, MockServer, Reply, ReplyBody, RequestFilter};

mod common;

async fn started() -> MockServer {
    common::init_tracing();
    let server = MockServer::http(common::http_config());
    server.start().await.expect("start mock server");
    server
}

fn url(server: &MockServer, path: &str) -> String {
    common::http_url(server.http_port().expect("http port"), path)
}

#[tokio::test]
async fn mocks_the_configured_method_and_path() {
    let server = started().await;
    server.on(
        Handler::new("/resource").reply(
            Reply::new()
                .status(200)
                .header("content-type", "application/json")
                .body(r#"{"hello":"world"}"#),
        ),
    );

    let res = common::client().get(url(&server, "/resource")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(res.text().await.unwrap(), r#"{"hello":"world"}"#);

    server.stop().await;
}

#[tokio::test]
async fn unmatched_requests_get_the_fixed_not_found_response() {
    let server = started().await;

    let res = common::client().get(url(&server, "/resource")).send().await.unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.headers().get("content-type").unwrap(), "plain/text");
    assert_eq!(res.headers().get("content-length").unwrap(), "9");
    assert_eq!(res.text().await.unwrap(), "Not Found");

    server.stop().await;
}

#[tokio::test]
async fn newest_registration_shadows_older_ones() {
    let server = started().await;
    server
        .on(Handler::new("/resource").reply(Reply::new().status(500)))
        .on(Handler::new("/resource").reply(Reply::new().status(204)));

    let res = common::client().get(url(&server, "/resource")).send().await.unwrap();
    assert_eq!(res.status(), 204);

    server.stop().await;
}

#[tokio::test]
async fn wildcard_method_and_path_with_filter() {
    let server = started().await;
    server.on(
        Handler::new("*")
            .method("*")
            .filter(|req| req.query.get("token").map(String::as_str) == Some("s3cr3t"))
            .reply(Reply::new().status(200).body("let in")),
    );

    let client = common::client();

    let allowed = client
        .patch(url(&server, "/any/path?token=s3cr3t"))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    assert_eq!(allowed.text().await.unwrap(), "let in");

    let denied = client.get(url(&server, "/any/path")).send().await.unwrap();
    assert_eq!(denied.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn method_matching_is_case_insensitive() {
    let server = started().await;
    server.on(Handler::new("/resource").method("delete").reply(Reply::new().status(204)));

    let res = common::client()
        .delete(url(&server, "/resource"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    server.stop().await;
}

#[tokio::test]
async fn status_function_sees_the_decoded_text_body() {
    let server = started().await;
    server.on(
        Handler::new("/resource").method("POST").reply(Reply::new().status_fn(|req| {
            if req.body.as_text() == Some("Hello world\nThis is a text") {
                200
            } else {
                403
            }
        })),
    );

    let res = common::client()
        .post(url(&server, "/resource"))
        .header("content-type", "text/plain")
        .body("Hello world\nThis is a text")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    server.stop().await;
}

#[tokio::test]
async fn asynchronous_body_resolves_before_the_response_is_written() {
    let server = started().await;
    server.on(
        Handler::new("/slow").reply(Reply::new().body_async(|req| async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            format!("eventually {}", req.pathname)
        })),
    );

    let res = common::client().get(url(&server, "/slow")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "eventually /slow");

    server.stop().await;
}

#[tokio::test]
async fn binary_bodies_are_served_verbatim() {
    let server = started().await;
    let payload = vec![0u8, 159, 146, 150];
    server.on(
        Handler::new("/blob").reply(
            Reply::new()
                .header("content-type", "application/octet-stream")
                .body(ReplyBody::from(payload.clone())),
        ),
    );

    let res = common::client().get(url(&server, "/blob")).send().await.unwrap();
    assert_eq!(res.headers().get("content-length").unwrap(), "4");
    assert_eq!(res.bytes().await.unwrap().as_ref(), payload.as_slice());

    server.stop().await;
}

#[tokio::test]
async fn reply_delay_is_honored() {
    let server = started().await;
    server.on(
        Handler::new("/later")
            .delay(Duration::from_millis(200))
            .reply(Reply::new().body("worth the wait")),
    );

    let begun = Instant::now();
    let res = common::client().get(url(&server, "/later")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(begun.elapsed() >= Duration::from_millis(200));

    server.stop().await;
}

#[tokio::test]
async fn head_requests_omit_the_body_but_keep_headers() {
    let server = started().await;
    server.on(
        Handler::new("/resource")
            .method("HEAD")
            .reply(Reply::new().body("invisible payload")),
    );

    let res = common::client().head(url(&server, "/resource")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers().get("content-length").unwrap(), "17");
    assert_eq!(res.text().await.unwrap(), "");

    server.stop().await;
}

#[tokio::test]
async fn removing_content_length_suppresses_the_header() {
    let server = started().await;
    server.on(
        Handler::new("/unsized").reply(
            Reply::new()
                .body("still delivered")
                .remove_header("content-length"),
        ),
    );

    let res = common::client().get(url(&server, "/unsized")).send().await.unwrap();
    assert!(res.headers().get("content-length").is_none());
    assert_eq!(res.text().await.unwrap(), "still delivered");

    server.stop().await;
}

#[tokio::test]
async fn keep_open_replies_never_complete() {
    let server = started().await;
    server.on(
        Handler::new("/stall").reply(
            Reply::new()
                .body("partial")
                .remove_header("content-length")
                .keep_open(),
        ),
    );

    let res = common::client()
        .get(url(&server, "/stall"))
        .timeout(Duration::from_millis(300))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // The body never terminates, so reading it runs into the timeout.
    let err = res.text().await.unwrap_err();
    assert!(err.is_timeout());

    server.stop().await;
}

#[tokio::test]
async fn records_requests_and_filters_them_exactly() {
    let server = started().await;
    server
        .on(Handler::new("/dog").method("PUT").reply(Reply::new().body(r#"{"breed":"German Shepherd"}"#)))
        .on(Handler::new("/cat").method("POST").reply(Reply::new().body(r#"{"breed":"Maine coon"}"#)))
        .on(Handler::new("/bird").method("DELETE").reply(Reply::new().status(204)));

    let client = common::client();
    client
        .put(url(&server, "/dog"))
        .json(&serde_json::json!({"breed": "German Shepherd"}))
        .send()
        .await
        .unwrap();
    client
        .post(url(&server, "/cat"))
        .json(&serde_json::json!({"breed": "Maine coon"}))
        .send()
        .await
        .unwrap();
    client.delete(url(&server, "/bird")).send().await.unwrap();

    let all = server.requests();
    assert_eq!(all.len(), 3);
    let paths: Vec<&str> = all.iter().map(|r| r.pathname.as_str()).collect();
    assert_eq!(paths, vec!["/dog", "/cat", "/bird"]);

    let dogs = server.requests_matching(&RequestFilter::new().path("/dog"));
    assert_eq!(dogs.len(), 1);
    assert_eq!(dogs[0].pathname, "/dog");
    assert_eq!(dogs[0].method, "PUT");

    let posts = server.requests_matching(&RequestFilter::new().method("POST"));
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].pathname, "/cat");

    let deleted_birds =
        server.requests_matching(&RequestFilter::new().method("DELETE").path("/bird"));
    assert_eq!(deleted_birds.len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn recorded_requests_expose_decoded_bodies() {
    let server = started().await;
    server.on(Handler::new("*").method("*").reply(Reply::new()));

    let client = common::client();
    client
        .post(url(&server, "/json"))
        .json(&serde_json::json!({"hello": "world"}))
        .send()
        .await
        .unwrap();
    client
        .post(url(&server, "/form"))
        .form(&[("breed", "gsd"), ("name", "rex")])
        .send()
        .await
        .unwrap();

    let json_requests = server.requests_matching(&RequestFilter::new().path("/json"));
    let body = json_requests[0].body.as_json().expect("json body");
    assert_eq!(body["hello"].as_str(), Some("world"));

    let form_requests = server.requests_matching(&RequestFilter::new().path("/form"));
    let form = form_requests[0].body.as_form().expect("form body");
    assert_eq!(form.get("breed").map(String::as_str), Some("gsd"));
    assert_eq!(form.get("name").map(String::as_str), Some("rex"));

    server.stop().await;
}

#[tokio::test]
async fn multipart_uploads_populate_fields_and_files() {
    let server = started().await;
    server.on(Handler::new("/upload").method("POST").reply(Reply::new().status(201)));

    let form = reqwest::multipart::Form::new()
        .text("breed", "German Shepherd")
        .part(
            "photo",
            reqwest::multipart::Part::bytes(vec![1u8, 2, 3])
                .file_name("dog.png")
                .mime_str("image/png")
                .unwrap(),
        );

    let res = common::client()
        .post(url(&server, "/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    let recorded = server.requests();
    assert_eq!(recorded.len(), 1);

    let fields = recorded[0].body.as_form().expect("multipart fields");
    assert_eq!(
        fields.get("breed").map(String::as_str),
        Some("German Shepherd")
    );

    let photo = recorded[0].files.get("photo").expect("uploaded file");
    assert_eq!(photo.filename.as_deref(), Some("dog.png"));
    assert_eq!(photo.content_type.as_deref(), Some("image/png"));
    assert_eq!(photo.data.as_ref(), &[1u8, 2, 3]);

    server.stop().await;
}

#[tokio::test]
async fn reset_clears_handlers_and_requests() {
    let server = started().await;
    server.on(Handler::new("/resource").reply(Reply::new().body(r#"{"hello":"world"}"#)));

    let client = common::client();
    let first = client.get(url(&server, "/resource")).send().await.unwrap();
    assert_eq!(first.status(), 200);

    server.reset();

    let second = client.get(url(&server, "/resource")).send().await.unwrap();
    assert_eq!(second.status(), 404);
    // Only the request issued after the reset is on the log.
    assert_eq!(server.requests().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn reset_handlers_leaves_the_request_log_untouched() {
    let server = started().await;
    server.on(Handler::new("/resource").reply(Reply::new()));

    let client = common::client();
    client.get(url(&server, "/resource")).send().await.unwrap();

    server.reset_handlers();

    assert_eq!(server.requests().len(), 1);
    let res = client.get(url(&server, "/resource")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn reset_requests_leaves_handlers_registered() {
    let server = started().await;
    server.on(Handler::new("/resource").reply(Reply::new()));

    let client = common::client();
    client.get(url(&server, "/resource")).send().await.unwrap();

    server.reset_requests();
    assert!(server.requests().is_empty());

    let res = client.get(url(&server, "/resource")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    server.stop().await;
}
