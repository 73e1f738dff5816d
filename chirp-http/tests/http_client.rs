use chirp_http::{Auth, HttpClient, OAuth1Signer, RequestOpts, StatusCode};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn signer() -> OAuth1Signer {
    OAuth1Signer::new("ck", "cs", "at", "ats")
}

#[tokio::test]
async fn signed_get_sends_oauth_header_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(query_param("q", "from:alice until:2020-01-01"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"statuses": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let signer = signer();
    let resp = client
        .get(
            "1.1/search/tweets.json",
            RequestOpts {
                auth: Auth::OAuth1(&signer),
                query: Some(vec![("q", "from:alice until:2020-01-01".into())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(resp.is_ok());
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body, serde_json::json!({"statuses": []}));

    let received: Vec<Request> = server.received_requests().await.unwrap();
    let auth = received[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_consumer_key=\"ck\""));
    assert!(auth.contains("oauth_token=\"at\""));
    assert!(auth.contains("oauth_signature=\""));
    // Spaces travel as %20, never as '+'.
    assert_eq!(
        received[0].url.query(),
        Some("q=from%3Aalice%20until%3A2020-01-01")
    );
}

#[tokio::test]
async fn unsigned_requests_carry_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let client = HttpClient::new("https://api.twitter.com/").unwrap();
    let resp = client
        .get(
            &format!("{}/media/a.jpg", server.uri()),
            RequestOpts {
                allow_absolute: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(resp.body, vec![1u8, 2, 3]);
    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn non_200_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{"code": 32, "message": "Could not authenticate you."}]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let resp = client
        .get("1.1/statuses/user_timeline.json", RequestOpts::default())
        .await
        .unwrap();

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(!resp.is_ok());
    assert_eq!(resp.error_message(), "Could not authenticate you.");
}

#[tokio::test]
async fn created_is_not_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let resp = client.get("x", RequestOpts::default()).await.unwrap();
    assert!(!resp.is_ok());
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let resp = client.get("x", RequestOpts::default()).await.unwrap();
    let err = resp.json::<serde_json::Value>().unwrap_err();
    assert!(err.to_string().contains("oops"));
}
