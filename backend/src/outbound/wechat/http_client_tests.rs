//! Adapter tests against a local actix server standing in for WeChat.

use std::collections::HashMap;
use std::sync::Mutex;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::test_support::MutableClock;

#[derive(Default)]
struct Recorded {
    qr_bodies: Mutex<Vec<Value>>,
}

async fn code2session(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    let credentials_ok = query.get("appid").map(String::as_str) == Some("wx-app")
        && query.get("secret").map(String::as_str) == Some("s3cret")
        && query.get("grant_type").map(String::as_str) == Some("authorization_code");
    if !credentials_ok {
        return HttpResponse::Ok().json(json!({"errcode": 40013, "errmsg": "invalid appid"}));
    }
    match query.get("js_code").map(String::as_str) {
        // WeChat serves this endpoint as text/plain.
        Some("good") => HttpResponse::Ok()
            .content_type("text/plain")
            .body(r#"{"openid":"abc","session_key":"k","unionid":"u"}"#),
        Some("anonymous") => HttpResponse::Ok().json(json!({"session_key": "k"})),
        _ => HttpResponse::Ok().json(json!({"errcode": 40029, "errmsg": "invalid code"})),
    }
}

async fn token(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    if query.get("grant_type").map(String::as_str) != Some("client_credential") {
        return HttpResponse::BadRequest().finish();
    }
    if query.get("appid").map(String::as_str) == Some("slow-app") {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    HttpResponse::Ok().json(json!({"access_token": "tok", "expires_in": 7200}))
}

async fn qr(
    query: web::Query<HashMap<String, String>>,
    body: web::Json<Value>,
    recorded: web::Data<Recorded>,
) -> HttpResponse {
    if let Ok(mut bodies) = recorded.qr_bodies.lock() {
        bodies.push(body.into_inner());
    }
    match query.get("access_token").map(String::as_str) {
        Some("tok") => HttpResponse::Ok()
            .content_type("image/jpeg")
            .body(vec![0xFF_u8, 0xD8, 0xFF]),
        Some("png") => HttpResponse::Ok()
            .content_type("image/png")
            .body(vec![0x89_u8, b'P', b'N', b'G']),
        _ => HttpResponse::Ok().json(json!({"errcode": 40001, "errmsg": "invalid credential"})),
    }
}

struct StubServer {
    base_url: String,
    handle: ServerHandle,
    recorded: web::Data<Recorded>,
}

impl StubServer {
    async fn start() -> Self {
        let recorded = web::Data::new(Recorded::default());
        let data = recorded.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/sns/jscode2session", web::get().to(code2session))
                .route("/cgi-bin/token", web::get().to(token))
                .route("/wxa/getwxacodeunlimit", web::post().to(qr))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind stub server");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            base_url: format!("http://{addr}"),
            handle,
            recorded,
        }
    }

    fn client(&self, appid: &str, timeout: Duration) -> WeChatHttpClient {
        self.client_at(&self.base_url, appid, timeout)
    }

    fn client_at(&self, base_url: &str, appid: &str, timeout: Duration) -> WeChatHttpClient {
        let clock = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid instant");
        WeChatHttpClient::new(
            base_url,
            WeChatCredentials {
                appid: appid.to_owned(),
                secret: Zeroizing::new("s3cret".to_owned()),
            },
            timeout,
            Arc::new(MutableClock::new(clock)),
        )
        .expect("client builds")
    }

    async fn stop(self) {
        self.handle.stop(true).await;
    }
}

const TIMEOUT: Duration = Duration::from_secs(5);

fn js_code(raw: &str) -> JsCode {
    JsCode::new(raw).expect("valid code")
}

#[actix_web::test]
async fn exchanges_code_for_identity() {
    let stub = StubServer::start().await;
    let client = stub.client("wx-app", TIMEOUT);

    let exchange = client
        .code_to_session(&js_code("good"))
        .await
        .expect("exchange succeeds");

    assert_eq!(exchange.openid.as_deref(), Some("abc"));
    assert_eq!(exchange.attributes.get("unionid"), Some(&json!("u")));
    stub.stop().await;
}

#[actix_web::test]
async fn exchange_without_openid_is_passed_through() {
    let stub = StubServer::start().await;
    let client = stub.client("wx-app", TIMEOUT);

    let exchange = client
        .code_to_session(&js_code("anonymous"))
        .await
        .expect("exchange decodes");

    assert!(exchange.openid.is_none());
    stub.stop().await;
}

#[rstest]
#[case("wx-app", "bad", 40_029)]
#[case("other-app", "good", 40_013)]
#[actix_web::test]
async fn errcodes_become_api_errors(
    #[case] appid: &str,
    #[case] code: &str,
    #[case] expected: i64,
) {
    let stub = StubServer::start().await;
    let client = stub.client(appid, TIMEOUT);

    let err = client
        .code_to_session(&js_code(code))
        .await
        .expect_err("exchange fails");

    assert!(matches!(err, WeChatApiError::Api { errcode, .. } if errcode == expected));
    stub.stop().await;
}

#[actix_web::test]
async fn fetches_access_token_with_clock_timestamp() {
    let stub = StubServer::start().await;
    let client = stub.client("wx-app", TIMEOUT);

    let token = client.fetch_access_token().await.expect("token");

    assert_eq!(token.value(), "tok");
    assert_eq!(token.expires_in(), Some(7_200));
    assert_eq!(
        token.obtained_at(),
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid instant")
    );
    stub.stop().await;
}

#[actix_web::test]
async fn slow_upstream_times_out() {
    let stub = StubServer::start().await;
    let client = stub.client("slow-app", Duration::from_millis(50));

    let err = client.fetch_access_token().await.expect_err("timeout");

    assert!(matches!(err, WeChatApiError::Timeout { .. }));
    stub.stop().await;
}

#[actix_web::test]
async fn unknown_path_is_a_status_error() {
    let stub = StubServer::start().await;
    let base = format!("{}/missing", stub.base_url);
    let client = stub.client_at(&base, "wx-app", TIMEOUT);

    let err = client.fetch_access_token().await.expect_err("404");

    assert_eq!(err, WeChatApiError::status(404_u16));
    stub.stop().await;
}

#[actix_web::test]
async fn qr_code_bytes_and_type_pass_through() {
    let stub = StubServer::start().await;
    let client = stub.client("wx-app", TIMEOUT);
    let request = QrCodeRequest {
        path: "pages/card/card".to_owned(),
        scene: "id=7".to_owned(),
    };

    let jpeg = client
        .create_unlimited_qr_code("tok", &request)
        .await
        .expect("jpeg");
    let png = client
        .create_unlimited_qr_code("png", &request)
        .await
        .expect("png");

    assert_eq!(jpeg.bytes, vec![0xFF, 0xD8, 0xFF]);
    assert_eq!(jpeg.content_type, "image/jpeg");
    assert_eq!(png.content_type, "image/png");
    let bodies = stub
        .recorded
        .qr_bodies
        .lock()
        .expect("recorded bodies")
        .clone();
    assert_eq!(bodies[0], json!({"path": "pages/card/card", "scene": "id=7"}));
    stub.stop().await;
}

#[actix_web::test]
async fn qr_code_json_reply_is_an_api_error() {
    let stub = StubServer::start().await;
    let client = stub.client("wx-app", TIMEOUT);
    let request = QrCodeRequest {
        path: "pages/card/card".to_owned(),
        scene: "id=7".to_owned(),
    };

    let err = client
        .create_unlimited_qr_code("expired", &request)
        .await
        .expect_err("json error");

    assert_eq!(err, WeChatApiError::api(40_001_i64, "invalid credential"));
    stub.stop().await;
}

#[rstest]
#[case(Some("application/json; charset=utf-8"), true)]
#[case(Some("image/jpeg"), false)]
#[case(None, false)]
fn json_content_types_are_detected(#[case] content_type: Option<&str>, #[case] expected: bool) {
    assert_eq!(is_json(content_type), expected);
}

#[rstest]
fn credentials_debug_hides_secret() {
    let credentials = WeChatCredentials {
        appid: "wx-app".to_owned(),
        secret: Zeroizing::new("s3cret".to_owned()),
    };
    assert!(!format!("{credentials:?}").contains("s3cret"));
}
