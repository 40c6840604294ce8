// 端到端场景：用进程内 axum 服务扮演 bidder 端点，驱动真实的
// 分发、收集与归一化流程。测试只断言结果，不依赖单请求/多请求
// 分发路径的执行方式。

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::header::HeaderMap;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration, Instant};

use seat_adapter::bidding::adapter::SeatAdapter;
use seat_adapter::bidding::bidder::{
    BidType, Bidder, BidderResponse, ExtraRequestInfo, RequestData, ResponseData, TimeoutBidder,
    TypedBid,
};
use seat_adapter::bidding::ortb::OrtbBidder;
use seat_adapter::error::BidError;
use seat_adapter::model::currency::RateTable;
use seat_adapter::openrtb::request::{App, Banner, BidRequest, Imp, Native};
use seat_adapter::openrtb::response::{Bid, BidResponse, SeatBid};

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn deadline_in(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

fn banner_request() -> BidRequest {
    BidRequest {
        id: "req-1".to_string(),
        imp: vec![Imp {
            id: "imp1".to_string(),
            banner: Some(Banner {
                w: Some(300),
                h: Some(250),
                format: None,
            }),
            video: None,
            audio: None,
            native: None,
            tagid: None,
            bidfloor: Some(0.5),
            bidfloorcur: None,
            ext: None,
        }],
        site: None,
        app: None,
        device: None,
        user: None,
        test: None,
        tmax: None,
        cur: None,
        ext: None,
    }
}

fn simple_bid(id: &str, imp_id: &str, price: f64, adm: Option<String>) -> Bid {
    Bid {
        id: id.to_string(),
        impid: imp_id.to_string(),
        price,
        adm,
        nurl: None,
        adomain: None,
        cid: None,
        crid: None,
        dealid: None,
        w: None,
        h: None,
        ext: None,
    }
}

fn simple_bid_response(request_id: &str, cur: Option<&str>, bids: Vec<Bid>) -> BidResponse {
    BidResponse {
        id: request_id.to_string(),
        seatbid: vec![SeatBid {
            bid: bids,
            seat: Some("test_seat".to_string()),
            group: None,
        }],
        bidid: None,
        cur: cur.map(|c| c.to_string()),
        customdata: None,
        nbr: None,
    }
}

fn ortb_adapter(addr: SocketAddr) -> SeatAdapter {
    SeatAdapter::new(
        "test_dsp",
        Arc::new(OrtbBidder::new(&format!("http://{}/bid", addr))),
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn single_request_happy_path() {
    let app = Router::new().route(
        "/bid",
        post(|Json(req): Json<BidRequest>| async move {
            Json(simple_bid_response(
                &req.id,
                Some("USD"),
                vec![simple_bid("b1", "imp1", 1.5, None)],
            ))
        }),
    );
    let addr = spawn_server(app).await;

    let adapter = ortb_adapter(addr);
    let mut request = banner_request();
    request.cur = Some(vec!["USD".to_string()]);

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    let seat_bid = seat_bid.expect("seat bid must exist when requests were made");
    assert_eq!(seat_bid.currency, "USD");
    assert_eq!(seat_bid.bids.len(), 1);
    let bid = seat_bid.bids[0].bid.as_ref().unwrap();
    assert!((bid.price - 1.5).abs() < 1e-9);
    assert_eq!(seat_bid.bids[0].bid_type, BidType::Banner);
    // test != 1，不捕获调试信息
    assert!(seat_bid.http_calls.is_empty());
}

#[tokio::test]
async fn currency_conversion_uses_first_convertible_code() {
    let app = Router::new().route(
        "/bid",
        post(|Json(req): Json<BidRequest>| async move {
            Json(simple_bid_response(
                &req.id,
                Some("EUR"),
                vec![simple_bid("b1", "imp1", 2.0, None)],
            ))
        }),
    );
    let addr = spawn_server(app).await;

    let adapter = ortb_adapter(addr);
    let mut request = banner_request();
    request.cur = Some(vec!["GBP".to_string(), "USD".to_string()]);

    // EUR→GBP 缺失，EUR→USD 可换算
    let mut rates = RateTable::new();
    rates.insert("EUR", "USD", 1.10);

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            0.9,
            &rates,
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    // 前面货币的换算失败被静默丢弃
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    let seat_bid = seat_bid.unwrap();
    assert_eq!(seat_bid.currency, "USD");
    assert_eq!(seat_bid.bids.len(), 1);
    let bid = seat_bid.bids[0].bid.as_ref().unwrap();
    assert!((bid.price - 2.0 * 0.9 * 1.10).abs() < 1e-9);
}

#[tokio::test]
async fn conversion_failure_discards_bids_and_reports_last_error() {
    let app = Router::new().route(
        "/bid",
        post(|Json(req): Json<BidRequest>| async move {
            Json(simple_bid_response(
                &req.id,
                Some("EUR"),
                vec![simple_bid("b1", "imp1", 2.0, None)],
            ))
        }),
    );
    let addr = spawn_server(app).await;

    let adapter = ortb_adapter(addr);
    let mut request = banner_request();
    request.cur = Some(vec!["GBP".to_string(), "CNY".to_string()]);

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    let seat_bid = seat_bid.unwrap();
    assert!(seat_bid.bids.is_empty());
    assert_eq!(errs.len(), 1);
    assert_eq!(
        errs[0].to_string(),
        "Currency conversion rate not found: 'EUR' => 'CNY'"
    );
}

/// 把同一请求打到多个端点的测试插件，具备超时通知能力
struct MultiBidder {
    uris: Vec<String>,
    notify_url: String,
}

impl Bidder for MultiBidder {
    fn make_requests(
        &self,
        request: &BidRequest,
        _req_info: &ExtraRequestInfo,
    ) -> (Vec<RequestData>, Vec<BidError>) {
        let body = serde_json::to_vec(request).unwrap();
        (
            self.uris
                .iter()
                .map(|uri| RequestData {
                    method: "POST".to_string(),
                    uri: uri.clone(),
                    body: body.clone(),
                    headers: HeaderMap::new(),
                })
                .collect(),
            Vec::new(),
        )
    }

    fn make_bids(
        &self,
        _request: &BidRequest,
        _outbound: &RequestData,
        response: &ResponseData,
    ) -> (Option<BidderResponse>, Vec<BidError>) {
        let parsed: BidResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => return (None, vec![BidError::Json(e)]),
        };
        let mut result = BidderResponse::with_capacity(1);
        result.currency = parsed.cur.unwrap_or_default();
        for seatbid in parsed.seatbid {
            for bid in seatbid.bid {
                result.bids.push(TypedBid {
                    bid: Some(bid),
                    bid_type: BidType::Banner,
                    bid_video: None,
                    deal_priority: 0,
                });
            }
        }
        (Some(result), Vec::new())
    }

    fn as_timeout_bidder(&self) -> Option<&dyn TimeoutBidder> {
        Some(self)
    }
}

impl TimeoutBidder for MultiBidder {
    fn make_timeout_notification(
        &self,
        _timed_out: &RequestData,
    ) -> (Option<RequestData>, Vec<BidError>) {
        (
            Some(RequestData {
                method: "GET".to_string(),
                uri: self.notify_url.clone(),
                body: Vec::new(),
                headers: HeaderMap::new(),
            }),
            Vec::new(),
        )
    }
}

async fn fast_bid(Json(req): Json<BidRequest>) -> Json<BidResponse> {
    Json(simple_bid_response(
        &req.id,
        Some("USD"),
        vec![simple_bid("b-fast", "imp1", 3.0, None)],
    ))
}

async fn slow_bid(Json(req): Json<BidRequest>) -> Json<BidResponse> {
    sleep(Duration::from_millis(500)).await;
    Json(simple_bid_response(
        &req.id,
        Some("USD"),
        vec![simple_bid("b-slow", "imp1", 9.0, None)],
    ))
}

async fn count_notification(State(counter): State<Arc<AtomicUsize>>) -> StatusCode {
    counter.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn partial_timeout_keeps_completed_bids_and_notifies() {
    let notify_counter = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/fast", post(fast_bid))
        .route("/slow", post(slow_bid))
        .route("/notify", get(count_notification))
        .with_state(notify_counter.clone());
    let addr = spawn_server(app).await;

    let bidder = MultiBidder {
        uris: vec![
            format!("http://{}/fast", addr),
            format!("http://{}/slow", addr),
            format!("http://{}/slow", addr),
        ],
        notify_url: format!("http://{}/notify", addr),
    };
    let adapter = SeatAdapter::new("multi_dsp", Arc::new(bidder), reqwest::Client::new());

    let mut request = banner_request();
    request.cur = Some(vec!["USD".to_string()]);

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(150),
            &ExtraRequestInfo::default(),
        )
        .await;

    let seat_bid = seat_bid.unwrap();
    assert_eq!(seat_bid.bids.len(), 1);
    assert_eq!(seat_bid.bids[0].bid.as_ref().unwrap().id, "b-fast");

    let timeouts = errs
        .iter()
        .filter(|e| matches!(e, BidError::Timeout(_)))
        .count();
    assert_eq!(timeouts, 2, "unexpected errors: {:?}", errs);

    // 两个超时的调用各触发一条分离任务上的通知
    let mut waited = Duration::ZERO;
    while notify_counter.load(Ordering::SeqCst) < 2 && waited < Duration::from_secs(2) {
        sleep(Duration::from_millis(50)).await;
        waited += Duration::from_millis(50);
    }
    assert_eq!(notify_counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn expired_deadline_times_out_every_call() {
    let app = Router::new().route("/slow", post(slow_bid));
    let addr = spawn_server(app).await;

    let bidder = MultiBidder {
        uris: vec![
            format!("http://{}/slow", addr),
            format!("http://{}/slow", addr),
            format!("http://{}/slow", addr),
        ],
        notify_url: format!("http://{}/notify", addr),
    };
    let adapter = SeatAdapter::new("multi_dsp", Arc::new(bidder), reqwest::Client::new());

    let mut request = banner_request();
    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            Instant::now(),
            &ExtraRequestInfo::default(),
        )
        .await;

    let seat_bid = seat_bid.unwrap();
    assert!(seat_bid.bids.is_empty());
    assert_eq!(errs.len(), 3);
    assert!(errs.iter().all(|e| matches!(e, BidError::Timeout(_))));
}

#[tokio::test]
async fn failure_status_is_surfaced_with_the_code() {
    let app = Router::new().route(
        "/bid",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable") }),
    );
    let addr = spawn_server(app).await;

    let adapter = ortb_adapter(addr);
    let mut request = banner_request();

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    let seat_bid = seat_bid.unwrap();
    assert!(seat_bid.bids.is_empty());
    assert_eq!(errs.len(), 1);
    assert!(matches!(errs[0], BidError::BadServerResponse(_)));
    assert!(errs[0].to_string().contains("503"));
    assert!(seat_bid.http_calls.is_empty());
}

#[tokio::test]
async fn debug_mode_captures_http_calls() {
    let app = Router::new().route(
        "/bid",
        post(|Json(req): Json<BidRequest>| async move {
            Json(simple_bid_response(
                &req.id,
                Some("USD"),
                vec![simple_bid("b1", "imp1", 1.0, None)],
            ))
        }),
    );
    let addr = spawn_server(app).await;

    let adapter = ortb_adapter(addr);
    let mut request = banner_request();
    request.test = Some(1);

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    assert!(errs.is_empty());
    let seat_bid = seat_bid.unwrap();
    assert_eq!(seat_bid.http_calls.len(), 1);
    let trace = &seat_bid.http_calls[0];
    assert_eq!(trace.uri.as_deref(), Some(format!("http://{}/bid", addr).as_str()));
    assert_eq!(trace.status, Some(200));
    assert!(trace.request_body.as_deref().unwrap().contains("req-1"));
    assert!(trace.response_body.as_deref().unwrap().contains("b1"));
}

#[tokio::test]
async fn empty_cur_defaults_to_usd_and_mutates_request() {
    let app = Router::new().route(
        "/bid",
        post(|Json(req): Json<BidRequest>| async move {
            // bidder 不声明货币
            Json(simple_bid_response(
                &req.id,
                None,
                vec![simple_bid("b1", "imp1", 1.0, None)],
            ))
        }),
    );
    let addr = spawn_server(app).await;

    let adapter = ortb_adapter(addr);
    let mut request = banner_request();
    assert!(request.cur.is_none());

    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    assert!(errs.is_empty());
    let seat_bid = seat_bid.unwrap();
    assert_eq!(seat_bid.currency, "USD");
    assert_eq!(seat_bid.bids.len(), 1);
    // 唯一被允许的输入修改
    assert_eq!(request.cur, Some(vec!["USD".to_string()]));
}

#[tokio::test]
async fn native_markup_is_enriched_for_app_traffic() {
    let adm = serde_json::json!({
        "assets": [{"id": 2, "img": {"url": "http://cdn.example.com/main.jpg"}}],
        "link": {"url": "http://advertiser.example.com"}
    });
    let app = Router::new().route(
        "/bid",
        post(move |Json(req): Json<BidRequest>| {
            let adm = adm.clone();
            async move {
                Json(simple_bid_response(
                    &req.id,
                    Some("USD"),
                    vec![simple_bid("b1", "imp1", 1.0, Some(adm.to_string()))],
                ))
            }
        }),
    );
    let addr = spawn_server(app).await;

    let native_request = serde_json::json!({
        "assets": [{"id": 2, "required": 1, "img": {"type": 3, "w": 1200, "h": 627}}]
    });
    let mut request = banner_request();
    request.app = Some(App {
        id: "app-1".to_string(),
        name: None,
        bundle: None,
    });
    request.imp[0] = Imp {
        id: "imp1".to_string(),
        banner: None,
        video: None,
        audio: None,
        native: Some(Native {
            request: native_request.to_string(),
            ver: Some("1.2".to_string()),
        }),
        tagid: None,
        bidfloor: None,
        bidfloorcur: None,
        ext: None,
    };

    let adapter = ortb_adapter(addr);
    let (seat_bid, errs) = adapter
        .request_bid(
            &mut request,
            1.0,
            &RateTable::new(),
            deadline_in(1000),
            &ExtraRequestInfo::default(),
        )
        .await;

    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    let seat_bid = seat_bid.unwrap();
    assert_eq!(seat_bid.bids.len(), 1);
    assert_eq!(seat_bid.bids[0].bid_type, BidType::Native);

    let enriched: serde_json::Value =
        serde_json::from_str(seat_bid.bids[0].bid.as_ref().unwrap().adm.as_ref().unwrap()).unwrap();
    assert_eq!(enriched["assets"][0]["img"]["type"], 3);
    // 其余 markup 内容原样保留
    assert_eq!(
        enriched["assets"][0]["img"]["url"],
        "http://cdn.example.com/main.jpg"
    );
    assert_eq!(enriched["link"]["url"], "http://advertiser.example.com");
}
