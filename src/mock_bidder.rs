use axum::http::StatusCode;
use axum::serve;
use axum::{routing::get, routing::post, Json, Router};
use rand::Rng;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::openrtb::request::BidRequest;
use crate::openrtb::response::{Bid, BidResponse, SeatBid};

/// 模拟 bidder 竞价响应
/// 为每个 impression 生成一条出价，按广告类型下发对应格式的 adm。
/// 原生广告的 markup 故意不带 img.type，由适配核心负责补全。
async fn handle_bid(Json(request): Json<BidRequest>) -> Json<BidResponse> {
    info!(
        "Mock bidder received BidRequest: id={}, imp_count={}",
        request.id,
        request.imp.len()
    );

    // 模拟 bidder 处理延迟（10 ~ 60 毫秒）
    let delay_ms = rand::thread_rng().gen_range(10..60);
    sleep(Duration::from_millis(delay_ms)).await;

    let mut bids = Vec::new();

    for imp in &request.imp {
        let bid_id = format!("bid-{}", imp.id);
        let bidfloor = imp.bidfloor.unwrap_or(1.0);
        let multiplier = rand::thread_rng().gen_range(1.0..2.0);
        let price = bidfloor * multiplier;

        let adm = if imp.banner.is_some() {
            format!(
                "<html><body>Mock Banner Ad<img src=\"http://bidder-tracker.local/impression?bid={bid_id}\" style=\"display:none;\" /></body></html>",
                bid_id = bid_id
            )
        } else if imp.video.is_some() {
            format!(
                r#"<VAST version="3.0"><Ad id="{bid_id}"><InLine><AdSystem>Mock Bidder</AdSystem><Impression><![CDATA[http://bidder-tracker.local/impression?bid={bid_id}]]></Impression></InLine></Ad></VAST>"#,
                bid_id = bid_id
            )
        } else if imp.native.is_some() {
            json!({
                "assets": [
                    {"id": 1, "title": {"text": "Mock Native Ad"}},
                    {"id": 2, "img": {"url": "http://cdn.mock-bidder.local/native.jpg", "w": 1200, "h": 627}}
                ],
                "link": {"url": "http://advertiser.mock-bidder.local/landing"},
                "imptrackers": [format!("http://bidder-tracker.local/impression?bid={}", bid_id)]
            })
            .to_string()
        } else {
            format!(
                "<html><body>Mock Ad<img src=\"http://bidder-tracker.local/impression?bid={bid_id}\" style=\"display:none;\" /></body></html>",
                bid_id = bid_id
            )
        };

        bids.push(Bid {
            id: bid_id,
            impid: imp.id.clone(),
            price,
            adm: Some(adm),
            nurl: None,
            adomain: Some(vec!["advertiser.mock-bidder.local".to_string()]),
            cid: None,
            crid: Some("mock-creative-1".to_string()),
            dealid: None,
            w: None,
            h: None,
            ext: None,
        });
    }

    Json(BidResponse {
        id: request.id.clone(),
        seatbid: vec![SeatBid {
            bid: bids,
            seat: Some("mock_seat".to_string()),
            group: Some(0),
        }],
        bidid: None,
        cur: Some("USD".to_string()),
        customdata: None,
        nbr: None,
    })
}

/// 超时通知端点：记一条日志即可，响应内容无人消费
async fn handle_timeout_notification() -> StatusCode {
    info!("Mock bidder received timeout notification");
    StatusCode::NO_CONTENT
}

/// 启动 Mock bidder 服务
/// 服务监听指定端口，竞价路由为 `/bid`，超时通知路由为 `/timeout-notify`
pub async fn start_mock_bidder_server(port: u16) {
    let app = Router::new()
        .route("/bid", post(handle_bid))
        .route("/timeout-notify", get(handle_timeout_notification));

    let addr = format!("0.0.0.0:{}", port);
    info!("Mock bidder running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await.unwrap();
    serve(listener, app).await.unwrap();
}
