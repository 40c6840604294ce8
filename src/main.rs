use clap::Parser;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use seat_adapter::bidding::adapter::SeatAdapter;
use seat_adapter::bidding::bidder::ExtraRequestInfo;
use seat_adapter::bidding::ortb::OrtbBidder;
use seat_adapter::config::config_manager::ConfigManager;
use seat_adapter::mock_bidder;
use seat_adapter::model::adapters::{ConfigAdapter, FileConfigAdapter};
use seat_adapter::model::currency::RateEntry;
use seat_adapter::model::seats::{Seat, SeatManager};
use seat_adapter::openrtb::request::{App, Banner, BidRequest, Imp, Native};

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "An OpenRTB seat-side bid adapter")]
struct CliArgs {
    #[arg(short, long, default_value_t = 9100)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    #[arg(long, default_value_t = 250)]
    deadline_ms: u64,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let log_file = rolling::hourly(&args.log_dir, "seat_adapter_log.json");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)
        .expect("Unable to set global tracing subscriber");
    info!("Seat adapter demo starting, mock bidder on port {}", args.port);

    // 启动 Mock bidder 服务器
    let mock_port = args.port;
    let mock_server = tokio::spawn(async move {
        mock_bidder::start_mock_bidder_server(mock_port).await;
    });
    // 等 mock 端口就绪
    sleep(Duration::from_millis(200)).await;

    // 从 /static 目录读取 seat 与汇率配置，缺失时退回指向本地 mock 的默认配置
    let adapter_cfg = FileConfigAdapter::new("static/seats.json", "static/rates.json");
    let mut seats = adapter_cfg.get_seats();
    if seats.is_empty() {
        let mut first = Seat::new(
            "mock_dsp",
            &format!("http://127.0.0.1:{}/bid", args.port),
            true,
            1.0,
        );
        first.notify_url = Some(format!("http://127.0.0.1:{}/timeout-notify", args.port));
        let second = Seat::new(
            "mock_discount_dsp",
            &format!("http://127.0.0.1:{}/bid", args.port),
            true,
            0.9,
        );
        seats = vec![first, second];
    }
    let mut seat_manager = SeatManager::new();
    for seat in seats {
        seat_manager.add_seat(seat);
    }

    let config = Arc::new(ConfigManager::new(seat_manager));
    let mut rates = adapter_cfg.get_rates();
    if rates.is_empty() {
        rates = vec![RateEntry {
            from: "EUR".to_string(),
            to: "USD".to_string(),
            rate: 1.1,
        }];
    }
    config.update_rates(rates);

    // 对每个启用的 seat 并发执行一次竞价适配
    let request = sample_bid_request();
    let client = reqwest::Client::new();
    let deadline_ms = args.deadline_ms;

    let tasks = config.active_seats().into_iter().map(|seat| {
        let mut request = request.clone();
        let rates = config.rates();
        let client = client.clone();
        async move {
            let mut bidder = OrtbBidder::new(&seat.endpoint);
            if let Some(notify_url) = &seat.notify_url {
                bidder = bidder.with_notify_url(notify_url);
            }
            let adapter = SeatAdapter::new(&seat.name, Arc::new(bidder), client);

            let deadline = Instant::now() + Duration::from_millis(deadline_ms);
            let (seat_bid, errs) = adapter
                .request_bid(
                    &mut request,
                    seat.bid_adjustment,
                    &rates,
                    deadline,
                    &ExtraRequestInfo::default(),
                )
                .await;

            let aggregated_log = json!({
                "request_id": request.id,
                "seat": seat.name,
                "adapt_result": (match &seat_bid {
                    Some(seat_bid) if !seat_bid.bids.is_empty() => "success",
                    _ => "no_bids",
                }),
                "currency": seat_bid.as_ref().map(|s| s.currency.clone()),
                "bids": seat_bid.as_ref().map(|s| s.bids.iter().map(|b| json!({
                    "id": b.bid.as_ref().map(|bid| bid.id.clone()),
                    "impid": b.bid.as_ref().map(|bid| bid.impid.clone()),
                    "price": b.bid.as_ref().map(|bid| bid.price),
                    "type": b.bid_type.to_string(),
                })).collect::<Vec<_>>()),
                "http_calls": seat_bid.as_ref().map(|s| &s.http_calls),
                "errors": errs.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            });
            info!("{}", aggregated_log);
        }
    });
    join_all(tasks).await;

    mock_server.abort();
    info!("Seat adapter demo finished");
}

/// 构造一条演示用竞价请求：一个 banner 位 + 一个原生广告位，
/// App 流量 + test 模式，完整走一遍原生 markup 补全和调试捕获
fn sample_bid_request() -> BidRequest {
    let native_request = json!({
        "ver": "1.2",
        "assets": [
            {"id": 1, "required": 1, "title": {"len": 90}},
            {"id": 2, "required": 1, "img": {"type": 3, "w": 1200, "h": 627}}
        ]
    });

    BidRequest {
        id: "demo-req-1".to_string(),
        imp: vec![
            Imp {
                id: "imp1".to_string(),
                banner: Some(Banner {
                    w: Some(300),
                    h: Some(250),
                    format: None,
                }),
                video: None,
                audio: None,
                native: None,
                tagid: Some("demo-banner-slot".to_string()),
                bidfloor: Some(0.5),
                bidfloorcur: Some("USD".to_string()),
                ext: None,
            },
            Imp {
                id: "imp2".to_string(),
                banner: None,
                video: None,
                audio: None,
                native: Some(Native {
                    request: native_request.to_string(),
                    ver: Some("1.2".to_string()),
                }),
                tagid: Some("demo-native-slot".to_string()),
                bidfloor: Some(1.0),
                bidfloorcur: Some("USD".to_string()),
                ext: None,
            },
        ],
        site: None,
        app: Some(App {
            id: "demo-app".to_string(),
            name: Some("Demo App".to_string()),
            bundle: Some("com.example.demo".to_string()),
        }),
        device: None,
        user: None,
        test: Some(1),
        tmax: Some(250),
        cur: Some(vec!["USD".to_string()]),
        ext: None,
    }
}
