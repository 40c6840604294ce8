// src/bidding/client.rs

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Url};
use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::debug;

use crate::bidding::bidder::{Bidder, RequestData, ResponseData};
use crate::error::BidError;

/// 超时通知请求的独立预算（不继承竞价 deadline，竞价 deadline 此时已经过期）
const TIMEOUT_NOTIFICATION_BUDGET: Duration = Duration::from_millis(200);

/// 一次出站调用的完整结果。request 始终保留用于调试透出；
/// BadServerResponse 情形下 response 与 error 同时存在，以 error 为准。
#[derive(Debug)]
pub struct CallInfo {
    pub request: RequestData,
    pub response: Option<ResponseData>,
    pub error: Option<BidError>,
}

impl CallInfo {
    fn failed(request: RequestData, error: BidError) -> Self {
        Self {
            request,
            response: None,
            error: Some(error),
        }
    }
}

/// 并发执行全部出站请求，按完成顺序收集恰好 |requests| 个结果。
/// 只有一条请求时直接在当前任务上执行，结果仍通过同一收集通道发布。
/// deadline 到期时，所有在途调用都会以超时结果落地，收集端不会悬挂。
pub async fn dispatch(
    client: &Client,
    bidder: &Arc<dyn Bidder>,
    mut requests: Vec<RequestData>,
    deadline: Instant,
) -> Vec<CallInfo> {
    let total = requests.len();
    let (tx, mut rx) = mpsc::channel::<CallInfo>(total.max(1));

    if total == 1 {
        if let Some(request) = requests.pop() {
            let info = do_call(client.clone(), Arc::clone(bidder), request, deadline).await;
            // 容量为 1 的通道，send 不会阻塞
            let _ = tx.send(info).await;
        }
    } else {
        for request in requests {
            let tx = tx.clone();
            let client = client.clone();
            let bidder = Arc::clone(bidder);
            tokio::spawn(async move {
                let _ = tx.send(do_call(client, bidder, request, deadline).await).await;
            });
        }
    }
    drop(tx);

    let mut results = Vec::with_capacity(total);
    while results.len() < total {
        match rx.recv().await {
            Some(info) => results.push(info),
            None => break,
        }
    }
    results
}

/// 单条出站调用：构造请求、受 deadline 约束地发送并读取响应体、归类结果
async fn do_call(
    client: Client,
    bidder: Arc<dyn Bidder>,
    request: RequestData,
    deadline: Instant,
) -> CallInfo {
    let builder = match build_http_request(&client, &request) {
        Ok(builder) => builder,
        Err(err) => return CallInfo::failed(request, err),
    };

    let response = match timeout_at(deadline, builder.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return CallInfo::failed(request, BidError::Network(e.to_string())),
        Err(elapsed) => {
            spawn_timeout_notification(&client, &bidder, &request);
            return CallInfo::failed(request, BidError::Timeout(elapsed.to_string()));
        }
    };

    let status_code = response.status().as_u16();
    let headers = response.headers().clone();

    // 响应体全量读入内存，读取阶段同样受 deadline 约束
    let body = match timeout_at(deadline, response.bytes()).await {
        Ok(Ok(bytes)) => bytes.to_vec(),
        Ok(Err(e)) => return CallInfo::failed(request, BidError::Network(e.to_string())),
        Err(elapsed) => {
            spawn_timeout_notification(&client, &bidder, &request);
            return CallInfo::failed(request, BidError::Timeout(elapsed.to_string()));
        }
    };

    let error = if !(200..400).contains(&status_code) {
        Some(BidError::BadServerResponse(format!(
            "Server responded with failure status: {}. Set request.test = 1 for debugging info.",
            status_code
        )))
    } else {
        None
    };

    CallInfo {
        request,
        response: Some(ResponseData {
            status_code,
            body,
            headers,
        }),
        error,
    }
}

fn build_http_request(
    client: &Client,
    data: &RequestData,
) -> Result<reqwest::RequestBuilder, BidError> {
    let method = Method::from_bytes(data.method.as_bytes())
        .map_err(|e| BidError::InvalidRequest(format!("invalid method {:?}: {}", data.method, e)))?;
    let url = Url::parse(&data.uri)
        .map_err(|e| BidError::InvalidRequest(format!("invalid uri {:?}: {}", data.uri, e)))?;
    Ok(client
        .request(method, url)
        .headers(data.headers.clone())
        .body(data.body.clone()))
}

/// 出站请求超时后，若插件具备 TimeoutBidder 能力，
/// 在分离任务上发送一条尽力而为的通知：响应丢弃、失败静默，
/// 通知自身超时不再递归上报。
fn spawn_timeout_notification(client: &Client, bidder: &Arc<dyn Bidder>, timed_out: &RequestData) {
    if bidder.as_timeout_bidder().is_none() {
        return;
    }
    let client = client.clone();
    let bidder = Arc::clone(bidder);
    let timed_out = timed_out.clone();
    tokio::spawn(async move {
        let Some(timeout_bidder) = bidder.as_timeout_bidder() else {
            return;
        };
        let (notification, errors) = timeout_bidder.make_timeout_notification(&timed_out);
        let Some(notification) = notification else {
            return;
        };
        if !errors.is_empty() {
            return;
        }
        debug!(uri = %notification.uri, "sending bidder timeout notification");
        if let Ok(builder) = build_http_request(&client, &notification) {
            let _ = timeout(TIMEOUT_NOTIFICATION_BUDGET, builder.send()).await;
        }
    });
}
