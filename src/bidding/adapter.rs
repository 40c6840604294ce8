// src/bidding/adapter.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::bidding::bidder::{BidType, BidVideo, Bidder, ExtraRequestInfo};
use crate::bidding::client::{dispatch, CallInfo};
use crate::bidding::markup::add_native_types;
use crate::error::BidError;
use crate::model::currency::Conversions;
use crate::openrtb::request::BidRequest;
use crate::openrtb::response::Bid;

const DEFAULT_CURRENCY: &str = "USD";

/// 单个 seat 的适配结果，由 auction orchestrator 消费。
/// currency 要么是 "USD"，要么是请求 cur 列表中的某个 ISO 码。
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdapterSeatBid {
    pub bids: Vec<AdapterBid>,        // 完成顺序，无语义排序
    pub currency: String,             // seat-bid 结算货币
    pub http_calls: Vec<HttpCallTrace>, // 仅 request.test == 1 时填充
    pub ext: Option<Value>,           // seat 级扩展
}

/// 适配后的单个出价。bid_targets 这里恒为空，由 orchestrator 稍后填写。
#[derive(Debug, Clone, Serialize)]
pub struct AdapterBid {
    pub bid: Option<Bid>,
    pub bid_type: BidType,
    pub bid_targets: HashMap<String, String>,
    pub bid_video: Option<BidVideo>,
    pub deal_priority: i32,
}

/// 一次出站 HTTP 调用的调试信息，最终出现在
/// response.ext.debug.httpcalls.<seat> 下，字段名为线上兼容格式。
#[derive(Debug, Clone, Default, Serialize)]
pub struct HttpCallTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "requestbody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(rename = "responsebody", skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// 单 seat 竞价适配器：把一个 bidder 插件接入竞价流程。
/// 共享的 reqwest::Client 可安全并发使用，克隆代价很低。
pub struct SeatAdapter {
    name: String,
    bidder: Arc<dyn Bidder>,
    client: reqwest::Client,
}

impl SeatAdapter {
    pub fn new(name: &str, bidder: Arc<dyn Bidder>, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            bidder,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 为一次竞价请求向该 seat 拉取出价。
    ///
    /// 成功与错误并存：返回值里 seat-bid 和错误列表可以同时非空，
    /// 调用方通过 bids 数量和错误数量判断各子请求的成败。
    /// 只有插件一条出站请求都没生成时返回 None。
    ///
    /// 对 request 的唯一修改：cur 为空时置为 ["USD"]。
    pub async fn request_bid(
        &self,
        request: &mut BidRequest,
        bid_adjustment: f64,
        conversions: &dyn Conversions,
        deadline: Instant,
        req_info: &ExtraRequestInfo,
    ) -> (Option<AdapterSeatBid>, Vec<BidError>) {
        let (requests, mut errs) = self.bidder.make_requests(request, req_info);
        if requests.is_empty() {
            // 既没有请求也没有解释，属于插件缺陷，合成一条错误
            if errs.is_empty() {
                errs.push(BidError::FailedToRequestBids(
                    "The adapter failed to generate any bid requests, but also failed to generate an error explaining why"
                        .to_string(),
                ));
            }
            return (None, errs);
        }

        debug!(seat = %self.name, requests = requests.len(), "dispatching bidder requests");
        let results = dispatch(&self.client, &self.bidder, requests, deadline).await;

        let mut seat_bid = AdapterSeatBid {
            bids: Vec::with_capacity(results.len()),
            currency: DEFAULT_CURRENCY.to_string(),
            http_calls: Vec::new(),
            ext: None,
        };

        // 部分结果照常入账：即使 deadline 中途到期，先完成的调用仍然产出出价
        for info in results {
            if request.is_debug() {
                seat_bid.http_calls.push(call_trace(&info));
            }

            if let Some(err) = info.error {
                errs.push(err);
                continue;
            }
            let Some(response) = info.response.as_ref() else {
                continue;
            };

            let (bid_response, more_errs) = self.bidder.make_bids(request, &info.request, response);
            errs.extend(more_errs);
            let Some(mut bid_response) = bid_response else {
                continue;
            };

            // 货币缺省：bidder 未声明按 USD，请求未限定按只收 USD
            if bid_response.currency.is_empty() {
                bid_response.currency = DEFAULT_CURRENCY.to_string();
            }
            if request.cur.as_ref().map_or(true, |cur| cur.is_empty()) {
                request.cur = Some(vec![DEFAULT_CURRENCY.to_string()]);
            }

            // 按声明顺序取第一个能换算的结算货币，之前的失败静默丢弃；
            // 全部失败时记录最后一个错误并丢弃本次响应的全部出价
            let acceptable = request.cur.clone().unwrap_or_default();
            let mut conversion_rate = None;
            let mut conversion_err = None;
            for cur in &acceptable {
                match conversions.get_rate(&bid_response.currency, cur) {
                    Ok(rate) => {
                        seat_bid.currency = cur.clone();
                        conversion_rate = Some(rate);
                        break;
                    }
                    Err(e) => conversion_err = Some(e),
                }
            }
            let Some(conversion_rate) = conversion_rate else {
                if let Some(e) = conversion_err {
                    errs.push(e);
                }
                continue;
            };

            // 仅移动 App 流量需要补全原生 markup 的 asset 类型
            if request.app.is_some() {
                for typed in bid_response.bids.iter_mut() {
                    if typed.bid_type != BidType::Native {
                        continue;
                    }
                    let Some(bid) = typed.bid.as_mut() else {
                        continue;
                    };
                    let (markup, more) = add_native_types(bid, request);
                    errs.extend(more);
                    if let Some(markup) = markup {
                        match serde_json::to_string(&markup) {
                            Ok(adm) => bid.adm = Some(adm),
                            // 序列化失败时保留原始 markup
                            Err(e) => errs.push(BidError::Json(e)),
                        }
                    }
                }
            }

            for mut typed in bid_response.bids {
                if let Some(bid) = typed.bid.as_mut() {
                    bid.price = bid.price * bid_adjustment * conversion_rate;
                }
                seat_bid.bids.push(AdapterBid {
                    bid: typed.bid,
                    bid_type: typed.bid_type,
                    bid_targets: HashMap::new(),
                    bid_video: typed.bid_video,
                    deal_priority: typed.deal_priority,
                });
            }
        }

        (Some(seat_bid), errs)
    }
}

/// 把一次调用结果转成调试信息。出错的调用只保留请求侧字段。
fn call_trace(info: &CallInfo) -> HttpCallTrace {
    match (&info.error, &info.response) {
        (None, Some(response)) => HttpCallTrace {
            uri: Some(info.request.uri.clone()),
            request_body: Some(String::from_utf8_lossy(&info.request.body).into_owned()),
            response_body: Some(String::from_utf8_lossy(&response.body).into_owned()),
            status: Some(response.status_code),
        },
        _ => HttpCallTrace {
            uri: Some(info.request.uri.clone()),
            request_body: Some(String::from_utf8_lossy(&info.request.body).into_owned()),
            ..Default::default()
        },
    }
}
