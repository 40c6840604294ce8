// src/bidding/bidder.rs

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::BidError;
use crate::openrtb::request::BidRequest;
use crate::openrtb::response::Bid;

/// 一条待发送的出站 HTTP 请求描述。method / uri 对适配核心完全不透明，
/// 由 bidder 插件决定打到哪里、发什么。
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: String,     // HTTP 方法（"POST" / "GET" …）
    pub uri: String,        // bidder 端点
    pub body: Vec<u8>,      // 请求体（原始字节）
    pub headers: HeaderMap, // 请求头，原样透传
}

/// 一条已完成的 HTTP 响应。body 在分发阶段已全量读入内存。
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// 出价的媒体类型，决定后续的创意处理路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidType {
    Banner,
    Video,
    Audio,
    Native,
}

impl std::fmt::Display for BidType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BidType::Banner => write!(f, "banner"),
            BidType::Video => write!(f, "video"),
            BidType::Audio => write!(f, "audio"),
            BidType::Native => write!(f, "native"),
        }
    }
}

/// 视频出价的补充元信息，由插件按需填写
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidVideo {
    pub duration: Option<i64>,            // 创意时长（秒）
    pub primary_category: Option<String>, // 主分类（IAB）
}

/// 插件解析出的单个出价。bid 允许缺失：个别 bidder 会返回只有
/// 元信息没有 bid 本体的条目，下游需要容忍。
#[derive(Debug, Clone)]
pub struct TypedBid {
    pub bid: Option<Bid>,
    pub bid_type: BidType,
    pub bid_video: Option<BidVideo>,
    pub deal_priority: i32,
}

/// 插件对一次 HTTP 响应的解析结果
#[derive(Debug, Clone)]
pub struct BidderResponse {
    /// 出价货币（ISO 4217）。空串表示 bidder 未声明，按 USD 处理。
    pub currency: String,
    pub bids: Vec<TypedBid>,
}

impl BidderResponse {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            currency: String::new(),
            bids: Vec::with_capacity(capacity),
        }
    }
}

/// 随请求附带的入口信息，插件可据此微调出站请求
#[derive(Debug, Clone)]
pub struct ExtraRequestInfo {
    /// 请求进入服务的入口名（如 "openrtb2"）
    pub entry_point: String,
}

impl Default for ExtraRequestInfo {
    fn default() -> Self {
        Self {
            entry_point: "openrtb2".to_string(),
        }
    }
}

/// Bidder 插件契约。两个方法都是纯函数，不做任何 I/O；
/// 错误通过返回值累积，而不是提前失败。
pub trait Bidder: Send + Sync {
    /// 根据竞价请求生成 0..N 条出站 HTTP 请求。
    /// 错误描述"不理想"的情形（不支持的媒体类型、缺字段等），
    /// 最终会透出给发布者。
    fn make_requests(
        &self,
        request: &BidRequest,
        req_info: &ExtraRequestInfo,
    ) -> (Vec<RequestData>, Vec<BidError>);

    /// 把一次 HTTP 响应解析为出价列表。返回 None 表示本次响应
    /// 不产生出价（例如 bidder 明确不出价）。
    fn make_bids(
        &self,
        request: &BidRequest,
        outbound: &RequestData,
        response: &ResponseData,
    ) -> (Option<BidderResponse>, Vec<BidError>);

    /// 可选的超时通知能力。能力以显式访问器暴露，
    /// 不依赖运行时类型探测。
    fn as_timeout_bidder(&self) -> Option<&dyn TimeoutBidder> {
        None
    }
}

/// 可选能力：在某条出站请求超时后，向 bidder 发送一条尽力而为的通知
pub trait TimeoutBidder: Send + Sync {
    /// 根据超时的原始请求构造通知请求。返回 None 或任何错误都会
    /// 使通知被放弃。
    fn make_timeout_notification(
        &self,
        timed_out: &RequestData,
    ) -> (Option<RequestData>, Vec<BidError>);
}
