// src/bidding/ortb.rs

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::bidding::bidder::{
    BidType, Bidder, BidderResponse, ExtraRequestInfo, RequestData, ResponseData, TimeoutBidder,
    TypedBid,
};
use crate::error::BidError;
use crate::openrtb::request::{BidRequest, Imp};
use crate::openrtb::response::BidResponse;

/// 通用直传 OpenRTB 插件：把整个竞价请求原样 POST 到配置的端点，
/// 并按标准 BidResponse 解析出价。适用于任何说标准 OpenRTB 的 bidder。
pub struct OrtbBidder {
    endpoint: String,
    notify_url: Option<String>,
}

impl OrtbBidder {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            notify_url: None,
        }
    }

    /// 配置超时通知地址后，该插件对外宣告 TimeoutBidder 能力
    pub fn with_notify_url(mut self, notify_url: &str) -> Self {
        self.notify_url = Some(notify_url.to_string());
        self
    }
}

impl Bidder for OrtbBidder {
    fn make_requests(
        &self,
        request: &BidRequest,
        _req_info: &ExtraRequestInfo,
    ) -> (Vec<RequestData>, Vec<BidError>) {
        let body = match serde_json::to_vec(request) {
            Ok(body) => body,
            Err(e) => return (Vec::new(), vec![BidError::Json(e)]),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        (
            vec![RequestData {
                method: "POST".to_string(),
                uri: self.endpoint.clone(),
                body,
                headers,
            }],
            Vec::new(),
        )
    }

    fn make_bids(
        &self,
        request: &BidRequest,
        _outbound: &RequestData,
        response: &ResponseData,
    ) -> (Option<BidderResponse>, Vec<BidError>) {
        // 204 约定为明确不出价
        if response.status_code == 204 || response.body.is_empty() {
            return (None, Vec::new());
        }

        let parsed: BidResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => return (None, vec![BidError::Json(e)]),
        };

        let mut result = BidderResponse::with_capacity(
            parsed.seatbid.iter().map(|seatbid| seatbid.bid.len()).sum(),
        );
        result.currency = parsed.cur.unwrap_or_default();

        let mut errs = Vec::new();
        for seatbid in parsed.seatbid {
            for bid in seatbid.bid {
                match media_type_for_imp(&bid.impid, &request.imp) {
                    Ok(bid_type) => result.bids.push(TypedBid {
                        bid: Some(bid),
                        bid_type,
                        bid_video: None,
                        deal_priority: 0,
                    }),
                    Err(e) => errs.push(e),
                }
            }
        }

        (Some(result), errs)
    }

    fn as_timeout_bidder(&self) -> Option<&dyn TimeoutBidder> {
        self.notify_url.as_ref().map(|_| self as &dyn TimeoutBidder)
    }
}

impl TimeoutBidder for OrtbBidder {
    fn make_timeout_notification(
        &self,
        _timed_out: &RequestData,
    ) -> (Option<RequestData>, Vec<BidError>) {
        let Some(url) = &self.notify_url else {
            return (None, Vec::new());
        };
        (
            Some(RequestData {
                method: "GET".to_string(),
                uri: url.clone(),
                body: Vec::new(),
                headers: HeaderMap::new(),
            }),
            Vec::new(),
        )
    }
}

/// 根据出价引用的 impression 声明的子类型推断媒体类型。
/// 多个子类型并存时按 banner > video > native > audio 取优先。
fn media_type_for_imp(imp_id: &str, imps: &[Imp]) -> Result<BidType, BidError> {
    let Some(imp) = imps.iter().find(|imp| imp.id == imp_id) else {
        return Err(BidError::BadServerResponse(format!(
            "Bid references unknown impression: {}",
            imp_id
        )));
    };
    if imp.banner.is_some() {
        Ok(BidType::Banner)
    } else if imp.video.is_some() {
        Ok(BidType::Video)
    } else if imp.native.is_some() {
        Ok(BidType::Native)
    } else if imp.audio.is_some() {
        Ok(BidType::Audio)
    } else {
        Err(BidError::BadServerResponse(format!(
            "Impression {} declares no supported media type",
            imp_id
        )))
    }
}
