use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenRTB Bid Response（bidder 端点返回的线上格式）
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BidResponse {
    pub id: String,                 // 对应 BidRequest.id
    pub seatbid: Vec<SeatBid>,      // 各 seat 的出价列表
    pub bidid: Option<String>,      // bidder 生成的响应 ID
    pub cur: Option<String>,        // 出价货币（ISO 4217），缺省按 USD 处理
    pub customdata: Option<String>, // bidder 自定义数据
    pub nbr: Option<i32>,           // 不出价原因码（No-Bid Reason）
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SeatBid {
    pub bid: Vec<Bid>,        // 出价列表
    pub seat: Option<String>, // seat 标识
    pub group: Option<i32>,   // 是否整组出价（1 = 全赢或全输）
}

/// 单个出价
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Bid {
    pub id: String,                   // 出价 ID
    pub impid: String,                // 对应的 Impression ID
    pub price: f64,                   // 出价（适配后为 seat-bid 货币）
    pub adm: Option<String>,          // 广告 markup（HTML / VAST / 原生 JSON）
    pub nurl: Option<String>,         // 获胜通知 URL
    pub adomain: Option<Vec<String>>, // 广告主域名
    pub cid: Option<String>,          // 广告活动 ID
    pub crid: Option<String>,         // 创意 ID
    pub dealid: Option<String>,       // 私有交易 ID
    pub w: Option<i32>,               // 创意宽度（像素）
    pub h: Option<i32>,               // 创意高度（像素）
    pub ext: Option<Value>,           // 扩展字段，原样保留
}
