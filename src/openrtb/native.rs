use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// 原生广告的请求负载（imp.native.request 内嵌 JSON）与响应 markup（bid.adm）。
// 适配核心只关心 asset 的 id / img.type / data.type，其余字段一律通过
// flatten 的 extra 原样保留，保证 markup 重新序列化后不丢失 bidder 下发的内容。

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// 原生广告请求负载
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>, // Native Ads API 版本
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<NativeReqAsset>, // 请求的 asset 列表
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>, // 其余字段原样保留
}

/// 请求侧 asset，id 缺省按 0 处理（与线上格式的 omitempty 语义一致）
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeReqAsset {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64, // asset ID，响应侧按此回查
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<i32>, // 是否必填（1 = 是）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>, // 标题 asset（核心不解析）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<NativeReqImage>, // 图片 asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Value>, // 视频 asset（核心不解析）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NativeReqData>, // 数据 asset
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// 请求侧图片 asset，type 描述图片用途（1 = icon, 3 = 主图 …）
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeReqImage {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wmin: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmin: Option<i64>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// 请求侧数据 asset，type 描述数据含义（2 = 描述文本, 12 = CTA …）
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeReqData {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<i64>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// 原生广告响应 markup（bid.adm 解析后的结构）
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeMarkup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<NativeMarkupAsset>, // 响应的 asset 列表
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>, // 落地页链接
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imptrackers: Option<Vec<String>>, // 展示监测 URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jstracker: Option<String>, // JS 监测代码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// 响应侧 asset。bidder 通常不回填 img.type / data.type，
/// 适配核心负责从请求侧同 ID 的 asset 补全。
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeMarkupAsset {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<NativeMarkupImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NativeMarkupData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// 响应侧图片 asset
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeMarkupImage {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// 响应侧数据 asset
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NativeMarkupData {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}
