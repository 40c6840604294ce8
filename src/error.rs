// src/error.rs

use thiserror::Error;

/// 竞价适配过程中产生的非致命错误。
/// 所有错误都会被累积返回给调用方（最终透出给发布者），
/// 因此错误文案只描述可观察的现象，不描述内部调用路径。
#[derive(Error, Debug)]
pub enum BidError {
    /// 插件既没有生成出站请求，也没有给出原因
    #[error("{0}")]
    FailedToRequestBids(String),

    /// 共享 deadline 在请求在途时到期
    #[error("{0}")]
    Timeout(String),

    /// 对端返回了 [200, 400) 之外的 HTTP 状态码
    #[error("{0}")]
    BadServerResponse(String),

    /// 出站请求本身无法构造（非法 method / URI）
    #[error("{0}")]
    InvalidRequest(String),

    /// 发送或读取响应体阶段的传输错误
    #[error("{0}")]
    Network(String),

    /// JSON 解析 / 序列化失败（插件响应、原生广告 markup）
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// 原生广告 bid 找不到对应的 native impression
    #[error("Could not find native imp")]
    NativeImpNotFound,

    /// 响应 markup 中的 asset 在请求中同 ID 的 asset 上缺少对应子类型
    #[error("Response has {kind} asset with ID:{id} present that doesn't exist in the request")]
    AssetMismatch { kind: AssetKind, id: i64 },

    /// 响应 markup 中的 asset ID 在请求中完全不存在
    #[error("Unable to find asset with ID:{0} in the request")]
    MissingAsset(i64),

    /// 在可接受的结算货币中找不到任何汇率
    #[error("Currency conversion rate not found: '{from}' => '{to}'")]
    NoConversionRate { from: String, to: String },
}

/// AssetMismatch 错误中的 asset 子类型名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Data,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 线上兼容的错误文案带冠词："an Image" / "a Data"
        match self {
            AssetKind::Image => write!(f, "an Image"),
            AssetKind::Data => write!(f, "a Data"),
        }
    }
}
