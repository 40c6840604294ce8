use serde::{Deserialize, Serialize};
use serde_json::Value;

/// **Top-level OpenRTB Bid Request**
/// 适配核心只读取其中的 imp / app / cur / test 字段，
/// 其余字段原样透传给 bidder 插件。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BidRequest {
    pub id: String,               // 请求 ID，每个竞价请求唯一
    pub imp: Vec<Imp>,            // 广告展示请求（Impression）列表
    pub site: Option<Site>,       // 网站信息（如果请求来源是 Web）
    pub app: Option<App>,         // 应用信息（存在即表示移动 App 流量）
    pub device: Option<Device>,   // 设备信息（用户的浏览器、IP、设备 ID）
    pub user: Option<User>,       // 用户信息
    pub test: Option<i32>,        // 是否是测试请求（1 = 捕获调试信息, 0 = 真实竞价）
    pub tmax: Option<u64>,        // 竞价超时时间（毫秒）
    pub cur: Option<Vec<String>>, // 可接受的结算货币（ISO 4217，如 USD, EUR）
    pub ext: Option<Value>,       // 扩展字段，原样透传
}

impl BidRequest {
    /// test == 1 时需要捕获 HTTP 调用的调试信息
    pub fn is_debug(&self) -> bool {
        self.test == Some(1)
    }
}

/// **Impression（广告展示请求）**
/// banner / video / audio / native 四个子类型至少声明一个。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Imp {
    pub id: String,                  // 展示请求 ID
    pub banner: Option<Banner>,      // Banner 广告信息
    pub video: Option<Video>,        // 视频广告信息
    pub audio: Option<Audio>,        // 音频广告信息
    pub native: Option<Native>,      // 原生广告信息
    pub tagid: Option<String>,       // 该 Impression 在媒体系统中的标识符
    pub bidfloor: Option<f64>,       // 最低竞价（默认货币单位）
    pub bidfloorcur: Option<String>, // 最低竞价的货币类型（如 USD, EUR）
    pub ext: Option<Value>,          // 扩展字段，原样透传
}

/// **Banner（横幅广告）**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Banner {
    pub w: Option<i32>,              // Banner 宽度（像素）
    pub h: Option<i32>,              // Banner 高度（像素）
    pub format: Option<Vec<Format>>, // 允许的广告格式（多个尺寸）
}

/// **Video（视频广告）**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Video {
    pub mimes: Vec<String>,          // 支持的视频格式（如 video/mp4）
    pub minduration: Option<i32>,    // 最短持续时间（秒）
    pub maxduration: Option<i32>,    // 最长持续时间（秒）
    pub protocols: Option<Vec<i32>>, // 支持的视频协议（如 VAST）
    pub w: Option<i32>,              // 视频宽度（像素）
    pub h: Option<i32>,              // 视频高度（像素）
}

/// **Audio（音频广告）**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Audio {
    pub mimes: Vec<String>,       // 支持的音频格式（如 audio/mp3）
    pub minduration: Option<i32>, // 最短播放时长（秒）
    pub maxduration: Option<i32>, // 最长播放时长（秒）
}

/// **Native（原生广告）**
/// request 字段是内嵌的原生广告请求 JSON 字符串，
/// 结构见 `crate::openrtb::native::NativeRequest`。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Native {
    pub request: String,     // 原生广告请求 JSON
    pub ver: Option<String>, // Native Ads API 版本（如 "1.2"）
}

/// **Format（Banner 格式）**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Format {
    pub w: i32, // 宽度（像素）
    pub h: i32, // 高度（像素）
}

/// **网站信息**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Site {
    pub id: String,             // 网站 ID
    pub name: Option<String>,   // 网站名称
    pub domain: Option<String>, // 网站域名
}

/// **App 信息**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct App {
    pub id: String,             // 应用 ID
    pub name: Option<String>,   // 应用名称
    pub bundle: Option<String>, // 应用包名（com.example.app）
}

/// **设备信息**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Device {
    pub ua: Option<String>, // 用户代理（User-Agent）
    pub ip: Option<String>, // 设备 IP 地址
}

/// **用户信息**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: Option<String>, // 用户 ID
}
