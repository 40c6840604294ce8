// src/model/seats.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seat（需求方席位）基础信息结构体，表示一个 bidder 的基本配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,               // seat 名称（唯一，作为调试信息的 key）
    pub endpoint: String,           // bidder 竞价 API 地址
    pub status: bool,               // 是否启用
    pub bid_adjustment: f64,        // 出价调整系数，对每个出价单独生效
    pub notify_url: Option<String>, // 超时通知地址，配置后启用 TimeoutBidder 能力
}

impl Seat {
    pub fn new(name: &str, endpoint: &str, status: bool, bid_adjustment: f64) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            status,
            bid_adjustment,
            notify_url: None,
        }
    }
}

/// Seat 管理器，管理多个 seat 的配置
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeatManager {
    pub seats: HashMap<String, Seat>,
}

impl SeatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_seat(&mut self, seat: Seat) {
        self.seats.insert(seat.name.clone(), seat);
    }

    pub fn remove_seat(&mut self, name: &str) {
        self.seats.remove(name);
    }

    pub fn get_seat(&self, name: &str) -> Option<&Seat> {
        self.seats.get(name)
    }

    /// 获取所有启用的 seat（status 为 true）
    pub fn active_seats(&self) -> Vec<Seat> {
        self.seats.values().filter(|s| s.status).cloned().collect()
    }
}
