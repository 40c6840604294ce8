// src/model/currency.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::BidError;

/// 汇率查询协作方。返回的 rate 满足 amount_to = amount_from × rate。
/// 实现必须容忍同币种查询（from == to 时返回 1.0）。
pub trait Conversions: Send + Sync {
    fn get_rate(&self, from: &str, to: &str) -> Result<f64, BidError>;
}

/// 配置文件中的单条汇率
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateEntry {
    pub from: String, // 源货币（ISO 4217）
    pub to: String,   // 目标货币（ISO 4217）
    pub rate: f64,    // 乘数
}

/// 静态汇率表。查不到正向汇率时尝试用反向汇率的倒数。
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<(String, String), f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<RateEntry>) -> Self {
        let mut rates = HashMap::new();
        for entry in entries {
            rates.insert((entry.from, entry.to), entry.rate);
        }
        Self { rates }
    }

    pub fn insert(&mut self, from: &str, to: &str, rate: f64) {
        self.rates.insert((from.to_string(), to.to_string()), rate);
    }
}

impl Conversions for RateTable {
    fn get_rate(&self, from: &str, to: &str) -> Result<f64, BidError> {
        if from == to {
            return Ok(1.0);
        }
        if let Some(rate) = self.rates.get(&(from.to_string(), to.to_string())) {
            return Ok(*rate);
        }
        // 反向汇率兜底
        if let Some(rate) = self.rates.get(&(to.to_string(), from.to_string())) {
            if *rate != 0.0 {
                return Ok(1.0 / rate);
            }
        }
        Err(BidError::NoConversionRate {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
