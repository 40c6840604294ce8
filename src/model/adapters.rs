// src/model/adapters.rs

use serde::{Deserialize, Serialize};
use serde_json::Result as JsonResult;
use std::fs;

use crate::model::currency::RateEntry;
use crate::model::seats::Seat;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigData {
    pub seats: Vec<Seat>,
    pub rates: Vec<RateEntry>,
}

/// 配置来源抽象：seat 注册表和汇率表从哪里来
pub trait ConfigAdapter: Send + Sync {
    fn get_seats(&self) -> Vec<Seat>;
    fn get_rates(&self) -> Vec<RateEntry>;
}

/// 从本地 JSON 文件读取配置
pub struct FileConfigAdapter {
    pub seats_file: String,
    pub rates_file: String,
}

impl FileConfigAdapter {
    pub fn new(seats_file: &str, rates_file: &str) -> Self {
        Self {
            seats_file: seats_file.to_string(),
            rates_file: rates_file.to_string(),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn get_seats(&self) -> Vec<Seat> {
        let content = fs::read_to_string(&self.seats_file).unwrap_or_else(|_| {
            eprintln!("Failed to read {}", &self.seats_file);
            "[]".to_string()
        });
        let config: JsonResult<Vec<Seat>> = serde_json::from_str(&content);
        match config {
            Ok(seats) => {
                println!("Parsed {} seats", seats.len());
                seats
            }
            Err(e) => {
                eprintln!("Failed to parse {}: {}", &self.seats_file, e);
                vec![]
            }
        }
    }

    fn get_rates(&self) -> Vec<RateEntry> {
        let content = fs::read_to_string(&self.rates_file).unwrap_or_else(|_| "[]".to_string());
        let config: JsonResult<Vec<RateEntry>> = serde_json::from_str(&content);
        config.unwrap_or_default()
    }
}
