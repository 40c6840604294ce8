// src/config/config_manager.rs

use std::sync::{Arc, RwLock};

use crate::model::currency::{RateEntry, RateTable};
use crate::model::seats::{Seat, SeatManager};

/// 运行期配置：seat 注册表 + 当前生效的汇率表。
/// 汇率表可整体热替换，读取方拿到的是当时的快照。
#[derive(Clone, Debug)]
pub struct ConfigManager {
    pub seat_manager: SeatManager,
    rates: Arc<RwLock<RateTable>>,
}

impl ConfigManager {
    pub fn new(seat_manager: SeatManager) -> Self {
        Self {
            seat_manager,
            rates: Arc::new(RwLock::new(RateTable::new())),
        }
    }

    pub fn active_seats(&self) -> Vec<Seat> {
        self.seat_manager.active_seats()
    }

    /// 当前汇率表快照
    pub fn rates(&self) -> RateTable {
        self.rates.read().unwrap().clone()
    }

    pub fn update_rates(&self, entries: Vec<RateEntry>) {
        let table = RateTable::from_entries(entries);
        {
            let mut lock = self.rates.write().unwrap();
            *lock = table;
        }
        println!("Currency rates configuration updated");
    }
}
