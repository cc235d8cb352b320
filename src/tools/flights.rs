//! 航班参考动作：票价查询与余票查询
//!
//! 城市名精确匹配（区分大小写，不做模糊匹配）；未知城市返回哨兵值而不是错误。

use serde::Serialize;

/// 未收录城市的票价哨兵值
pub const UNKNOWN_PRICE: &str = "Unknown";

const TICKET_PRICES: &[(&str, &str)] = &[
    ("London", "$799"),
    ("Paris", "$899"),
    ("Tokyo", "$1400"),
    ("Sydney", "$2100"),
];

/// 余票状态：有 / 无 / 未知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Yes,
    No,
    Unknown,
}

const AVAILABILITY: &[(&str, Availability)] = &[
    ("London", Availability::Yes),
    ("Paris", Availability::No),
    ("Tokyo", Availability::Yes),
    ("Sydney", Availability::No),
];

#[derive(Debug, Serialize)]
pub struct PriceQuote<'a> {
    pub destination_city: &'a str,
    pub price: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityReport<'a> {
    pub destination_city: &'a str,
    pub availability: Availability,
}

pub fn ticket_price(destination_city: &str) -> &'static str {
    TICKET_PRICES
        .iter()
        .find(|(city, _)| *city == destination_city)
        .map(|(_, price)| *price)
        .unwrap_or(UNKNOWN_PRICE)
}

pub fn ticket_availability(destination_city: &str) -> Availability {
    AVAILABILITY
        .iter()
        .find(|(city, _)| *city == destination_city)
        .map(|(_, a)| *a)
        .unwrap_or(Availability::Unknown)
}
