// Market data domain
pub mod period;
pub mod price_table;
pub mod symbol;

pub use period::Period;
pub use price_table::{DailyBar, MarketDataset, PriceTable};
pub use symbol::CryptoSymbol;
