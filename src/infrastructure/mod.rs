pub mod csv_bars;
pub mod mock;
pub mod observability;
pub mod sentiment;
pub mod universe;

pub use csv_bars::CsvBarProvider;
pub use mock::MockMarketDataProvider;
pub use universe::{UniverseCache, UniverseResolver, UniverseSnapshot};
