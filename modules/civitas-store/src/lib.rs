pub mod client;
pub mod lifecycle;
pub mod reader;
pub mod routing;
pub mod similar;
pub mod writer;
pub mod zones;

mod rows;

pub use client::StoreClient;
pub use reader::{CategoryCount, ComplaintReader};
pub use routing::{AssignmentRouter, RoutingTable};
pub use similar::{SimilarQuery, SimilarityMatcher};
pub use writer::ComplaintWriter;
pub use zones::{ZoneAggregator, ZoneThresholds};
