//! Data module - CSV loading, joining and per-shipment derivation

pub mod filter;
pub mod joiner;
pub mod loader;
pub mod processor;
pub mod record;

pub use filter::RowFilter;
pub use loader::{DataLoader, LoaderError};
pub use processor::{DataProcessor, DeliveryStatus, EnrichedShipment, HubDwell, LastMileBucket};
pub use record::{RecordError, ShipmentRecord, ShipmentRow, TimestampParser};
