pub mod visitor;

pub use visitor::{AnalyticsFilters, DeviceType, StoredVisitor, VisitorEvent, VisitorRecord};
