pub mod dashboard;
pub mod records;

pub use dashboard::{DashboardService, DashboardStats};
pub use records::RecordList;
