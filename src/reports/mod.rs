pub mod fanout;
pub mod period;
pub mod periodic;
pub mod render;
pub mod session;
pub mod summary;

pub use period::ReportPeriod;
