pub mod aggregate;
pub mod filter;
pub mod stats;
pub mod temporal;

pub use aggregate::{cumulative_sum, first_record_stages, grouped_sum, mean, total, GroupTotal, Mean, Stage};
pub use filter::{equals, within, FilterValue, Selection, ALL};
pub use temporal::{bucket_cumulative, Granularity, PeriodPoint};
