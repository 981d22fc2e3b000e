pub mod coerce;
pub mod result_set;
pub mod value;

pub use coerce::ColumnKind;
pub use result_set::{Dataset, ResultSet, SubView};
pub use value::Scalar;
