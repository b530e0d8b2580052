pub mod exchanges;
pub mod long_short;
