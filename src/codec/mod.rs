pub mod nested;

pub use nested::{parse_number, NestedList, NumericPolicy, TWO_LEVEL};
