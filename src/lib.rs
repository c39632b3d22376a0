pub mod data;
pub mod expenses;
pub mod report;
pub mod source;
