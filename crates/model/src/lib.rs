pub mod bulk;
pub mod document;
pub mod job;
pub mod ops;
