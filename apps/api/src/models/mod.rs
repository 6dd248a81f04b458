pub mod candidate;
pub mod response;
