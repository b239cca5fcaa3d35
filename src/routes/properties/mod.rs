mod get;
mod admin;
mod gallery;

pub use get::*;
pub use admin::*;
pub use gallery::*;
