mod get;
mod admin;
mod sessions;

pub use get::*;
pub use admin::*;
pub use sessions::*;
