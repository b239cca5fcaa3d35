mod post;
mod get;
mod update;
mod delete;

pub use post::*;
pub use get::*;
pub use update::*;
pub use delete::*;
