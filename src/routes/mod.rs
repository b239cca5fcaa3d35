mod error;
mod health_check;
mod confirm;
mod authentication;
mod profile;
mod properties;
mod agents;
mod formations;
mod order;
mod payments;
mod newsletter;
mod notifications;
mod settings;
mod geocoding;
mod home;

pub use error::*;
pub use health_check::*;
pub use confirm::*;
pub use authentication::*;
pub use profile::*;
pub use properties::*;
pub use agents::*;
pub use formations::*;
pub use order::*;
pub use payments::*;
pub use newsletter::*;
pub use notifications::*;
pub use settings::*;
pub use geocoding::*;
pub use home::*;
