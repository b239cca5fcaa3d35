pub mod user_email;
pub mod phone_number;
pub mod slug;
pub mod price;
pub mod listing;
pub mod status;
