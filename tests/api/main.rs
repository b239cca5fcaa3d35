mod helpers;
mod health_check;
mod login;
mod user_profile;
mod formations;
mod orders;
mod newsletter;
mod notifications;
mod settings;
mod home;
mod geocoding;
