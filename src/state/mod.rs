pub mod app_settings;
pub mod app_state;
pub mod consistency;
pub mod dashboard;
pub mod field;
pub mod form;
pub mod messages;
pub mod network;
pub mod notifications;
pub mod schema;
pub mod selector;
