pub mod form;
pub mod popup;
pub mod selector;
