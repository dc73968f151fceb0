pub mod auth_handlers;
pub mod event_handlers;
pub mod guest_handlers;
pub mod invitation_handlers;
pub mod report_handlers;
pub mod response_handlers;
