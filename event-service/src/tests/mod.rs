mod event_handlers_test;
mod guest_handlers_test;
