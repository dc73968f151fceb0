use std::sync::Arc;

use rsvp_shared::auth::SessionManager;
use rsvp_shared::dispatch::InvitationDispatcher;
use rsvp_shared::token::TokenCodec;

/// Everything a handler needs, shared across requests.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub codec: Arc<TokenCodec>,
    pub sessions: Arc<SessionManager>,
    pub dispatcher: Arc<InvitationDispatcher>,
}

impl<S> AppState<S> {
    pub fn new(
        store: Arc<S>,
        codec: Arc<TokenCodec>,
        sessions: Arc<SessionManager>,
        dispatcher: Arc<InvitationDispatcher>,
    ) -> Self {
        Self {
            store,
            codec,
            sessions,
            dispatcher,
        }
    }
}

// Derived Clone would require S: Clone.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            codec: self.codec.clone(),
            sessions: self.sessions.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}
