use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("groqchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("groqchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("groqchat.client.request_duration_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("groqchat.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("groqchat.chat.turn_errors");
pub(crate) static CHAT_CONTEXT_MESSAGES: Moments = Moments::new("groqchat.chat.context_messages");
pub(crate) static CHAT_CLEARS: Counter = Counter::new("groqchat.chat.clears");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);
    collector.register_moments(&CHAT_CONTEXT_MESSAGES);
    collector.register_counter(&CHAT_CLEARS);
}
