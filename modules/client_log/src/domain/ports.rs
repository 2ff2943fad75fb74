use crate::domain::event::ForwardedLog;

/// Output port: where validated browser events end up.
pub trait LogSink: Send + Sync + 'static {
    fn emit(&self, record: &ForwardedLog);
}
