//! Signal delivery.

use crate::domain::Signal;

/// Receives every emitted signal, in emission order per symbol.
pub trait SignalSink {
    fn on_signal(&mut self, signal: Signal);
}

impl SignalSink for Vec<Signal> {
    fn on_signal(&mut self, signal: Signal) {
        self.push(signal);
    }
}

/// Closures work as sinks, e.g. to forward onto a channel.
impl<F: FnMut(Signal)> SignalSink for F {
    fn on_signal(&mut self, signal: Signal) {
        self(signal)
    }
}
