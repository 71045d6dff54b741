//! Cooperative runtime driving [`EndpointBridge`] (spec §5): ticks it on a
//! fixed-period timer and drains the resulting [`UpwardEvent`]s one at a
//! time from a pending queue between polls, rather than re-ticking the
//! bridge on every [`Stream::poll_next`] call.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::Interval;
use tokio_stream::Stream;

use crate::bridge::EndpointBridge;
use crate::error::Result;
use crate::events::{UpwardEvent, RECOMMENDED_TICK_INTERVAL};

/// Wraps a started [`EndpointBridge`] in a `tokio::time::interval`-driven
/// [`Stream`] of [`UpwardEvent`]s. Callers combine this with their own
/// frame-reception streams via `tokio::select!`, calling
/// [`Self::bridge_mut`]`().handle_frame(...)` on receive.
pub struct Engine {
    bridge: EndpointBridge,
    interval: Interval,
    pending: Vec<UpwardEvent>,
}

impl Engine {
    /// Builds an `Engine` over a bridge with every provider already
    /// registered, ticking at [`RECOMMENDED_TICK_INTERVAL`].
    pub fn new(bridge: EndpointBridge) -> Result<Self> {
        Self::with_tick_interval(bridge, RECOMMENDED_TICK_INTERVAL)
    }

    pub fn with_tick_interval(mut bridge: EndpointBridge, tick_period: Duration) -> Result<Self> {
        bridge.start()?;
        Ok(Self {
            bridge,
            interval: tokio::time::interval(tick_period),
            pending: Vec::new(),
        })
    }

    pub fn bridge(&self) -> &EndpointBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut EndpointBridge {
        &mut self.bridge
    }
}

impl Stream for Engine {
    type Item = UpwardEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(event) = this.pending.pop() {
            return Poll::Ready(Some(event));
        }

        loop {
            match this.interval.poll_tick(cx) {
                Poll::Ready(_instant) => {
                    let period = this.interval.period();
                    this.pending = this.bridge.tick(period);
                    this.pending.reverse();

                    if let Some(event) = this.pending.pop() {
                        return Poll::Ready(Some(event));
                    }
                    continue;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Unpin for Engine {}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_bridge() -> EndpointBridge {
        EndpointBridge::new()
    }

    #[test]
    fn new_rejects_an_unregistered_bridge() {
        let result = Engine::new(empty_bridge());
        assert!(result.is_err());
    }

    #[test]
    fn engine_is_unpin() {
        fn assert_unpin<T: Unpin>() {}
        assert_unpin::<Engine>();
    }
}
