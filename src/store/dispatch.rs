use crate::error::Result;
use crate::module::ActionFuture;
use futures::future::{maybe_done, MaybeDone};
use futures::task::noop_waker_ref;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Pending result of [`Store::dispatch`](crate::Store::dispatch).
///
/// Every handler future is polled once when the dispatch is created, so an
/// action runs up to its first suspension point (or to completion) before
/// `dispatch` returns. Awaiting the handle drives the rest and resolves to
/// each handler's result in registration order, or to the first error any
/// handler returned.
#[must_use = "actions still suspended after dispatch only resume while the dispatch is polled"]
pub struct Dispatch {
    kind: String,
    pending: Vec<MaybeDone<ActionFuture>>,
}

impl Dispatch {
    pub(crate) fn new(kind: &str, pending: Vec<ActionFuture>) -> Self {
        let mut pending: Vec<_> = pending.into_iter().map(maybe_done).collect();
        let mut cx = Context::from_waker(noop_waker_ref());
        for future in pending.iter_mut() {
            let _ = Pin::new(future).poll(&mut cx);
        }
        Self {
            kind: kind.to_string(),
            pending,
        }
    }

    /// Fully-qualified action name that was dispatched.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether every handler has already finished.
    pub fn is_settled(&self) -> bool {
        self.pending
            .iter()
            .all(|future| matches!(future, MaybeDone::Done(_)))
    }
}

impl Future for Dispatch {
    type Output = Result<Vec<Value>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut settled = true;
        for future in self.pending.iter_mut() {
            if Pin::new(future).poll(cx).is_pending() {
                settled = false;
            }
        }
        if !settled {
            return Poll::Pending;
        }

        Poll::Ready(
            self.pending
                .iter_mut()
                .filter_map(|future| Pin::new(future).take_output())
                .collect(),
        )
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("kind", &self.kind)
            .field("settled", &self.is_settled())
            .finish()
    }
}
