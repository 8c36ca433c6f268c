//! Scoped acquisition of a host's update resource

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::host::GraphHost;

/// Guard that holds a host inside one update batch.
///
/// `begin_update` runs when the scope is entered and `end_update` when the
/// guard is dropped, so the batch is closed on normal return and when an error
/// is propagated with `?` from inside the scope.
pub struct UpdateScope<'a, H: GraphHost + ?Sized> {
    host: &'a mut H,
}

impl<'a, H: GraphHost + ?Sized> UpdateScope<'a, H> {
    /// Open a batch on `host`
    pub fn enter(host: &'a mut H) -> Self {
        host.begin_update();
        trace!("Entered update scope");
        Self { host }
    }
}

impl<H: GraphHost + ?Sized> Deref for UpdateScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: GraphHost + ?Sized> DerefMut for UpdateScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: GraphHost + ?Sized> Drop for UpdateScope<'_, H> {
    fn drop(&mut self) {
        self.host.end_update();
        trace!("Left update scope");
    }
}
