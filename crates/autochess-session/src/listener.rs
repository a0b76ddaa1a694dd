//! Background task that reacts to remote sign-out.
//!
//! The listener owns one auth subscription for the lifetime of the
//! session. It is stopped explicitly by [`SignOutListener::shutdown`],
//! which waits for the task to finish so that no event is handled after
//! it returns. Dropping the listener without shutting it down aborts the
//! task instead.

use std::sync::Arc;

use autochess_protocol::Codec;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::manager::Shared;
use crate::{AuthEvent, IdentityStore};

pub(crate) struct SignOutListener {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SignOutListener {
    /// Spawns the listener on the current Tokio runtime.
    pub(crate) fn spawn<S, C>(
        shared: Arc<Shared<S, C>>,
        mut events: broadcast::Receiver<AuthEvent>,
    ) -> Self
    where
        S: IdentityStore,
        C: Codec,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Shutdown wins over any event that is ready at the
                    // same time.
                    biased;

                    _ = &mut shutdown_rx => break,

                    event = events.recv() => match event {
                        Ok(AuthEvent::SignedOut) => {
                            shared.handle_sign_out();
                        }
                        Ok(AuthEvent::SignedIn(uid)) => {
                            debug!(%uid, "auth service reports signed-in user");
                        }
                        Err(RecvError::Lagged(missed)) => {
                            warn!(missed, "sign-out listener lagged behind auth events");
                        }
                        Err(RecvError::Closed) => {
                            debug!("auth event stream closed");
                            break;
                        }
                    },
                }
            }
            debug!("sign-out listener stopped");
        });

        Self {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Stops the listener and waits until it has exited.
    pub(crate) async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The task may already have exited on a closed stream.
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            if e.is_panic() {
                warn!(error = %e, "sign-out listener panicked");
            }
        }
    }
}

impl Drop for SignOutListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
