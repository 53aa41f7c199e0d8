use super::types::AppEvent;

use std::fmt;
use std::sync::Arc;
#[cfg(test)]
use std::sync::mpsc;

type PostFn = dyn Fn(AppEvent) -> bool + Send + Sync;

/*
 * Posts `AppEvent`s into the platform's run loop from any thread. Cloned into
 * the completion callback of an editor launch. Each frontend supplies how an
 * event reaches its loop; the poster returns false once the loop is gone.
 */
#[derive(Clone)]
pub struct AppEventSender {
    post: Arc<PostFn>,
}

impl AppEventSender {
    pub(crate) fn new(post: impl Fn(AppEvent) -> bool + Send + Sync + 'static) -> Self {
        AppEventSender {
            post: Arc::new(post),
        }
    }

    pub fn send(&self, event: AppEvent) {
        if !(self.post)(event) {
            log::warn!("Platform: Event loop has stopped, dropping posted event.");
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test() -> (Self, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        (AppEventSender::new(move |event| tx.send(event).is_ok()), rx)
    }
}

impl fmt::Debug for AppEventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEventSender").finish_non_exhaustive()
    }
}
