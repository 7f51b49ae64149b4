/// Single-writer queue in front of the recorder
///
/// Popup messages and tab events arrive as independent JS callbacks. Each one
/// becomes a job on one channel, and a single task applies jobs in arrival
/// order, so no two read-modify-write cycles on the session ever interleave.
use futures::StreamExt;
use futures::channel::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::folders::Visit;
use crate::messages::{Request, Response};
use crate::navigation::TabUpdate;
use crate::service::{PageSource, Recorder};
use crate::store::{ContentStore, SettingsStore};

pub enum Job {
    Message(Request, oneshot::Sender<Response>),
    TabUpdated(TabUpdate, oneshot::Sender<Result<Visit>>),
}

/// Cloneable sender side of the queue
#[derive(Clone)]
pub struct RecorderHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

pub fn channel() -> (RecorderHandle, mpsc::UnboundedReceiver<Job>) {
    let (jobs, rx) = mpsc::unbounded();
    (RecorderHandle { jobs }, rx)
}

fn stopped() -> Error {
    Error::storage("background recorder is not running")
}

impl RecorderHandle {
    pub async fn request(&self, request: Request) -> Response {
        let (reply, answer) = oneshot::channel();
        if self.jobs.unbounded_send(Job::Message(request, reply)).is_err() {
            return stopped().into();
        }
        answer.await.unwrap_or_else(|_| stopped().into())
    }

    pub async fn tab_updated(&self, update: TabUpdate) -> Result<Visit> {
        let (reply, answer) = oneshot::channel();
        self.jobs
            .unbounded_send(Job::TabUpdated(update, reply))
            .map_err(|_| stopped())?;
        answer.await.map_err(|_| stopped())?
    }
}

/// Drain the queue until every handle is dropped
pub async fn run_queue<S, C, P>(mut recorder: Recorder<S, C, P>, mut jobs: mpsc::UnboundedReceiver<Job>)
where
    S: SettingsStore,
    C: ContentStore,
    P: PageSource,
{
    log::debug!("Recorder queue started");
    while let Some(job) = jobs.next().await {
        match job {
            Job::Message(request, reply) => {
                let response = recorder.handle(request).await;
                // The sender may have given up waiting; nothing to do then
                let _ = reply.send(response);
            }
            Job::TabUpdated(update, reply) => {
                let outcome = recorder.on_tab_updated(&update).await;
                if let Err(e) = &outcome {
                    log::error!("Failed to record visit for tab {}: {}", update.tab_id, e);
                }
                let _ = reply.send(outcome);
            }
        }
    }
    log::debug!("Recorder queue closed");
}
