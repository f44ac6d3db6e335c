//! Worker thread running remote calls for the UI.
//!
//! The UI sends [`RemoteCommand`]s; the worker executes them one at a time
//! on a current-thread tokio runtime and posts a [`RemoteEvent`] per command.
//! Dropping the command sender stops the worker after the call in flight.
//! If the worker dies mid-call the event channel disconnects, which the UI
//! treats as a failed result for whatever it had sent.
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, error};

use crate::error::RemoteError;
use crate::mapper;
use crate::model::{RemoteUser, UserId, UserInput};
use crate::remote::UserApi;

#[derive(Clone, Debug)]
pub enum RemoteCommand {
    FetchAll,
    Create { input: UserInput },
    Update { id: UserId, remote_id: u64, input: UserInput },
    Delete { id: UserId, remote_id: u64 },
}

pub enum RemoteEvent {
    Fetched(Result<Vec<RemoteUser>, RemoteError>),
    Created {
        input: UserInput,
        result: Result<RemoteUser, RemoteError>,
    },
    Updated {
        id: UserId,
        input: UserInput,
        result: Result<(), RemoteError>,
    },
    Deleted {
        id: UserId,
        result: Result<(), RemoteError>,
    },
    /// The worker could not start; no further events follow.
    WorkerFailed(String),
}

/// UI side of the bridge.
pub struct Bridge {
    pub commands: Sender<RemoteCommand>,
    pub events: Receiver<RemoteEvent>,
    _worker: JoinHandle<()>,
}

impl Bridge {
    pub fn launch(api: Arc<dyn UserApi>) -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        let (ev_tx, ev_rx) = unbounded();
        let worker = thread::spawn(move || run_worker(api, cmd_rx, ev_tx));
        Self {
            commands: cmd_tx,
            events: ev_rx,
            _worker: worker,
        }
    }
}

fn run_worker(api: Arc<dyn UserApi>, cmd_rx: Receiver<RemoteCommand>, ev_tx: Sender<RemoteEvent>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to build worker runtime: {err}");
            let _ = ev_tx.send(RemoteEvent::WorkerFailed(format!(
                "failed to start network worker: {err}"
            )));
            return;
        }
    };

    while let Ok(cmd) = cmd_rx.recv() {
        let event = runtime.block_on(execute(api.as_ref(), cmd));
        if ev_tx.send(event).is_err() {
            debug!("ui gone, dropping remote result");
            break;
        }
    }
    debug!("remote worker stopped");
}

async fn execute(api: &dyn UserApi, cmd: RemoteCommand) -> RemoteEvent {
    match cmd {
        RemoteCommand::FetchAll => RemoteEvent::Fetched(api.list().await),
        RemoteCommand::Create { input } => {
            let result = api.create(&mapper::to_remote(&input)).await;
            RemoteEvent::Created { input, result }
        }
        RemoteCommand::Update {
            id,
            remote_id,
            input,
        } => {
            let result = api
                .update(remote_id, &mapper::to_remote(&input))
                .await
                .map(|_| ());
            RemoteEvent::Updated { id, input, result }
        }
        RemoteCommand::Delete { id, remote_id } => {
            let result = api.delete(remote_id).await;
            RemoteEvent::Deleted { id, result }
        }
    }
}
