//! Dataset owner and mutation coordinator.
//!
//! Every operation has a synchronous `begin_*`/`begin` step, the remote
//! call, and a synchronous `finish_*` step. The TUI runs the remote call on
//! the worker bridge and feeds the outcome back through `finish_*`; the async
//! methods at the bottom compose all three against any [`UserApi`].
//!
//! A finish step always returns the action tag to [`ActionTag::Idle`] before
//! looking at the outcome, and a failed outcome never touches the dataset.
use tracing::{debug, info, warn};

use crate::error::{Error, RemoteError, Result};
use crate::mapper;
use crate::model::{LocalUser, RemoteUser, UserId, UserInput};
use crate::remote::UserApi;

/// Mutation currently in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActionTag {
    #[default]
    Idle,
    Adding,
    Editing,
    Deleting,
}

impl ActionTag {
    pub fn is_idle(self) -> bool {
        self == ActionTag::Idle
    }

    /// Status line text; empty when idle.
    pub fn label(self) -> &'static str {
        match self {
            ActionTag::Idle => "",
            ActionTag::Adding => "adding user...",
            ActionTag::Editing => "updating user...",
            ActionTag::Deleting => "removing user...",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            ActionTag::Idle => "idle",
            ActionTag::Adding => "create",
            ActionTag::Editing => "update",
            ActionTag::Deleting => "delete",
        }
    }
}

#[derive(Debug, Default)]
pub struct UserStore {
    users: Vec<LocalUser>,
    loading: bool,
    error: Option<String>,
    action: ActionTag,
    last_pending: u64,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing dataset.
    pub fn with_users(users: Vec<LocalUser>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub fn users(&self) -> &[LocalUser] {
        &self.users
    }

    pub fn get(&self, id: UserId) -> Option<&LocalUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed fetch, cleared when the next one starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn action(&self) -> ActionTag {
        self.action
    }

    fn next_pending_id(&mut self) -> UserId {
        self.last_pending += 1;
        UserId::Pending(self.last_pending)
    }

    pub fn begin_fetch(&mut self) -> Result<()> {
        if self.loading {
            return Err(Error::Busy("fetch"));
        }
        self.loading = true;
        self.error = None;
        Ok(())
    }

    /// Replace the dataset with the fetched records; returns how many were loaded.
    pub fn finish_fetch(
        &mut self,
        outcome: std::result::Result<Vec<RemoteUser>, RemoteError>,
    ) -> Result<usize> {
        self.loading = false;
        match outcome {
            Ok(remote) => {
                let mut users = Vec::with_capacity(remote.len());
                for r in remote {
                    let user = mapper::to_local(r, || self.next_pending_id());
                    users.push(user);
                }
                info!(count = users.len(), "users loaded");
                self.users = users;
                Ok(self.users.len())
            }
            Err(err) => {
                warn!(error = %err, "fetching users failed");
                let message = err.to_string();
                self.error = Some(message.clone());
                Err(Error::FetchFailed(message))
            }
        }
    }

    /// Enter `tag`, refusing while another mutation is in flight.
    pub fn begin(&mut self, tag: ActionTag) -> Result<()> {
        if !self.action.is_idle() {
            return Err(Error::Busy(self.action.label()));
        }
        debug!(action = ?tag, "mutation started");
        self.action = tag;
        Ok(())
    }

    fn settle(&mut self) {
        self.action = ActionTag::Idle;
    }

    pub fn finish_create(
        &mut self,
        input: UserInput,
        outcome: std::result::Result<RemoteUser, RemoteError>,
    ) -> Result<LocalUser> {
        self.settle();
        let created = outcome.map_err(|e| {
            warn!(error = %e, "create failed");
            Error::mutation(ActionTag::Adding.verb(), e)
        })?;
        // A missing or already-taken id means the API did not really confirm the record.
        let id = match created.id.map(UserId::Remote) {
            Some(id) if self.get(id).is_none() => id,
            other => {
                let pending = self.next_pending_id();
                debug!(remote = ?other, %pending, "create without a usable remote id");
                pending
            }
        };
        let user = LocalUser::from_input(id, input);
        self.users.insert(0, user.clone());
        info!(%id, "user created");
        Ok(user)
    }

    pub fn finish_update(
        &mut self,
        id: UserId,
        input: UserInput,
        outcome: std::result::Result<(), RemoteError>,
    ) -> Result<()> {
        self.settle();
        outcome.map_err(|e| {
            warn!(%id, error = %e, "update failed");
            Error::mutation(ActionTag::Editing.verb(), e)
        })?;
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(Error::NotFound(id))?;
        user.merge(input);
        info!(%id, "user updated");
        Ok(())
    }

    pub fn finish_remove(
        &mut self,
        id: UserId,
        outcome: std::result::Result<(), RemoteError>,
    ) -> Result<()> {
        self.settle();
        outcome.map_err(|e| {
            warn!(%id, error = %e, "delete failed");
            Error::mutation(ActionTag::Deleting.verb(), e)
        })?;
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        if self.users.len() == before {
            return Err(Error::NotFound(id));
        }
        info!(%id, "user removed");
        Ok(())
    }

    pub async fn fetch_all<A: UserApi + ?Sized>(&mut self, api: &A) -> Result<usize> {
        self.begin_fetch()?;
        let outcome = api.list().await;
        self.finish_fetch(outcome)
    }

    pub async fn create<A: UserApi + ?Sized>(
        &mut self,
        api: &A,
        input: UserInput,
    ) -> Result<LocalUser> {
        self.begin(ActionTag::Adding)?;
        let outcome = api.create(&mapper::to_remote(&input)).await;
        self.finish_create(input, outcome)
    }

    /// Pending records were never confirmed remotely, so they are edited locally only.
    pub async fn update<A: UserApi + ?Sized>(
        &mut self,
        api: &A,
        id: UserId,
        input: UserInput,
    ) -> Result<()> {
        self.begin(ActionTag::Editing)?;
        let outcome = match id.remote() {
            Some(remote_id) => api
                .update(remote_id, &mapper::to_remote(&input))
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        self.finish_update(id, input, outcome)
    }

    pub async fn remove<A: UserApi + ?Sized>(&mut self, api: &A, id: UserId) -> Result<()> {
        self.begin(ActionTag::Deleting)?;
        let outcome = match id.remote() {
            Some(remote_id) => api.delete(remote_id).await,
            None => Ok(()),
        };
        self.finish_remove(id, outcome)
    }
}
