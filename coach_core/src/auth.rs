//! Authorization for session creation and access.
//!
//! Acting for yourself is always allowed. Acting for someone else requires an
//! active trainer-client link. Once a session exists, its performing user and
//! its creator keep access to it regardless of later link changes.

use crate::file_store::{open_lock_file, write_json_atomic};
use crate::types::{UserId, WorkoutSession};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ROSTER_FILE_NAME: &str = "clients.json";

/// Read-only view of the trainer-client relationship store
pub trait TrainerClientDirectory {
    fn is_active_client(&self, trainer: &UserId, client: &UserId) -> Result<bool>;
}

/// Lifecycle of a trainer-client link
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Pending,
    Active,
    Rejected,
}

/// A relationship between a trainer and a client
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClientLink {
    pub trainer_id: UserId,
    pub client_id: UserId,
    pub status: LinkStatus,
    pub updated_at: DateTime<Utc>,
}

/// File-backed list of trainer-client links
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientRoster {
    #[serde(default)]
    links: Vec<ClientLink>,
}

impl TrainerClientDirectory for ClientRoster {
    fn is_active_client(&self, trainer: &UserId, client: &UserId) -> Result<bool> {
        Ok(self
            .link(trainer, client)
            .is_some_and(|l| l.status == LinkStatus::Active))
    }
}

impl ClientRoster {
    /// Load the roster; a missing file is an empty roster
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No roster file at {:?}, using empty roster", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Storage(format!("roster file {:?} is corrupt: {}", path, e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        tracing::debug!("Saved roster to {:?}", path);
        Ok(())
    }

    /// Load the roster, modify it, and save it back
    ///
    /// An exclusive lock on the sidecar `.lock` file is held for the whole
    /// read-modify-write, so concurrent updates are serialized. Readers need
    /// no lock since saves replace the file atomically.
    pub fn update<T, F>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut ClientRoster) -> Result<T>,
    {
        let lock = open_lock_file(&path.with_extension("lock"))?;
        lock.lock_exclusive()?;

        let mut roster = Self::load(path)?;
        let value = f(&mut roster)?;
        roster.save(path)?;

        lock.unlock()?;
        Ok(value)
    }

    pub fn link(&self, trainer: &UserId, client: &UserId) -> Option<&ClientLink> {
        self.links
            .iter()
            .find(|l| &l.trainer_id == trainer && &l.client_id == client)
    }

    pub fn links(&self) -> &[ClientLink] {
        &self.links
    }

    /// Request a link; a rejected link can be re-requested, an active one is kept
    pub fn invite(&mut self, trainer: &UserId, client: &UserId) -> Result<LinkStatus> {
        if trainer == client {
            return Err(Error::Validation(
                "a trainer cannot be their own client".into(),
            ));
        }

        let now = Utc::now();
        match self
            .links
            .iter_mut()
            .find(|l| &l.trainer_id == trainer && &l.client_id == client)
        {
            Some(link) if link.status == LinkStatus::Active => Ok(LinkStatus::Active),
            Some(link) => {
                link.status = LinkStatus::Pending;
                link.updated_at = now;
                Ok(LinkStatus::Pending)
            }
            None => {
                self.links.push(ClientLink {
                    trainer_id: trainer.clone(),
                    client_id: client.clone(),
                    status: LinkStatus::Pending,
                    updated_at: now,
                });
                Ok(LinkStatus::Pending)
            }
        }
    }

    /// Client accepts a pending request
    pub fn accept(&mut self, trainer: &UserId, client: &UserId) -> Result<()> {
        self.transition(trainer, client, LinkStatus::Active)
    }

    /// Client rejects a request or ends an active link
    pub fn reject(&mut self, trainer: &UserId, client: &UserId) -> Result<()> {
        self.transition(trainer, client, LinkStatus::Rejected)
    }

    fn transition(&mut self, trainer: &UserId, client: &UserId, status: LinkStatus) -> Result<()> {
        let link = self
            .links
            .iter_mut()
            .find(|l| &l.trainer_id == trainer && &l.client_id == client)
            .ok_or_else(|| Error::not_found("client link", format!("{} -> {}", trainer, client)))?;

        if status == LinkStatus::Active && link.status == LinkStatus::Rejected {
            return Err(Error::Validation(format!(
                "link {} -> {} was rejected; the trainer must invite again",
                trainer, client
            )));
        }

        link.status = status;
        link.updated_at = Utc::now();
        tracing::info!("Client link {} -> {} is now {:?}", trainer, client, status);
        Ok(())
    }
}

/// Decides whether an acting identity may touch a user's sessions
pub struct AccessResolver<'a> {
    directory: &'a dyn TrainerClientDirectory,
}

impl<'a> AccessResolver<'a> {
    pub fn new(directory: &'a dyn TrainerClientDirectory) -> Self {
        Self { directory }
    }

    /// Self, or a trainer with an active link to `target`
    pub fn can_act_for(&self, actor: &UserId, target: &UserId) -> Result<bool> {
        if actor == target {
            return Ok(true);
        }
        self.directory.is_active_client(actor, target)
    }

    /// Gate for creating a session on behalf of `target`
    pub fn authorize_create(&self, actor: &UserId, target: &UserId) -> Result<()> {
        if self.can_act_for(actor, target)? {
            return Ok(());
        }
        tracing::warn!("{} has no active client link to {}", actor, target);
        Err(Error::Forbidden(format!(
            "{} is not an active trainer of {}",
            actor, target
        )))
    }

    /// The performing user and the original creator keep access
    pub fn can_access(&self, actor: &UserId, session: &WorkoutSession) -> bool {
        &session.user_id == actor || &session.created_by_id == actor
    }

    /// Resolve a looked-up session, concealing ones the actor may not see
    pub fn visible(
        &self,
        actor: &UserId,
        session: Option<WorkoutSession>,
        id: impl ToString,
    ) -> Result<WorkoutSession> {
        match session {
            Some(session) if self.can_access(actor, &session) => Ok(session),
            _ => Err(Error::not_found("session", id)),
        }
    }
}
