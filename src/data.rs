use std::{fmt, ops::Deref, sync::Arc};

use crate::automod::{Automod, CacheRequest};
use crate::settings::AutomodSettings;
use poise::serenity_prelude as serenity;
use serenity::prelude::TypeMapKey;
use tokio::sync::mpsc::{Sender, error::TrySendError};
use tracing::warn;

/// Shared state handed to commands
#[derive(Clone)]
pub struct Data(pub Arc<DataInner>);

// Implement TypeMapKey for Data to allow storing it in Serenity's data map
impl TypeMapKey for Data {
    type Value = Data;
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("automod", &self.automod)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Deref for Data {
    type Target = DataInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Data {
    #[must_use]
    pub fn new(
        automod: Arc<Automod>,
        invalidations: Sender<CacheRequest>,
        settings: AutomodSettings,
    ) -> Self {
        Self(Arc::new(DataInner {
            automod,
            invalidations,
            settings,
        }))
    }

    /// Queue a cache invalidation for the maintenance task.
    ///
    /// Falls back to invalidating in place when the queue is full, so a
    /// reload request is never lost. Returns `false` if the maintenance task
    /// is gone.
    pub fn request_invalidation(&self, guild_id: u64) -> bool {
        match self
            .invalidations
            .try_send(CacheRequest::Invalidate { guild_id })
        {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Invalidation queue full, invalidating guild {guild_id} directly");
                self.automod.cache().invalidate(guild_id);
                true
            }
            Err(TrySendError::Closed(_)) => {
                self.automod.cache().invalidate(guild_id);
                false
            }
        }
    }
}

pub struct DataInner {
    pub automod: Arc<Automod>,
    // Requests for the cache maintenance task
    pub invalidations: Sender<CacheRequest>,
    pub settings: AutomodSettings,
}
