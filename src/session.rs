//! Per-provider outcome slots and the reducer that drives them.
//!
//! `SessionState::apply` is the only way a slot changes. At runtime
//! the state lives inside a watch channel and every event is applied
//! under its lock, so concurrent completions never interleave and
//! every view (snapshot or subscriber) sees an event as soon as
//! `Session::apply` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, trace};
use tokio::sync::watch;

use crate::decoder::ModelBlob;
use crate::ProviderId;

/// A decoded model owned by its provider's slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResult
{   pub provider: ProviderId
  , pub blob: ModelBlob
}

/// One provider's loading/result/error record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutcome
{   pub loading: bool
  , /// May be stale while a newer request is loading or after
    /// it failed
    pub result: Option<ProviderResult>
  , pub error: Option<crate::error::Error>
}

/// Reducer input
#[derive(Debug, Clone)]
pub enum SessionEvent
{   /// Mark providers as in flight. An empty list clears every
    /// loading flag; it is not a no-op.
    LoadingStarted(Vec<ProviderId>)
  , Succeeded(ProviderId, ModelBlob)
  , Failed(ProviderId, crate::error::Error)
  , /// Back to defaults; drops every blob
    Reset
}

/// Outcome slots for both providers, always both present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState
{   trellis: GenerationOutcome
  , hunyuan: GenerationOutcome
}

impl SessionState
{   pub fn new() -> Self
    {   SessionState::default()
    }

    pub fn outcome(&self, provider: ProviderId) -> &GenerationOutcome
    {   match provider
        {   ProviderId::Trellis => &self.trellis
          , ProviderId::Hunyuan => &self.hunyuan
        }
    }

    fn outcome_mut(&mut self, provider: ProviderId)
      -> &mut GenerationOutcome
    {   match provider
        {   ProviderId::Trellis => &mut self.trellis
          , ProviderId::Hunyuan => &mut self.hunyuan
        }
    }

    pub fn any_loading(&self) -> bool
    {   self.trellis.loading || self.hunyuan.loading
    }

    /// Pure transition. A replaced result is dropped here, which
    /// releases its blob.
    pub fn apply(mut self, event: SessionEvent) -> SessionState
    {   match event
        {   SessionEvent::LoadingStarted(providers) => {
              if providers.is_empty()
              {   for provider in ProviderId::ALL
                  {   self.outcome_mut(provider).loading = false;
                  }
              } else
              {   for provider in providers
                  {   self.outcome_mut(provider).loading = true;
                  }
              }
            }
          , SessionEvent::Succeeded(provider, blob) => {
              let slot = self.outcome_mut(provider);
              slot.loading = false;
              slot.error = None;
              slot.result = Some(ProviderResult { provider, blob });
            }
          , SessionEvent::Failed(provider, error) => {
              let slot = self.outcome_mut(provider);
              slot.loading = false;
              slot.error = Some(error);
            }
          , SessionEvent::Reset => {
              self = SessionState::default();
            }
        }
        self
    }
}

struct SessionInner
{   state_tx: watch::Sender<SessionState>
  , closed: AtomicBool
}

impl Drop for SessionInner
{   fn drop(&mut self)
    {   // Receivers share the stored value; clear it so no blob
        // outlives the session
        self.state_tx.send_replace(SessionState::default());
    }
}

/// Handle to the session state. Cheap to clone; every blob it owns
/// is released when the last handle is dropped or on `shutdown`.
#[derive(Clone)]
pub struct Session
{   inner: Arc<SessionInner>
}

impl Session
{   pub fn new() -> Self
    {   debug!("Creating Session");
        let (state_tx, _) = watch::channel(SessionState::default());
        Session
        {   inner: Arc::new(SessionInner
            {   state_tx
              , closed: AtomicBool::new(false)
            })
        }
    }

    /// Apply an event; visible to every view once this returns
    pub fn apply(&self, event: SessionEvent)
      -> Result<(), crate::error::Error>
    {   if self.inner.closed.load(Ordering::Acquire)
        {   return Err(crate::error::Error::SessionClosed);
        }
        trace!("Applying {}", event_name(&event));
        self.inner.state_tx.send_modify(|state| {
          *state = std::mem::take(state).apply(event);
        });
        Ok(())
    }

    /// Current state
    pub fn snapshot(&self)
      -> Result<SessionState, crate::error::Error>
    {   if self.inner.closed.load(Ordering::Acquire)
        {   return Err(crate::error::Error::SessionClosed);
        }
        Ok(self.inner.state_tx.borrow().clone())
    }

    /// Receiver updated by every applied event
    pub fn subscribe(&self) -> watch::Receiver<SessionState>
    {   self.inner.state_tx.subscribe()
    }

    /// Close the session, releasing all blobs
    pub fn shutdown(&self) -> Result<(), crate::error::Error>
    {   if self.inner.closed.swap(true, Ordering::AcqRel)
        {   return Err(crate::error::Error::SessionClosed);
        }
        info!("Session shutting down");
        self.inner.state_tx.send_replace(SessionState::default());
        Ok(())
    }
}

impl Default for Session
{   fn default() -> Self
    {   Session::new()
    }
}

fn event_name(event: &SessionEvent) -> &'static str
{   match event
    {   SessionEvent::LoadingStarted(_) => "LoadingStarted"
      , SessionEvent::Succeeded(..) => "Succeeded"
      , SessionEvent::Failed(..) => "Failed"
      , SessionEvent::Reset => "Reset"
    }
}
