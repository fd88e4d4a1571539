//! Lazy-load gate and the per-item load lifecycle.
//!
//! ```text
//! Unloaded --begin(defer)--> Placeholder --trigger--> Loading
//! Unloaded --begin(now)----------------------------> Loading
//! Loading --complete(Some)--> Loaded(metadata)
//! Loading --complete(None) / fail--> Loaded(no metadata)
//! ```
//!
//! Both `Loaded` variants are terminal. There are no automatic retries.

use std::fmt;

use imagedrawer_metadata::MetadataMap;

use crate::descriptor::{Dimensions, MediaDescriptor};
use crate::error::{DrawerError, Result};

/// Decide whether fetching the full media can wait.
///
/// Deferring only helps when a correctly sized placeholder can be shown, so
/// items without known dimensions load immediately, as does anything forced.
pub fn should_defer_load(descriptor: &MediaDescriptor, force_load: bool) -> bool {
    !force_load && descriptor.dimensions.is_some()
}

/// Coarse lifecycle phase, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Unloaded,
    Placeholder,
    Loading,
    Loaded,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadPhase::Unloaded => "unloaded",
            LoadPhase::Placeholder => "showing a placeholder",
            LoadPhase::Loading => "loading",
            LoadPhase::Loaded => "loaded",
        };
        f.write_str(name)
    }
}

/// What the caller has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    /// Issue the media fetch now.
    Fetch,
    /// Show a placeholder of this size and wait for a trigger.
    ShowPlaceholder(Dimensions),
    /// Nothing to do.
    Nothing,
}

/// Load state of a single drawer item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Unloaded,
    Placeholder(Dimensions),
    Loading,
    Loaded {
        metadata: Option<MetadataMap>,
    },
}

impl LoadState {
    pub fn phase(&self) -> LoadPhase {
        match self {
            LoadState::Unloaded => LoadPhase::Unloaded,
            LoadState::Placeholder(_) => LoadPhase::Placeholder,
            LoadState::Loading => LoadPhase::Loading,
            LoadState::Loaded { .. } => LoadPhase::Loaded,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Loaded { .. })
    }

    /// Metadata attached on load, if any.
    pub fn metadata(&self) -> Option<&MetadataMap> {
        match self {
            LoadState::Loaded { metadata } => metadata.as_ref(),
            _ => None,
        }
    }

    /// Run the gate for a freshly created item.
    pub fn begin(&mut self, descriptor: &MediaDescriptor, force_load: bool) -> Result<LoadAction> {
        self.expect(LoadPhase::Unloaded, "begin loading")?;

        match descriptor.dimensions {
            Some(dims) if should_defer_load(descriptor, force_load) => {
                *self = LoadState::Placeholder(dims);
                Ok(LoadAction::ShowPlaceholder(dims))
            }
            _ => {
                *self = LoadState::Loading;
                Ok(LoadAction::Fetch)
            }
        }
    }

    /// The item became visible or a load was forced.
    ///
    /// Repeated triggers on an item that is already loading or loaded are
    /// ignored.
    pub fn trigger(&mut self) -> Result<LoadAction> {
        match self {
            LoadState::Placeholder(_) => {
                *self = LoadState::Loading;
                Ok(LoadAction::Fetch)
            }
            LoadState::Loading | LoadState::Loaded { .. } => Ok(LoadAction::Nothing),
            LoadState::Unloaded => Err(self.reject("trigger a load")),
        }
    }

    /// The fetch finished; `metadata` is whatever extraction produced.
    pub fn complete(&mut self, metadata: Option<MetadataMap>) -> Result<()> {
        self.expect(LoadPhase::Loading, "complete a load")?;
        *self = LoadState::Loaded { metadata };
        Ok(())
    }

    /// The fetch failed. The item still reaches its terminal state.
    pub fn fail(&mut self) -> Result<()> {
        self.expect(LoadPhase::Loading, "fail a load")?;
        *self = LoadState::Loaded { metadata: None };
        Ok(())
    }

    fn expect(&self, phase: LoadPhase, event: &'static str) -> Result<()> {
        if self.phase() == phase {
            Ok(())
        } else {
            Err(self.reject(event))
        }
    }

    fn reject(&self, event: &'static str) -> DrawerError {
        DrawerError::InvalidTransition {
            from: self.phase(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AssetType;
    use assert_matches::assert_matches;

    fn with_dims() -> MediaDescriptor {
        MediaDescriptor::new("a.png", AssetType::Output).with_dimensions(512, 768)
    }

    fn without_dims() -> MediaDescriptor {
        MediaDescriptor::new("a.png", AssetType::Output)
    }

    #[test]
    fn gate_truth_table() {
        assert!(should_defer_load(&with_dims(), false));
        assert!(!should_defer_load(&without_dims(), false));
        assert!(!should_defer_load(&with_dims(), true));
        assert!(!should_defer_load(&without_dims(), true));
    }

    #[test]
    fn deferred_item_lifecycle() {
        let mut state = LoadState::default();

        let action = state.begin(&with_dims(), false).unwrap();
        assert_eq!(
            action,
            LoadAction::ShowPlaceholder(Dimensions {
                width: 512,
                height: 768
            })
        );
        assert_eq!(state.phase(), LoadPhase::Placeholder);

        assert_eq!(state.trigger().unwrap(), LoadAction::Fetch);
        assert_eq!(state.trigger().unwrap(), LoadAction::Nothing);

        let metadata: MetadataMap = [("seed", "1")].into_iter().collect();
        state.complete(Some(metadata.clone())).unwrap();
        assert!(state.is_terminal());
        assert_eq!(state.metadata(), Some(&metadata));
    }

    #[test]
    fn immediate_item_lifecycle() {
        let mut state = LoadState::default();
        assert_eq!(state.begin(&without_dims(), false).unwrap(), LoadAction::Fetch);
        assert_eq!(state.phase(), LoadPhase::Loading);

        state.fail().unwrap();
        assert_matches!(state, LoadState::Loaded { metadata: None });
    }

    #[test]
    fn forced_item_skips_placeholder() {
        let mut state = LoadState::default();
        assert_eq!(state.begin(&with_dims(), true).unwrap(), LoadAction::Fetch);
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let mut state = LoadState::default();
        assert_matches!(
            state.trigger(),
            Err(DrawerError::InvalidTransition {
                from: LoadPhase::Unloaded,
                ..
            })
        );
        assert!(state.complete(None).is_err());

        state.begin(&with_dims(), false).unwrap();
        assert!(state.begin(&with_dims(), false).is_err());
        assert!(state.fail().is_err());
        assert_eq!(state.phase(), LoadPhase::Placeholder);

        state.trigger().unwrap();
        state.complete(None).unwrap();
        assert_matches!(
            state.complete(None),
            Err(DrawerError::InvalidTransition {
                from: LoadPhase::Loaded,
                ..
            })
        );
    }
}
