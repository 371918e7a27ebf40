//! Phase capability registry
//!
//! Binds every [`Phase`] to exactly one [`PhaseHandler`]. A registry can only be
//! built once every phase has a handler, so lookups never fail at runtime.

use std::sync::Arc;

use sdlcflow_config::Config;
use sdlcflow_llm::LlmBackend;
use sdlcflow_phase_api::{Phase, PhaseHandler};
use sdlcflow_utils::error::RegistryError;

/// Total mapping from phase to handler.
#[derive(Clone)]
pub struct PhaseRegistry {
    handlers: [Arc<dyn PhaseHandler>; Phase::COUNT],
}

impl std::fmt::Debug for PhaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(Phase::ALL.iter().map(|p| (p.as_str(), self.get(*p).id())))
            .finish()
    }
}

impl PhaseRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry of the default handlers, configured per phase from `config`.
    pub fn from_config(
        backend: Arc<dyn LlmBackend>,
        config: &Config,
    ) -> Result<Self, RegistryError> {
        sdlcflow_phases::default_handlers(backend, config)
            .into_iter()
            .fold(Self::builder(), RegistryBuilder::register)
            .build()
    }

    /// Handler bound to `phase`.
    #[must_use]
    pub fn get(&self, phase: Phase) -> &Arc<dyn PhaseHandler> {
        &self.handlers[phase.index()]
    }

    /// Replace the handler bound to `phase`.
    ///
    /// The handler must serve the phase it is bound to. Clones of the registry taken
    /// before the call keep the previous handler.
    pub fn override_handler(
        &mut self,
        phase: Phase,
        handler: Arc<dyn PhaseHandler>,
    ) -> Result<(), RegistryError> {
        check_binding(phase, handler.as_ref())?;
        self.handlers[phase.index()] = handler;
        Ok(())
    }

    /// Every phase the registry serves, in pipeline order.
    #[must_use]
    pub fn available_phases(&self) -> Vec<Phase> {
        Phase::ALL.to_vec()
    }
}

fn check_binding(phase: Phase, handler: &dyn PhaseHandler) -> Result<(), RegistryError> {
    if handler.phase() == phase {
        Ok(())
    } else {
        Err(RegistryError::PhaseMismatch {
            handler: handler.id().to_string(),
            bound: phase,
            actual: handler.phase(),
        })
    }
}

/// Collects handlers until every phase is bound.
#[derive(Default)]
pub struct RegistryBuilder {
    slots: [Option<Arc<dyn PhaseHandler>>; Phase::COUNT],
    error: Option<RegistryError>,
}

impl RegistryBuilder {
    /// Bind a handler to the phase it reports.
    ///
    /// A second handler for an already bound phase is recorded as
    /// [`RegistryError::DuplicateHandler`] and reported by [`build`](Self::build).
    #[must_use]
    pub fn register(self, handler: Arc<dyn PhaseHandler>) -> Self {
        let phase = handler.phase();
        self.bind(phase, handler)
    }

    /// Bind a handler to an explicit phase.
    #[must_use]
    pub fn bind(mut self, phase: Phase, handler: Arc<dyn PhaseHandler>) -> Self {
        if let Err(err) = check_binding(phase, handler.as_ref()) {
            self.error.get_or_insert(err);
            return self;
        }

        let slot = &mut self.slots[phase.index()];
        if let Some(existing) = slot.as_ref() {
            self.error.get_or_insert(RegistryError::DuplicateHandler {
                phase,
                existing: existing.id().to_string(),
                rejected: handler.id().to_string(),
            });
        } else {
            *slot = Some(handler);
        }
        self
    }

    /// Finish the registry.
    ///
    /// # Errors
    ///
    /// Returns the first binding error, or [`RegistryError::MissingHandler`] for the
    /// first phase without a handler.
    pub fn build(self) -> Result<PhaseRegistry, RegistryError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut handlers = Vec::with_capacity(Phase::ALL.len());
        for (phase, slot) in Phase::ALL.into_iter().zip(self.slots) {
            handlers.push(slot.ok_or(RegistryError::MissingHandler(phase))?);
        }

        let handlers = handlers
            .try_into()
            .map_err(|_| RegistryError::MissingHandler(Phase::first()))?;
        Ok(PhaseRegistry { handlers })
    }
}
