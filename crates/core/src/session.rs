//! Single-slot ONNX inference session.
//!
//! At most one model is loaded at a time. Selecting a different model drops
//! the current session entirely before the replacement is constructed; no
//! state is reused across a switch. Any failure while loading reverts the
//! slot to unloaded.
//!
//! Callers serialize access through `&mut self` — there is no internal
//! locking, and none is needed: the exclusive borrow is the busy gate.

use ndarray::ArrayD;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::catalog::StyleCatalog;
use crate::error::{Error, Result};

/// Observable state of the session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Ready,
}

struct LoadedSession {
    model_id: String,
    /// First declared input/output of the model. Multi-input and
    /// multi-output models are not supported.
    input_name: String,
    output_name: String,
    session: Session,
}

#[derive(Default)]
pub struct StyleSession {
    slot: Option<LoadedSession>,
}

impl StyleSession {
    pub fn new() -> Self {
        Self { slot: None }
    }

    pub fn state(&self) -> SessionState {
        if self.slot.is_some() {
            SessionState::Ready
        } else {
            SessionState::Unloaded
        }
    }

    /// Id of the currently loaded model, if any.
    pub fn loaded_model(&self) -> Option<&str> {
        self.slot.as_ref().map(|s| s.model_id.as_str())
    }

    /// A ready session for the same id is reused as-is; anything else
    /// requires a full reload.
    pub fn needs_reload(current: Option<&str>, requested: &str) -> bool {
        current != Some(requested)
    }

    /// Make `id` the loaded model, resolving (and downloading if necessary)
    /// its artifact through the catalog. No-op when `id` is already loaded.
    ///
    /// On any failure the previous session is already gone and the slot is
    /// left unloaded; the next call starts from scratch.
    pub fn ensure_loaded(&mut self, catalog: &StyleCatalog, id: &str) -> Result<()> {
        if !Self::needs_reload(self.loaded_model(), id) {
            debug!(model = %id, "Session already loaded");
            return Ok(());
        }

        // Evict the old session before constructing the new one; a failed
        // load must not leave stale state behind.
        self.slot = None;

        let artifact = catalog.resolve(id)?;
        debug!(model = %id, path = %artifact.display(), "Loading ONNX style model");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(&artifact))
            .map_err(|e| Error::ModelLoad {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| Error::ModelLoad {
                id: id.to_string(),
                reason: "model declares no inputs".into(),
            })?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| Error::ModelLoad {
                id: id.to_string(),
                reason: "model declares no outputs".into(),
            })?;

        info!(model = %id, %input_name, %output_name, "Style model ready");

        self.slot = Some(LoadedSession {
            model_id: id.to_string(),
            input_name,
            output_name,
            session,
        });
        Ok(())
    }

    /// Run a forward pass. Valid only when a model is loaded.
    pub fn infer(&mut self, tensor: ArrayD<f32>) -> Result<ArrayD<f32>> {
        let loaded = self.slot.as_mut().ok_or(Error::NotReady)?;

        let input =
            Tensor::from_array(tensor).map_err(|source| Error::Inference { source })?;
        let outputs = loaded
            .session
            .run(ort::inputs![loaded.input_name.as_str() => &input])
            .map_err(|source| Error::Inference { source })?;

        let value = outputs
            .get(loaded.output_name.as_str())
            .ok_or_else(|| Error::MissingOutput {
                name: loaded.output_name.clone(),
            })?;
        let view = value
            .try_extract_array::<f32>()
            .map_err(|source| Error::Inference { source })?;

        Ok(view.to_owned())
    }
}
