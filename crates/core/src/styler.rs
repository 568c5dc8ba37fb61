//! Engine façade tying catalog, session slot, and result cache together.
//!
//! [`Styler`] is an explicitly constructed service object — there is no
//! module-level state. A caller owns one instance and drives it through
//! `&mut self`, which also serializes all inference: two applications can
//! never be in flight on the same styler.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{cache_key, ResultCache, CACHE_MAX_SIZE};
use crate::catalog::{StyleCatalog, StyleModel};
use crate::codec::{self, SourceImage, StyledImage, JPEG_QUALITY};
use crate::error::{Error, Result};
use crate::session::StyleSession;

pub struct Styler {
    catalog: StyleCatalog,
    session: StyleSession,
    cache: ResultCache,
    jpeg_quality: u8,
}

impl Styler {
    pub fn new(catalog: StyleCatalog) -> Self {
        Self::with_settings(catalog, CACHE_MAX_SIZE, JPEG_QUALITY)
    }

    pub fn with_settings(catalog: StyleCatalog, cache_capacity: usize, jpeg_quality: u8) -> Self {
        Self {
            catalog,
            session: StyleSession::new(),
            cache: ResultCache::new(cache_capacity),
            jpeg_quality,
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    /// Whether `id` is the currently loaded model, i.e. the next apply for
    /// it skips the load step.
    pub fn is_ready_for(&self, id: &str) -> bool {
        self.session.loaded_model() == Some(id)
    }

    /// Apply a style model to the image at `path` and return the styled
    /// result at the source resolution. The path string doubles as the
    /// image's cache identity.
    pub fn apply(&mut self, path: &Path, id: &str) -> Result<Arc<StyledImage>> {
        let identity = path.display().to_string();
        let key = cache_key(&identity, id);
        if let Some(hit) = self.cache.get(&key) {
            debug!(model = %id, image = %identity, "Cache hit — skipping inference");
            return Ok(hit);
        }

        let model = self.lookup_model(id)?;
        let source = SourceImage::open(path)?;
        self.run_pipeline(&source, key, &model)
    }

    /// Same as [`Self::apply`] for an already-decoded image. `identity` is
    /// whatever stable string names the source (a URI, a path); it only has
    /// to be consistent across calls to get cache hits.
    pub fn apply_image(
        &mut self,
        source: &SourceImage,
        identity: &str,
        id: &str,
    ) -> Result<Arc<StyledImage>> {
        let key = cache_key(identity, id);
        if let Some(hit) = self.cache.get(&key) {
            debug!(model = %id, image = %identity, "Cache hit — skipping inference");
            return Ok(hit);
        }

        let model = self.lookup_model(id)?;
        self.run_pipeline(source, key, &model)
    }

    fn lookup_model(&self, id: &str) -> Result<StyleModel> {
        self.catalog
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownModel { id: id.to_string() })
    }

    fn run_pipeline(
        &mut self,
        source: &SourceImage,
        key: String,
        model: &StyleModel,
    ) -> Result<Arc<StyledImage>> {
        self.session.ensure_loaded(&self.catalog, &model.filename)?;

        let (tensor, geom) = codec::encode(source, model)?;
        let output = self.session.infer(tensor)?;
        let styled = codec::decode(
            &output,
            model,
            &geom,
            source.width(),
            source.height(),
            self.jpeg_quality,
        )?;

        info!(
            model = %model.filename,
            width = styled.width,
            height = styled.height,
            "Style applied"
        );

        let styled = Arc::new(styled);
        self.cache.put(key, Arc::clone(&styled));
        Ok(styled)
    }
}
