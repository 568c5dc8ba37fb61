//! Style model catalog: static descriptors plus local artifact resolution.
//!
//! Each entry describes one ONNX style model: where to fetch it, the fixed
//! input canvas it expects, and how pixel bytes map to tensor floats.
//! [`StyleCatalog::resolve`] returns a local artifact path, downloading on
//! first use. Artifacts are cached on disk forever; the catalog never
//! deletes them.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DOWNLOAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const MODEL_BASE_URL: &str = "https://github.com/Raahim2/Sharpify/raw/main/models/";

/// How color channels are arranged in the model tensor: interleaved per
/// pixel (`ChannelsLast`, shape `[1, H, W, 3]`) or as three full-size
/// planes (`ChannelsFirst`, shape `[1, 3, H, W]`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TensorLayout {
    ChannelsFirst,
    ChannelsLast,
}

impl std::fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChannelsFirst => write!(f, "channels-first"),
            Self::ChannelsLast => write!(f, "channels-last"),
        }
    }
}

/// Linear mapping between 8-bit pixel bytes and the float range the model
/// works in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Normalization {
    /// Raw byte values passed through as floats in `[0, 255]`.
    ZeroTo255,
    /// Bytes mapped onto `[-1, 1]` via `b / 127.5 - 1`.
    SignedUnit,
}

impl Normalization {
    pub fn to_float(self, byte: u8) -> f32 {
        match self {
            Self::ZeroTo255 => byte as f32,
            Self::SignedUnit => byte as f32 / 127.5 - 1.0,
        }
    }

    /// Reverse mapping. Model outputs are not guaranteed in range, so the
    /// result is always clamped into `[0, 255]` before the cast.
    pub fn to_byte(self, value: f32) -> u8 {
        let scaled = match self {
            Self::ZeroTo255 => value,
            Self::SignedUnit => (value + 1.0) * 127.5,
        };
        scaled.clamp(0.0, 255.0) as u8
    }
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroTo255 => write!(f, "0..255"),
            Self::SignedUnit => write!(f, "-1..1"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleModel {
    /// Display name shown to users.
    pub name: String,
    /// Artifact filename; doubles as the unique catalog id.
    pub filename: String,
    pub url: Option<String>,
    pub sha256: Option<String>,
    pub layout: TensorLayout,
    pub input_width: u32,
    pub input_height: u32,
    pub normalization: Normalization,
    pub description: String,
}

fn fast_style_entry(name: &str, filename: &str, description: &str) -> StyleModel {
    StyleModel {
        name: name.into(),
        filename: filename.into(),
        url: Some(format!("{MODEL_BASE_URL}{filename}")),
        sha256: None,
        layout: TensorLayout::ChannelsFirst,
        input_width: 224,
        input_height: 224,
        normalization: Normalization::ZeroTo255,
        description: description.into(),
    }
}

fn anime_entry(name: &str, filename: &str, description: &str) -> StyleModel {
    StyleModel {
        name: name.into(),
        filename: filename.into(),
        url: Some(format!("{MODEL_BASE_URL}{filename}")),
        sha256: None,
        layout: TensorLayout::ChannelsLast,
        input_width: 512,
        input_height: 512,
        normalization: Normalization::SignedUnit,
        description: description.into(),
    }
}

fn builtin_catalog() -> Vec<StyleModel> {
    vec![
        fast_style_entry(
            "Candy",
            "candy-9.onnx",
            "Fast neural style — candy painting, bold swirls and warm tones",
        ),
        fast_style_entry(
            "Mosaic",
            "mosaic-9.onnx",
            "Fast neural style — stained-glass mosaic fragments",
        ),
        fast_style_entry(
            "Pointilism",
            "pointilism-9.onnx",
            "Fast neural style — pointillist dot strokes",
        ),
        fast_style_entry(
            "Rain Princess",
            "rain-princess-9.onnx",
            "Fast neural style — Leonid Afremov oil-palette look",
        ),
        fast_style_entry(
            "Udnie",
            "udnie-9.onnx",
            "Fast neural style — Picabia's Udnie abstract",
        ),
        anime_entry(
            "Anime",
            "AnimieGan.onnx",
            "AnimeGAN photo-to-anime generator",
        ),
        anime_entry(
            "Shinkai",
            "Shinkai.onnx",
            "AnimeGAN trained on Makoto Shinkai film frames",
        ),
    ]
}

pub struct StyleCatalog {
    models_dir: PathBuf,
    entries: Vec<StyleModel>,
}

impl StyleCatalog {
    pub fn new(models_dir: PathBuf) -> Self {
        Self {
            models_dir,
            entries: Vec::new(),
        }
    }

    pub fn with_builtin_models(models_dir: PathBuf) -> Self {
        Self {
            models_dir,
            entries: builtin_catalog(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Register `.onnx` files already present in the models directory but
    /// missing from the catalog, so side-loaded models are usable. Tensor
    /// metadata is guessed from the filename; AnimeGAN-family names get the
    /// 512px channels-last profile, everything else the 224px
    /// channels-first one.
    pub fn discover(&mut self) -> Result<()> {
        if !self.models_dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&self.models_dir)? {
            let path = entry?.path();

            let is_onnx = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("onnx"))
                .unwrap_or(false);
            if !is_onnx {
                continue;
            }

            let filename = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if self.entries.iter().any(|e| e.filename == filename) {
                continue;
            }

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&filename)
                .to_string();

            info!(filename = %filename, "Discovered unknown ONNX style model");

            let lower = filename.to_lowercase();
            let anime_like =
                lower.contains("anime") || lower.contains("gan") || lower.contains("shinkai");
            let (layout, size, normalization) = if anime_like {
                (TensorLayout::ChannelsLast, 512, Normalization::SignedUnit)
            } else {
                (TensorLayout::ChannelsFirst, 224, Normalization::ZeroTo255)
            };

            self.entries.push(StyleModel {
                name,
                filename,
                url: None,
                sha256: None,
                layout,
                input_width: size,
                input_height: size,
                normalization,
                description: "Discovered model (metadata guessed from filename)".into(),
            });
        }

        Ok(())
    }

    /// Exact lookup by catalog id (the artifact filename).
    pub fn get(&self, id: &str) -> Option<&StyleModel> {
        self.entries.iter().find(|e| e.filename == id)
    }

    /// Lookup by id, falling back to a case-insensitive display-name match.
    /// Convenience for CLI input; the engine itself always keys by id.
    pub fn lookup(&self, query: &str) -> Option<&StyleModel> {
        self.get(query)
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(query)))
    }

    pub fn list(&self) -> &[StyleModel] {
        &self.entries
    }

    pub fn model_path(&self, id: &str) -> Option<PathBuf> {
        self.get(id).map(|e| self.models_dir.join(&e.filename))
    }

    pub fn is_downloaded(&self, id: &str) -> bool {
        self.model_path(id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Resolve a model id to a local artifact path, downloading on first
    /// use. An existing file wins immediately — no network access and no
    /// re-verification against remote content; staleness is accepted.
    pub fn resolve(&self, id: &str) -> Result<PathBuf> {
        let entry = self.get(id).ok_or_else(|| Error::UnknownModel {
            id: id.to_string(),
        })?;

        let final_path = self.models_dir.join(&entry.filename);
        if final_path.is_file() {
            debug!(model = %id, path = %final_path.display(), "Model artifact already cached");
            return Ok(final_path);
        }

        self.download(entry, &final_path)?;
        Ok(final_path)
    }

    fn download(&self, entry: &StyleModel, final_path: &Path) -> Result<()> {
        let id = &entry.filename;
        let url = entry.url.as_deref().ok_or_else(|| Error::ModelDownload {
            id: id.clone(),
            reason: "no download URL configured".into(),
        })?;

        fs::create_dir_all(&self.models_dir)?;
        let tmp_path = self.models_dir.join(format!("{}.part", entry.filename));

        info!(model = %id, url = %url, "Downloading model");

        let result = self.download_to_temp(entry, url, &tmp_path);
        if result.is_err() {
            // Failed downloads must never leave a loadable partial file.
            let _ = fs::remove_file(&tmp_path);
            return result;
        }

        fs::rename(&tmp_path, final_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            Error::ModelDownload {
                id: id.clone(),
                reason: format!("failed to move artifact into place: {e}"),
            }
        })?;

        info!(model = %id, path = %final_path.display(), "Download complete");
        Ok(())
    }

    fn download_to_temp(&self, entry: &StyleModel, url: &str, tmp_path: &Path) -> Result<()> {
        let id = &entry.filename;
        let download_err = |reason: String| Error::ModelDownload {
            id: id.clone(),
            reason,
        };

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| download_err(format!("failed to build HTTP client: {e}")))?;

        let mut response = client
            .get(url)
            .send()
            .map_err(|e| download_err(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(download_err(format!(
                "server returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let mut tmp_file = fs::File::create(tmp_path)
            .map_err(|e| download_err(format!("failed to create temp file: {e}")))?;

        response
            .copy_to(&mut tmp_file)
            .map_err(|e| download_err(format!("failed while reading body: {e}")))?;

        tmp_file
            .sync_all()
            .map_err(|e| download_err(format!("failed to flush temp file: {e}")))?;
        drop(tmp_file);

        if let Some(expected) = &entry.sha256 {
            let actual = sha256_file(tmp_path)?;
            if actual != *expected {
                return Err(download_err(format!(
                    "sha256 mismatch: expected {expected}, got {actual}"
                )));
            }
            info!(model = %id, "Hash verified OK");
        } else {
            warn!(model = %id, "No sha256 configured — skipping verification");
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Merge entries from a JSON catalog, skipping ids already present.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let loaded: Vec<StyleModel> = serde_json::from_str(json)?;
        for entry in loaded {
            if !self.entries.iter().any(|e| e.filename == entry.filename) {
                self.entries.push(entry);
            }
        }
        Ok(())
    }
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use tempfile::tempdir;

    #[test]
    fn builtin_catalog_count() {
        assert_eq!(builtin_catalog().len(), 7);
    }

    #[test]
    fn builtin_catalog_profiles() {
        let catalog = builtin_catalog();
        let fast = catalog
            .iter()
            .filter(|e| e.layout == TensorLayout::ChannelsFirst)
            .count();
        let anime = catalog
            .iter()
            .filter(|e| e.layout == TensorLayout::ChannelsLast)
            .count();
        assert_eq!(fast, 5);
        assert_eq!(anime, 2);

        for entry in &catalog {
            match entry.layout {
                TensorLayout::ChannelsFirst => {
                    assert_eq!(entry.input_width, 224);
                    assert_eq!(entry.normalization, Normalization::ZeroTo255);
                }
                TensorLayout::ChannelsLast => {
                    assert_eq!(entry.input_width, 512);
                    assert_eq!(entry.normalization, Normalization::SignedUnit);
                }
            }
            assert_eq!(entry.input_width, entry.input_height);
            assert!(entry.url.as_deref().unwrap().ends_with(&entry.filename));
        }
    }

    #[test]
    fn get_by_filename() {
        let dir = tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());

        let candy = catalog.get("candy-9.onnx").unwrap();
        assert_eq!(candy.name, "Candy");
        assert_eq!(candy.layout, TensorLayout::ChannelsFirst);

        let shinkai = catalog.get("Shinkai.onnx").unwrap();
        assert_eq!(shinkai.normalization, Normalization::SignedUnit);
        assert_eq!(shinkai.input_height, 512);

        assert!(catalog.get("nope.onnx").is_none());
    }

    #[test]
    fn lookup_falls_back_to_display_name() {
        let dir = tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());

        assert_eq!(catalog.lookup("mosaic-9.onnx").unwrap().name, "Mosaic");
        assert_eq!(catalog.lookup("mosaic").unwrap().filename, "mosaic-9.onnx");
        assert_eq!(
            catalog.lookup("rain princess").unwrap().filename,
            "rain-princess-9.onnx"
        );
        assert!(catalog.lookup("no such style").is_none());
    }

    #[test]
    fn model_path_and_is_downloaded() {
        let dir = tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());

        let path = catalog.model_path("udnie-9.onnx").unwrap();
        assert_eq!(path, dir.path().join("udnie-9.onnx"));
        assert!(!catalog.is_downloaded("udnie-9.onnx"));

        fs::write(&path, b"fake model data").unwrap();
        assert!(catalog.is_downloaded("udnie-9.onnx"));

        assert!(catalog.model_path("missing.onnx").is_none());
        assert!(!catalog.is_downloaded("missing.onnx"));
    }

    #[test]
    fn resolve_unknown_model() {
        let dir = tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());

        let err = catalog.resolve("not-a-model.onnx").unwrap_err();
        assert!(matches!(err, Error::UnknownModel { id } if id == "not-a-model.onnx"));
    }

    #[test]
    fn resolve_prefers_existing_file_without_network() {
        let dir = tempdir().unwrap();
        let mut catalog = StyleCatalog::new(dir.path().to_path_buf());
        // Entry with no URL: resolve can only succeed via the local cache.
        catalog.entries.push(StyleModel {
            name: "Local".into(),
            filename: "local.onnx".into(),
            url: None,
            sha256: None,
            layout: TensorLayout::ChannelsFirst,
            input_width: 224,
            input_height: 224,
            normalization: Normalization::ZeroTo255,
            description: String::new(),
        });

        let path = dir.path().join("local.onnx");
        fs::write(&path, b"bytes").unwrap();

        assert_eq!(catalog.resolve("local.onnx").unwrap(), path);
    }

    #[test]
    fn resolve_without_url_fails_as_download_error() {
        let dir = tempdir().unwrap();
        let mut catalog = StyleCatalog::new(dir.path().to_path_buf());
        catalog.entries.push(StyleModel {
            name: "Local".into(),
            filename: "local.onnx".into(),
            url: None,
            sha256: None,
            layout: TensorLayout::ChannelsFirst,
            input_width: 224,
            input_height: 224,
            normalization: Normalization::ZeroTo255,
            description: String::new(),
        });

        let err = catalog.resolve("local.onnx").unwrap_err();
        assert!(matches!(err, Error::ModelDownload { .. }));
    }

    #[test]
    fn discover_registers_unknown_models() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("MyCustomModel.onnx"), b"data").unwrap();
        fs::write(dir.path().join("readme.txt"), b"hello").unwrap();

        let mut catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());
        catalog.discover().unwrap();

        assert_eq!(catalog.list().len(), 8);
        let custom = catalog.get("MyCustomModel.onnx").unwrap();
        assert_eq!(custom.name, "MyCustomModel");
        assert_eq!(custom.layout, TensorLayout::ChannelsFirst);
        assert_eq!(custom.input_width, 224);
        assert!(custom.url.is_none());
    }

    #[test]
    fn discover_guesses_anime_profile_from_filename() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("HayaoGan_v2.onnx"), b"data").unwrap();

        let mut catalog = StyleCatalog::new(dir.path().to_path_buf());
        catalog.discover().unwrap();

        let model = catalog.get("HayaoGan_v2.onnx").unwrap();
        assert_eq!(model.layout, TensorLayout::ChannelsLast);
        assert_eq!(model.input_width, 512);
        assert_eq!(model.normalization, Normalization::SignedUnit);
    }

    #[test]
    fn discover_skips_known_models_and_missing_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("candy-9.onnx"), b"data").unwrap();
        let mut catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());
        catalog.discover().unwrap();
        assert_eq!(catalog.list().len(), 7);

        let mut empty =
            StyleCatalog::with_builtin_models(dir.path().join("does-not-exist"));
        empty.discover().unwrap();
        assert_eq!(empty.list().len(), 7);
    }

    #[test]
    fn json_roundtrip() {
        let dir = tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());
        let json = catalog.to_json().unwrap();

        let mut restored = StyleCatalog::new(dir.path().to_path_buf());
        restored.load_json(&json).unwrap();
        assert_eq!(restored.list().len(), 7);

        let anime = restored.get("AnimieGan.onnx").unwrap();
        assert_eq!(anime.layout, TensorLayout::ChannelsLast);
        assert_eq!(anime.normalization, Normalization::SignedUnit);

        // Loading the same JSON twice must not duplicate entries.
        restored.load_json(&json).unwrap();
        assert_eq!(restored.list().len(), 7);
    }

    #[test]
    fn normalization_mappings() {
        assert_eq!(Normalization::ZeroTo255.to_float(0), 0.0);
        assert_eq!(Normalization::ZeroTo255.to_float(255), 255.0);
        assert_eq!(Normalization::SignedUnit.to_float(0), -1.0);
        assert_eq!(Normalization::SignedUnit.to_float(255), 1.0);

        assert_eq!(Normalization::ZeroTo255.to_byte(-50.0), 0);
        assert_eq!(Normalization::ZeroTo255.to_byte(400.0), 255);
        assert_eq!(Normalization::SignedUnit.to_byte(-1.0), 0);
        assert_eq!(Normalization::SignedUnit.to_byte(0.0), 127);
        assert_eq!(Normalization::SignedUnit.to_byte(1.0), 255);
        assert_eq!(Normalization::SignedUnit.to_byte(3.0), 255);
    }

    #[test]
    fn sha256_of_known_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("testfile.bin");
        fs::write(&path, b"hello world").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    // -- download tests against a local single-response HTTP server --

    fn spawn_single_response_server(
        status_line: &'static str,
        body: Vec<u8>,
    ) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            consume_request_headers(&mut stream);
            let headers = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(headers.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            let _ = stream.flush();
        });

        (format!("http://{addr}"), handle)
    }

    fn consume_request_headers(stream: &mut TcpStream) {
        let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
        let mut buffer = [0u8; 4096];
        let _ = stream.read(&mut buffer);
    }

    fn catalog_with_remote_entry(
        models_dir: &Path,
        url: &str,
        sha256: Option<String>,
    ) -> StyleCatalog {
        let mut catalog = StyleCatalog::new(models_dir.to_path_buf());
        catalog.entries.push(StyleModel {
            name: "Remote".into(),
            filename: "remote.onnx".into(),
            url: Some(url.to_string()),
            sha256,
            layout: TensorLayout::ChannelsFirst,
            input_width: 224,
            input_height: 224,
            normalization: Normalization::ZeroTo255,
            description: String::new(),
        });
        catalog
    }

    #[test]
    fn download_success_writes_artifact_atomically() {
        let dir = tempdir().unwrap();
        let payload = b"fake-onnx-payload".to_vec();
        let (base_url, server) = spawn_single_response_server("200 OK", payload.clone());
        let catalog =
            catalog_with_remote_entry(dir.path(), &format!("{base_url}/remote.onnx"), None);

        let path = catalog.resolve("remote.onnx").unwrap();
        server.join().unwrap();

        assert_eq!(path, dir.path().join("remote.onnx"));
        assert_eq!(fs::read(&path).unwrap(), payload);
        assert!(
            !dir.path().join("remote.onnx.part").exists(),
            ".part file should be gone after success"
        );
    }

    #[test]
    fn download_http_error_leaves_no_file() {
        let dir = tempdir().unwrap();
        let (base_url, server) =
            spawn_single_response_server("404 Not Found", b"missing".to_vec());
        let catalog =
            catalog_with_remote_entry(dir.path(), &format!("{base_url}/remote.onnx"), None);

        let err = catalog.resolve("remote.onnx").unwrap_err();
        server.join().unwrap();

        assert!(
            matches!(&err, Error::ModelDownload { reason, .. } if reason.contains("404")),
            "unexpected error: {err}"
        );
        assert!(!dir.path().join("remote.onnx").exists());
        assert!(!dir.path().join("remote.onnx.part").exists());
    }

    #[test]
    fn download_sha_mismatch_rejects_artifact() {
        let dir = tempdir().unwrap();
        let (base_url, server) =
            spawn_single_response_server("200 OK", b"tampered-bytes".to_vec());
        let catalog = catalog_with_remote_entry(
            dir.path(),
            &format!("{base_url}/remote.onnx"),
            Some("0".repeat(64)),
        );

        let err = catalog.resolve("remote.onnx").unwrap_err();
        server.join().unwrap();

        assert!(
            matches!(&err, Error::ModelDownload { reason, .. } if reason.contains("sha256 mismatch")),
            "unexpected error: {err}"
        );
        assert!(!dir.path().join("remote.onnx").exists());
        assert!(!dir.path().join("remote.onnx.part").exists());
    }

    #[test]
    fn download_sha_match_accepts_artifact() {
        let dir = tempdir().unwrap();
        let payload = b"hello world".to_vec();
        let (base_url, server) = spawn_single_response_server("200 OK", payload.clone());
        let catalog = catalog_with_remote_entry(
            dir.path(),
            &format!("{base_url}/remote.onnx"),
            Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".into()),
        );

        let path = catalog.resolve("remote.onnx").unwrap();
        server.join().unwrap();
        assert_eq!(fs::read(path).unwrap(), payload);
    }

    #[test]
    #[ignore] // hits the real model host
    fn download_real_model() {
        let dir = tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());
        let path = catalog.resolve("candy-9.onnx").unwrap();
        assert!(path.is_file());
        assert!(fs::metadata(&path).unwrap().len() > 1_000_000);
    }
}
