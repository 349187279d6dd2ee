//! Converter lookup by format pair.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use geoconv_core::{report, ConvertError, Converted, ProgressSink, Result};
use geoconv_raster::Rasterizer;
use tracing::{debug, info, warn};

use crate::pipelines;
use crate::render::ResvgRasterizer;
use crate::{ConvertOptions, Format};

/// A conversion request.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    /// Input bytes.
    pub input: &'a [u8],
    /// Input format.
    pub from: Format,
    /// Output format.
    pub to: Format,
    /// Original file name, forwarded to remote backends.
    pub filename: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Request converting `input` from one format to another.
    pub fn new(input: &'a [u8], from: Format, to: Format) -> Self {
        Self {
            input,
            from,
            to,
            filename: None,
        }
    }

    /// Attach the input's file name.
    pub fn with_filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }
}

/// One local conversion between two formats.
pub trait Converter: Send + Sync {
    /// Input format.
    fn source(&self) -> Format;

    /// Output format.
    fn target(&self) -> Format;

    /// Short name, e.g. `dxf-to-svg`.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Convert `input`, reporting coarse progress to `progress`.
    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted>;
}

/// Handles pairs without a local converter, typically over the network.
///
/// Implementations return the same [`Converted`] shape and error taxonomy
/// as local converters.
pub trait RemoteBackend: Send + Sync {
    /// True if the backend accepts this pair.
    fn supports(&self, from: Format, to: Format) -> bool;

    /// Convert `request`.
    fn convert(&self, request: &Request<'_>, options: &ConvertOptions) -> Result<Converted>;
}

/// Maps format pairs to converters.
///
/// [`Registry::convert`] is the conversion boundary: it enforces the input
/// size limit, dispatches to the local converter or the remote backend, and
/// turns panics and generic failures into `{FROM}_TO_{TO}_FAILED`.
pub struct Registry {
    converters: BTreeMap<(Format, Format), Box<dyn Converter>>,
    remote: Option<Arc<dyn RemoteBackend>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("pairs", &self.converters.keys().collect::<Vec<_>>())
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

impl Registry {
    /// Registry with every local converter, rasterizing with resvg.
    pub fn new() -> Self {
        Self::with_rasterizer(Arc::new(ResvgRasterizer::new()))
    }

    /// Registry with every local converter and a custom rasterizer.
    pub fn with_rasterizer(rasterizer: Arc<dyn Rasterizer>) -> Self {
        let mut registry = Self::empty();
        for converter in pipelines::all(rasterizer) {
            registry.register(converter);
        }
        registry
    }

    /// Registry without converters.
    pub fn empty() -> Self {
        Self {
            converters: BTreeMap::new(),
            remote: None,
        }
    }

    /// Add or replace the converter for its pair.
    pub fn register(&mut self, converter: Box<dyn Converter>) {
        let key = (converter.source(), converter.target());
        if self.converters.insert(key, converter).is_some() {
            debug!(from = %key.0, to = %key.1, "replaced converter");
        }
    }

    /// Use `remote` for pairs without a local converter.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteBackend>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Local converter for a pair.
    pub fn get(&self, from: Format, to: Format) -> Option<&dyn Converter> {
        self.converters.get(&(from, to)).map(|c| c.as_ref())
    }

    /// Local converters ordered by pair.
    pub fn converters(&self) -> impl Iterator<Item = &dyn Converter> {
        self.converters.values().map(|c| c.as_ref())
    }

    /// True if a local converter or the remote backend handles the pair.
    pub fn supports(&self, from: Format, to: Format) -> bool {
        self.converters.contains_key(&(from, to))
            || self.remote.as_ref().is_some_and(|r| r.supports(from, to))
    }

    /// Local pairs as `from->to` strings.
    pub fn supported_pairs(&self) -> Vec<String> {
        self.converters
            .keys()
            .map(|(from, to)| format!("{}->{}", from, to))
            .collect()
    }

    /// Run a conversion.
    ///
    /// Fails with `FileSize` over `options.limits.max_input_bytes` and with
    /// `UnsupportedFormat` when neither a local converter nor the remote
    /// backend handles the pair.
    pub fn convert(
        &self,
        request: &Request<'_>,
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        let (from, to) = (request.from, request.to);
        let size = request.input.len() as u64;
        if size > options.limits.max_input_bytes {
            return Err(ConvertError::FileSize {
                size,
                limit: options.limits.max_input_bytes,
            });
        }

        let Some(converter) = self.get(from, to) else {
            return match &self.remote {
                Some(remote) if remote.supports(from, to) => {
                    info!(%from, %to, bytes = size, "delegating to remote backend");
                    report(progress, 0.1);
                    let out = remote.convert(request, options)?;
                    report(progress, 1.0);
                    Ok(out)
                }
                _ => Err(ConvertError::unsupported(
                    format!("{}->{}", from, to),
                    &self.supported_pairs(),
                )),
            };
        };

        info!(converter = converter.name(), bytes = size, "converting");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            converter.convert(request.input, options, progress)
        }));
        let failed_code = || {
            format!(
                "{}_TO_{}_FAILED",
                from.extension().to_ascii_uppercase(),
                to.extension().to_ascii_uppercase()
            )
        };
        match outcome {
            Ok(Ok(out)) => {
                info!(
                    converter = converter.name(),
                    size = out.metadata.size,
                    "conversion finished"
                );
                Ok(out)
            }
            Ok(Err(ConvertError::Conversion { code, message })) if code == "CONVERSION_FAILED" => {
                Err(ConvertError::conversion(failed_code(), message))
            }
            Ok(Err(err)) => {
                debug!(converter = converter.name(), code = err.code(), "conversion failed");
                Err(err)
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(converter = converter.name(), %reason, "converter panicked");
                Err(ConvertError::conversion(
                    failed_code(),
                    format!("Failed to convert {} to {}: {}", from, to, reason),
                ))
            }
        }
    }
}
