use std::borrow::Cow;
use std::path::PathBuf;

use crate::AssetError;

/// Resolves WGSL sources: a file `<dir>/<name>.wgsl` overrides the source
/// compiled into the binary, so shaders can be edited without a rebuild.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    dir: Option<PathBuf>,
}

impl ShaderLibrary {
    /// Library that only ever returns built-in sources.
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }

    /// Source for `name`: the override file when present, else `builtin`.
    pub fn source(&self, name: &str, builtin: &'static str) -> Result<Cow<'static, str>, AssetError> {
        let Some(dir) = &self.dir else {
            return Ok(Cow::Borrowed(builtin));
        };
        let path = dir.join(format!("{name}.wgsl"));
        if !path.is_file() {
            return Ok(Cow::Borrowed(builtin));
        }
        let text = std::fs::read_to_string(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!("shader {name} overridden by {}", path.display());
        Ok(Cow::Owned(text))
    }
}
