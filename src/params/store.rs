use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::error::{QuiltError, QuiltResult};

/// Keys of the persisted parameter table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    ViewCone,
    CamDist,
    PosX,
    PosY,
    PosZ,
    DiscScale,
    TaskNameY,
    TaskNameZ,
    TaskNameScale,
    TimerY,
    TimerZ,
    TimerScale,
    CenterOffset,
}

impl ParamKey {
    pub const ALL: [ParamKey; 13] = [
        ParamKey::ViewCone,
        ParamKey::CamDist,
        ParamKey::PosX,
        ParamKey::PosY,
        ParamKey::PosZ,
        ParamKey::DiscScale,
        ParamKey::TaskNameY,
        ParamKey::TaskNameZ,
        ParamKey::TaskNameScale,
        ParamKey::TimerY,
        ParamKey::TimerZ,
        ParamKey::TimerScale,
        ParamKey::CenterOffset,
    ];

    /// Storage key as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::ViewCone => "viewCone",
            ParamKey::CamDist => "camDist",
            ParamKey::PosX => "posX",
            ParamKey::PosY => "posY",
            ParamKey::PosZ => "posZ",
            ParamKey::DiscScale => "discScale",
            ParamKey::TaskNameY => "taskNameY",
            ParamKey::TaskNameZ => "taskNameZ",
            ParamKey::TaskNameScale => "taskNameScale",
            ParamKey::TimerY => "timerY",
            ParamKey::TimerZ => "timerZ",
            ParamKey::TimerScale => "timerScale",
            ParamKey::CenterOffset => "centerOffset",
        }
    }

    /// Documented default, string-encoded exactly as it is written to storage.
    pub fn default_value(self) -> &'static str {
        match self {
            ParamKey::ViewCone => "5",
            ParamKey::CamDist => "650",
            ParamKey::PosX => "0",
            ParamKey::PosY => "0",
            ParamKey::PosZ => "300",
            ParamKey::DiscScale => "1.6",
            ParamKey::TaskNameY => "180",
            ParamKey::TaskNameZ => "90",
            ParamKey::TaskNameScale => "0.7",
            ParamKey::TimerY => "0",
            ParamKey::TimerZ => "-110",
            ParamKey::TimerScale => "1",
            ParamKey::CenterOffset => "-0.489",
        }
    }

    pub fn default_f64(self) -> f64 {
        // Every entry of the default table is a numeric literal.
        self.default_value().parse().unwrap_or(0.0)
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat string key/value persistence.
pub trait KvBackend {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: &str) -> QuiltResult<()>;

    fn keys(&self) -> Vec<String>;
}

/// Volatile backend; the default for tests and embedding hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryKv {
    items: BTreeMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: items
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl KvBackend for MemoryKv {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> QuiltResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

/// JSON object on disk, rewritten after every change.
#[derive(Clone, Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl JsonFileKv {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> QuiltResult<Self> {
        let path = path.into();
        let items = if path.exists() {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read parameter store '{}'", path.display()))?;
            serde_json::from_slice::<BTreeMap<String, String>>(&bytes).map_err(|e| {
                QuiltError::serde(format!(
                    "parameter store '{}' is not a string map: {e}",
                    path.display()
                ))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> QuiltResult<()> {
        let json = serde_json::to_vec_pretty(&self.items)
            .map_err(|e| QuiltError::serde(format!("encode parameter store: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuiltError::store(format!("create '{}': {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, json)
            .map_err(|e| QuiltError::store(format!("write '{}': {e}", self.path.display())))
    }
}

impl KvBackend for JsonFileKv {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> QuiltResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

/// Parameter service handed to every component that reads configuration.
///
/// Reads of an absent key write the documented default first, so a value observed once is
/// always observed again until it is explicitly overwritten.
pub struct ParamStore {
    backend: Box<dyn KvBackend>,
}

impl std::fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamStore")
            .field("keys", &self.backend.keys())
            .finish()
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ParamStore {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryKv::new())
    }

    pub fn open_json(path: impl Into<PathBuf>) -> QuiltResult<Self> {
        Ok(Self::new(JsonFileKv::open(path)?))
    }

    /// Write every absent default and re-pin `posX` to `"0"`.
    pub fn seed_defaults(&mut self) -> QuiltResult<()> {
        for key in ParamKey::ALL {
            if key == ParamKey::PosX {
                self.backend.set_item(key.as_str(), key.default_value())?;
                continue;
            }
            if self.backend.get_item(key.as_str()).is_none() {
                self.backend.set_item(key.as_str(), key.default_value())?;
            }
        }
        tracing::debug!(
            view_cone = %self.get(ParamKey::ViewCone),
            cam_dist = %self.get(ParamKey::CamDist),
            center_offset = %self.get(ParamKey::CenterOffset),
            "parameter store seeded"
        );
        Ok(())
    }

    /// Raw string value, writing the default on first access.
    pub fn get(&mut self, key: ParamKey) -> String {
        if let Some(v) = self.backend.get_item(key.as_str()) {
            return v;
        }
        let default = key.default_value();
        if let Err(err) = self.backend.set_item(key.as_str(), default) {
            tracing::warn!(%key, error = %err, "failed to persist parameter default");
        }
        default.to_string()
    }

    /// Numeric value; absent, unparseable or non-finite entries yield the default.
    pub fn get_f64(&mut self, key: ParamKey) -> f64 {
        let raw = self.get(key);
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                tracing::debug!(%key, value = %raw, "non-numeric parameter, using default");
                key.default_f64()
            }
        }
    }

    /// Single-precision value; entries that overflow `f32` also yield the default.
    pub fn get_f32(&mut self, key: ParamKey) -> f32 {
        let v = self.get_f64(key) as f32;
        if v.is_finite() {
            v
        } else {
            tracing::warn!(%key, "parameter out of f32 range, using default");
            key.default_f64() as f32
        }
    }

    pub fn set(&mut self, key: ParamKey, value: &str) -> QuiltResult<()> {
        self.backend.set_item(key.as_str(), value)
    }

    pub fn set_f64(&mut self, key: ParamKey, value: f64) -> QuiltResult<()> {
        self.set(key, &value.to_string())
    }

    /// Untyped access for host-owned keys that share the store.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.backend.get_item(key)
    }

    pub fn set_raw(&mut self, key: &str, value: &str) -> QuiltResult<()> {
        self.backend.set_item(key, value)
    }

    /// Snapshot of every known parameter, defaults applied.
    pub fn entries(&mut self) -> Vec<(ParamKey, String)> {
        ParamKey::ALL.into_iter().map(|k| (k, self.get(k))).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/store.rs"]
mod tests;
