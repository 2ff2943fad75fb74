use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

#[derive(Clone)]
pub struct ModuleCtx {
    pub(crate) config_provider: Option<Arc<dyn ConfigProvider>>,
    pub(crate) module_name: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl Default for ModuleCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleCtxBuilder {
    pub fn new() -> Self {
        Self {
            inner: ModuleCtx {
                config_provider: None,
                module_name: None,
            },
        }
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    /// Pre-scope the context; the registry does this for every phase call.
    pub fn for_module(mut self, name: &str) -> Self {
        self.inner.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    pub(crate) fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Raw config section of the current module, if present.
    pub fn raw_module_config(&self) -> Option<&serde_json::Value> {
        match (&self.module_name, &self.config_provider) {
            (Some(name), Some(p)) => p.get_module_config(name),
            _ => None,
        }
    }

    /// Best-effort: deserialize the module's config into `T`, fallback to `T::default()`
    /// if section is missing or invalid.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        self.raw_module_config()
            .and_then(|v| match serde_json::from_value::<T>(v.clone()) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(
                        module = self.current_module().unwrap_or("?"),
                        error = %e,
                        "invalid module config, using defaults"
                    );
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Strict: deserialize the module's config into `T`, returning a pathful error on failure.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .module_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("context is not scoped to a module"))?;

        let prov = self
            .config_provider
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no ConfigProvider"))?;

        let val = prov
            .get_module_config(name)
            .ok_or_else(|| anyhow::anyhow!("missing module config: {name}"))?;

        serde_json::from_value(val.clone())
            .map_err(|e| anyhow::anyhow!("invalid {name} config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    struct MapProvider(HashMap<String, serde_json::Value>);

    impl ConfigProvider for MapProvider {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            self.0.get(module_name)
        }
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Cfg {
        #[serde(default)]
        enabled: bool,
        name: String,
    }

    fn ctx_for(module: &str, cfg: serde_json::Value) -> ModuleCtx {
        let mut map = HashMap::new();
        map.insert("m".to_string(), cfg);
        ModuleCtxBuilder::new()
            .with_config_provider(Arc::new(MapProvider(map)))
            .for_module(module)
            .build()
    }

    #[test]
    fn strict_config_reports_module_name() {
        let ctx = ctx_for("m", serde_json::json!({ "enabled": true }));
        let err = ctx.module_config_required::<Cfg>().unwrap_err();
        assert!(err.to_string().starts_with("invalid m config"));

        let ctx = ctx_for("other", serde_json::json!({}));
        let err = ctx.module_config_required::<Cfg>().unwrap_err();
        assert_eq!(err.to_string(), "missing module config: other");
    }

    #[test]
    fn lenient_config_falls_back_to_default() {
        let ctx = ctx_for("m", serde_json::json!({ "enabled": "yes" }));
        assert_eq!(ctx.module_config::<Cfg>(), Cfg::default());

        let ctx = ctx_for("m", serde_json::json!({ "name": "x" }));
        assert_eq!(
            ctx.module_config::<Cfg>(),
            Cfg {
                enabled: false,
                name: "x".into()
            }
        );
    }
}
