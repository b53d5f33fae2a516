// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ap_core::radio::{CommandRunner, ConfigStore};
use ap_core::DynResult;

mod dummy;
mod shell;
mod uci;

pub use dummy::DummyAccessPoint;
pub use shell::ShellRunner;
pub use uci::UciStore;

/// Settings shared by every backend factory.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Upper bound for a single device command.
    pub command_timeout: Duration,
    /// Model string reported by the dummy backend.
    pub dummy_model: String,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            dummy_model: "Linksys E8450 (UBI)".to_string(),
        }
    }
}

/// Configuration store and command surface of one access point.
pub struct DeviceBackend {
    pub store: Box<dyn ConfigStore>,
    pub shell: Arc<dyn CommandRunner>,
}

pub type BackendFactory = fn(&BackendOptions) -> DynResult<DeviceBackend>;

/// Context for registering and instantiating device backends.
#[derive(Clone)]
pub struct RegistrationContext {
    factories: HashMap<String, BackendFactory>,
}

impl RegistrationContext {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory under a stable name (e.g. "openwrt").
    pub fn register_backend(&mut self, name: &str, factory: BackendFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_backend_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    /// Registered backend names, sorted.
    pub fn registered_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate the named backend.
    pub fn build_backend(&self, name: &str, options: &BackendOptions) -> DynResult<DeviceBackend> {
        let factory = self
            .factories
            .get(&normalize_name(name))
            .ok_or_else(|| format!("Unknown device backend: {}", name))?;
        factory(options)
    }
}

impl Default for RegistrationContext {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Register every built-in backend on a context.
pub fn register_builtin_backends_on(context: &mut RegistrationContext) {
    context.register_backend("openwrt", openwrt_factory);
    context.register_backend("dummy", dummy_factory);
}

/// Context with every built-in backend registered.
pub fn builtin_backends() -> RegistrationContext {
    let mut context = RegistrationContext::new();
    register_builtin_backends_on(&mut context);
    context
}

fn openwrt_factory(options: &BackendOptions) -> DynResult<DeviceBackend> {
    let shell: Arc<dyn CommandRunner> = Arc::new(ShellRunner::new(options.command_timeout));
    Ok(DeviceBackend {
        store: Box::new(UciStore::new(shell.clone())),
        shell,
    })
}

fn dummy_factory(options: &BackendOptions) -> DynResult<DeviceBackend> {
    let ap = DummyAccessPoint::new(&options.dummy_model);
    Ok(DeviceBackend {
        store: Box::new(ap.clone()),
        shell: Arc::new(ap),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_normalized() {
        let context = builtin_backends();
        assert_eq!(context.registered_backends(), ["dummy", "openwrt"]);
        assert!(context.is_backend_registered("OpenWrt"));
        assert!(context.is_backend_registered("open-wrt"));
        assert!(!context.is_backend_registered("ft817"));
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let err = builtin_backends()
            .build_backend("mikrotik", &BackendOptions::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("mikrotik"));
    }

    #[tokio::test]
    async fn dummy_backend_shares_one_device() {
        let mut backend = builtin_backends()
            .build_backend("dummy", &BackendOptions::default())
            .unwrap();
        backend.store.set("wireless", "@wifi-iface[1]", "ssid", "604");
        backend.store.commit().await.unwrap();
        backend.shell.run("wifi", &["reload", "radio0"]).await.unwrap();

        let info = backend.shell.run("iwinfo", &["wlan0", "info"]).await.unwrap();
        assert!(info.contains("ESSID: \"604\""));
    }
}
