// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! OpenWrt configuration store driven through the `uci` command line tool.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use ap_core::radio::{CommandRunner, ConfigStore, RadioFuture};
use ap_core::RadioError;

const UCI: &str = "uci";

/// Configuration store backed by `uci`.
///
/// Writes are kept in memory until `commit`, which hands them to `uci set`
/// and persists them with a single `uci commit`. If any write is rejected
/// the touched configs are reverted and nothing is persisted.
pub struct UciStore {
    shell: Arc<dyn CommandRunner>,
    staged: Vec<(String, String)>,
}

impl UciStore {
    pub fn new(shell: Arc<dyn CommandRunner>) -> Self {
        Self {
            shell,
            staged: Vec::new(),
        }
    }

    /// Number of writes waiting for `commit`.
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    async fn revert(&self, sections: &BTreeSet<String>) {
        for section in sections {
            if let Err(e) = self.shell.run(UCI, &["revert", section]).await {
                warn!("Failed to revert uci section {}: {}", section, e);
            }
        }
    }
}

fn option_path(section: &str, instance: &str, key: &str) -> String {
    format!("{}.{}.{}", section, instance, key)
}

impl ConfigStore for UciStore {
    fn get<'a>(
        &'a mut self,
        section: &'a str,
        instance: &'a str,
        key: &'a str,
    ) -> RadioFuture<'a, Option<String>> {
        Box::pin(async move {
            let path = option_path(section, instance, key);
            if let Some((_, value)) = self.staged.iter().rev().find(|(p, _)| *p == path) {
                return Ok(Some(value.clone()));
            }
            // `uci -q get` exits non-zero without output when the option is
            // not set.
            match self.shell.run(UCI, &["-q", "get", &path]).await {
                Ok(output) => Ok(Some(output.trim_end_matches('\n').to_string())),
                Err(e) => {
                    debug!("uci get {} returned nothing: {}", path, e);
                    Ok(None)
                }
            }
        })
    }

    fn set(&mut self, section: &str, instance: &str, key: &str, value: &str) {
        self.staged
            .push((option_path(section, instance, key), value.to_string()));
    }

    fn commit<'a>(&'a mut self) -> RadioFuture<'a, ()> {
        Box::pin(async move {
            debug!("Committing {} uci write(s)", self.pending());
            let staged = std::mem::take(&mut self.staged);
            let sections: BTreeSet<String> = staged
                .iter()
                .filter_map(|(path, _)| path.split('.').next().map(str::to_string))
                .collect();

            for (path, value) in &staged {
                let assignment = format!("{}={}", path, value);
                if let Err(e) = self.shell.run(UCI, &["set", &assignment]).await {
                    self.revert(&sections).await;
                    return Err(RadioError::store(format!("failed to stage {}: {}", path, e)));
                }
            }

            if let Err(e) = self.shell.run(UCI, &["commit"]).await {
                self.revert(&sections).await;
                return Err(RadioError::store(format!("failed to commit: {}", e)));
            }
            Ok(())
        })
    }
}
