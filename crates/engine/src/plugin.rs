// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The host plugin surface: `setup`, `execute`, `dispose`.
//!
//! The host owns scheduling and the last-sync timestamp; it hands the
//! engine an event sink and the Hub RPC stubs at setup, then invokes
//! `execute` on its own cadence.

use chrono::{DateTime, Utc};

use crate::config::{EngineConfig, SetupParams};
use crate::engine::{RunOutcome, SyncEngine};
use crate::eventlog::{EventLog, EventSink};
use crate::hub::HubService;
use crate::tracker::TrackerClient;

struct PluginState {
    config: EngineConfig,
    log: EventLog,
    hub: Box<dyn HubService>,
}

/// The engine packaged as a host plugin.
pub struct SyncPlugin {
    state: Option<PluginState>,
}

impl SyncPlugin {
    pub fn new() -> Self {
        SyncPlugin { state: None }
    }

    /// Configures the plugin. The host provides the event sink, the Hub
    /// RPC stubs, and the raw setup parameters.
    pub fn setup(
        &mut self,
        sink: Box<dyn EventSink>,
        hub: Box<dyn HubService>,
        params: SetupParams,
    ) {
        let config = EngineConfig::from_setup(&params);
        let log = EventLog::new(sink, config.trace_logging);
        self.state = Some(PluginState { config, log, hub });
    }

    /// Access to the named engine toggles that sit outside the host's
    /// fixed parameter list (`push_window_filter`,
    /// `persist_auto_created_release_mappings`, timezone override, gating
    /// property names, certificate acceptance).
    pub fn config_mut(&mut self) -> Option<&mut EngineConfig> {
        self.state.as_mut().map(|s| &mut s.config)
    }

    /// Runs one reconciliation cycle.
    pub fn execute(&mut self, last_sync_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> RunOutcome {
        let Some(state) = self.state.as_mut() else {
            tracing::error!("execute called before setup");
            return RunOutcome::Error;
        };
        let mut tracker = TrackerClient::connect(&state.config);
        let mut engine = SyncEngine::new(
            &state.config,
            &state.log,
            state.hub.as_mut(),
            &mut tracker,
        );
        engine.execute(last_sync_at, now)
    }

    /// Releases the Hub session and drops the configuration.
    pub fn dispose(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.hub.disconnect();
        }
    }
}

impl Default for SyncPlugin {
    fn default() -> Self {
        SyncPlugin::new()
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
