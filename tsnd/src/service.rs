//! The daemon's long-lived state: the loaded configuration document
//! and the descriptors compiled from it, behind one lock so a reload
//! swaps both atomically. Held in an explicit service object rather
//! than module globals so the lifecycle (load, serve, reload, drop)
//! stays visible at the call sites.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{error, info};
use tsn_bus::{BusRequest, BusResponse};
use tsn_compiler::{compile_document, InterfaceDescriptor};
use tsn_config::{ConfigDocument, ConfigError};
use tsn_queues::{create_vlan, delete_vlan, EthtoolLinkSpeed};

struct State {
    document: ConfigDocument,
    descriptors: Vec<InterfaceDescriptor>,
}

pub(crate) struct Daemon {
    config_path: PathBuf,
    state: RwLock<State>,
}

impl Daemon {
    /// Load and compile the configuration; fails fast when the
    /// document is invalid, so the daemon never starts half-configured.
    pub(crate) fn new(config_path: PathBuf) -> Result<Arc<Self>, ConfigError> {
        let state = Self::compile(&config_path)?;
        info!(
            "Compiled {} interface descriptor(s)",
            state.descriptors.len()
        );
        Ok(Arc::new(Self {
            config_path,
            state: RwLock::new(state),
        }))
    }

    fn compile(path: &Path) -> Result<State, ConfigError> {
        let document = ConfigDocument::load(path)?;
        let descriptors = compile_document(&document, &EthtoolLinkSpeed)?;
        Ok(State {
            document,
            descriptors,
        })
    }

    /// Re-read and recompile the configuration file. On failure the
    /// previous state stays in place.
    pub(crate) fn reload(&self) -> Result<(), ConfigError> {
        match Self::compile(&self.config_path) {
            Ok(state) => {
                info!(
                    "Configuration reloaded: {} interface descriptor(s)",
                    state.descriptors.len()
                );
                *self.state.write().expect("poisoned state lock") = state;
                Ok(())
            }
            Err(e) => {
                error!("Configuration reload failed, keeping previous state: {e}");
                Err(e)
            }
        }
    }

    /// Bus entry point: one response per request, in request order.
    pub(crate) fn handle_requests(&self, requests: &[BusRequest]) -> Vec<BusResponse> {
        requests.iter().map(|r| self.handle(r)).collect()
    }

    fn handle(&self, request: &BusRequest) -> BusResponse {
        match request {
            BusRequest::Ping => BusResponse::Ack,
            BusRequest::CreateInterface { ifname, vlan_id } => self.create(ifname, *vlan_id),
            BusRequest::DeleteInterface { ifname, vlan_id } => {
                match delete_vlan(ifname, *vlan_id) {
                    Ok(()) => BusResponse::Ack,
                    Err(e) => BusResponse::Fail(e.to_string()),
                }
            }
            BusRequest::GetInterfaceInfo { ifname } => self.info(ifname.as_deref()),
            BusRequest::GetConfig => {
                let state = self.state.read().expect("poisoned state lock");
                match serde_yaml::to_string(&state.document) {
                    Ok(text) => BusResponse::ConfigText(text),
                    Err(e) => BusResponse::Fail(e.to_string()),
                }
            }
            BusRequest::UpdateConfig(text) => self.update_config(text),
            BusRequest::ReloadConfig => match self.reload() {
                Ok(()) => BusResponse::Ack,
                Err(e) => BusResponse::Fail(e.to_string()),
            },
        }
    }

    fn create(&self, ifname: &str, vlan_id: u16) -> BusResponse {
        let state = self.state.read().expect("poisoned state lock");
        let Some(descriptor) = state.descriptors.iter().find(|d| d.ifname == ifname) else {
            return BusResponse::Fail(format!("{ifname} is not in the configuration"));
        };
        let empty = BTreeMap::new();
        let egress_qos_map = state
            .document
            .nics
            .get(ifname)
            .and_then(|nic| nic.egress_qos_map.get(&vlan_id))
            .unwrap_or(&empty);
        match create_vlan(descriptor, vlan_id, egress_qos_map) {
            Ok(()) => BusResponse::Ack,
            Err(e) => BusResponse::Fail(e.to_string()),
        }
    }

    fn info(&self, ifname: Option<&str>) -> BusResponse {
        let state = self.state.read().expect("poisoned state lock");
        let descriptors = state
            .descriptors
            .iter()
            .filter(|d| ifname.is_none() || ifname == Some(d.ifname.as_str()))
            .cloned()
            .collect();
        BusResponse::InterfaceInfo(descriptors)
    }

    /// Validate by compiling first: an invalid document never touches
    /// the file on disk or the running state.
    fn update_config(&self, text: &str) -> BusResponse {
        let document = match ConfigDocument::parse(text) {
            Ok(document) => document,
            Err(e) => return BusResponse::Fail(e.to_string()),
        };
        let descriptors = match compile_document(&document, &EthtoolLinkSpeed) {
            Ok(descriptors) => descriptors,
            Err(e) => return BusResponse::Fail(e.to_string()),
        };
        if let Err(e) = std::fs::write(&self.config_path, text) {
            return BusResponse::Fail(format!(
                "unable to write {}: {e}",
                self.config_path.display()
            ));
        }
        info!(
            "Configuration replaced over the bus: {} interface descriptor(s)",
            descriptors.len()
        );
        *self.state.write().expect("poisoned state lock") = State {
            document,
            descriptors,
        };
        BusResponse::Ack
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EXAMPLE: &str = r#"
nics:
  eth1:
    egress-qos-map:
      10: { 1: 3 }
    cbs:
      3: { class: a, bandwidth: 100Mbps, max_frame: 1542B }
"#;

    fn daemon_with(name: &str, config: &str) -> Arc<Daemon> {
        let dir = std::env::temp_dir().join(format!("tsnd-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.yaml"));
        std::fs::write(&path, config).unwrap();
        Daemon::new(path).unwrap()
    }

    #[test]
    fn ping_acks() {
        let daemon = daemon_with("ping", EXAMPLE);
        let responses = daemon.handle_requests(&[BusRequest::Ping]);
        assert_eq!(responses, vec![BusResponse::Ack]);
    }

    #[test]
    fn info_filters_by_interface() {
        let daemon = daemon_with("info", EXAMPLE);
        let responses = daemon.handle_requests(&[
            BusRequest::GetInterfaceInfo { ifname: None },
            BusRequest::GetInterfaceInfo {
                ifname: Some("eth1".to_string()),
            },
            BusRequest::GetInterfaceInfo {
                ifname: Some("missing0".to_string()),
            },
        ]);
        let BusResponse::InterfaceInfo(all) = &responses[0] else {
            panic!("expected interface info");
        };
        assert_eq!(all.len(), 1);
        assert_eq!(responses[1], responses[0]);
        assert_eq!(responses[2], BusResponse::InterfaceInfo(Vec::new()));
    }

    #[test]
    fn create_for_unknown_interface_fails() {
        let daemon = daemon_with("create", EXAMPLE);
        let responses = daemon.handle_requests(&[BusRequest::CreateInterface {
            ifname: "missing0".to_string(),
            vlan_id: 10,
        }]);
        assert!(matches!(&responses[0], BusResponse::Fail(msg)
            if msg.contains("missing0")));
    }

    #[test]
    fn invalid_update_is_rejected_and_state_kept() {
        let daemon = daemon_with("update", EXAMPLE);
        let responses = daemon.handle_requests(&[BusRequest::UpdateConfig(
            "nics:\n  eth1:\n    cbs:\n      3: { class: a }\n".to_string(),
        )]);
        assert!(matches!(&responses[0], BusResponse::Fail(msg)
            if msg.contains("missing required key")));

        // old state still answers
        let responses = daemon.handle_requests(&[BusRequest::GetInterfaceInfo { ifname: None }]);
        let BusResponse::InterfaceInfo(all) = &responses[0] else {
            panic!("expected interface info");
        };
        assert_eq!(all.len(), 1);
    }
}
