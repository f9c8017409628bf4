//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::sync::Arc;

use tracing::debug;

use crate::error::{DynamicsError, Result};
use crate::macro_connections::{
    merge_connector, MacroConnect, MacroConnector, StagedConnections, VarConnection,
};
use crate::models::{BlackBoxModel, Capability, ModelRegistry, Port};
use crate::network::{EquipmentType, Network, Side};
use crate::report::{ReportNode, Severity};

/// First side of a connect: id, library and optional `index1`.
#[derive(Debug, Clone, Copy)]
pub struct ConnectSource<'s> {
    pub id: &'s str,
    pub lib: &'s str,
    pub index: Option<usize>,
}

impl<'s> From<&'s BlackBoxModel> for ConnectSource<'s> {
    fn from(model: &'s BlackBoxModel) -> Self {
        Self {
            id: model.dynamic_model_id(),
            lib: model.lib(),
            index: None,
        }
    }
}

/// Mediator every model requests its connections through.
///
/// One adder serves one model: it stages connectors and connects locally so a
/// model that ends up unconnected leaves nothing behind.
pub struct MacroConnectionsAdder<'a> {
    registry: &'a ModelRegistry<'a>,
    report: &'a mut ReportNode,
    staged: StagedConnections,
}

impl<'a> MacroConnectionsAdder<'a> {
    pub fn new(registry: &'a ModelRegistry<'a>, report: &'a mut ReportNode) -> Self {
        Self {
            registry,
            report,
            staged: StagedConnections::default(),
        }
    }

    pub fn network(&self) -> &Network {
        self.registry.network()
    }

    pub fn registry(&self) -> &ModelRegistry<'a> {
        self.registry
    }

    pub fn into_staged(self) -> StagedConnections {
        self.staged
    }

    /// Connect `model` to the model backing `target`; unresolvable targets are an error.
    pub fn create_macro_connections<F>(
        &mut self,
        model: &BlackBoxModel,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
        connect: F,
    ) -> Result<()>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        self.connect_required(model, target, target_type, capability, None, connect)
    }

    pub fn create_macro_connections_with_suffix<F>(
        &mut self,
        model: &BlackBoxModel,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
        suffix: &str,
        connect: F,
    ) -> Result<()>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        self.connect_required(model, target, target_type, capability, Some(suffix), connect)
    }

    /// Same as [`Self::create_macro_connections`] but returns `true` instead of
    /// failing when the target cannot be resolved or lacks `capability`.
    pub fn create_macro_connections_or_skip<F>(
        &mut self,
        model: &BlackBoxModel,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
        suffix: Option<&str>,
        connect: F,
    ) -> Result<bool>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        match self.resolve(target, target_type, capability)? {
            Some(resolved) => {
                let connections = connect(&resolved)?;
                self.stage(ConnectSource::from(model), &resolved, suffix, connections)?;
                Ok(false)
            }
            None => {
                self.report_skip(model, target, capability);
                Ok(true)
            }
        }
    }

    /// Connect to a tap changer automaton declared in the same run.
    pub fn create_tca_macro_connections_or_skip<F>(
        &mut self,
        model: &BlackBoxModel,
        tap_changer_id: &str,
        connect: F,
    ) -> Result<bool>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        let resolved = self
            .registry
            .dynamic_model(tap_changer_id)
            .filter(|tca| tca.has(Capability::TapChangerAutomaton));
        match resolved {
            Some(tca) => {
                let connections = connect(&tca)?;
                self.stage(ConnectSource::from(model), &tca, None, connections)?;
                Ok(false)
            }
            None => {
                self.report_skip(model, tap_changer_id, Capability::TapChangerAutomaton);
                Ok(true)
            }
        }
    }

    /// Terminal of an equipment model to its bus, propagating the bus
    /// switch-off signal when both sides expose it.
    pub fn create_terminal_macro_connections(
        &mut self,
        model: &BlackBoxModel,
        bus: &str,
        side: Option<Side>,
    ) -> Result<()> {
        let terminal = match side {
            Some(side) => model.require_var(Port::BranchTerminal(side))?,
            None => model.require_var(Port::Terminal)?,
        };
        let switch_off = model.var(Port::SwitchOffSignal1);
        let suffix = side.map(Side::suffix);
        self.connect_required(
            model,
            bus,
            EquipmentType::Bus,
            Capability::Bus,
            suffix.as_deref(),
            |bus_model| {
                let mut connections =
                    vec![VarConnection::new(terminal, bus_model.require_var(Port::Terminal)?)];
                if let (Some(signal), Some(bus_switch_off)) =
                    (switch_off, bus_model.var(Port::SwitchOff))
                {
                    connections.push(VarConnection::new(signal, bus_switch_off));
                }
                Ok(connections)
            },
        )
    }

    /// Connect to the network default of `target`, even when an explicit model is bound to it.
    pub fn create_network_macro_connections<F>(
        &mut self,
        model: &BlackBoxModel,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
        connect: F,
    ) -> Result<()>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        let resolved = self
            .registry
            .resolve_default(target, target_type)?
            .filter(|default| default.has(capability))
            .ok_or_else(|| missing_connection(model.dynamic_model_id(), target, capability))?;
        let connections = connect(&resolved)?;
        self.stage(ConnectSource::from(model), &resolved, None, connections)
    }

    /// Connection from an indexed source (OmegaRef) to an already resolved model.
    pub fn create_indexed_macro_connections<F>(
        &mut self,
        source: ConnectSource<'_>,
        target: &BlackBoxModel,
        connect: F,
    ) -> Result<()>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        let connections = connect(target)?;
        self.stage(source, target, None, connections)
    }

    /// Indexed connection to the model backing `target`; unresolvable targets are an error.
    pub fn create_indexed_macro_connections_to<F>(
        &mut self,
        source: ConnectSource<'_>,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
        connect: F,
    ) -> Result<()>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        let resolved = self
            .resolve(target, target_type, capability)?
            .ok_or_else(|| missing_connection(source.id, target, capability))?;
        let connections = connect(&resolved)?;
        self.stage(source, &resolved, None, connections)
    }

    fn connect_required<F>(
        &mut self,
        model: &BlackBoxModel,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
        suffix: Option<&str>,
        connect: F,
    ) -> Result<()>
    where
        F: FnOnce(&BlackBoxModel) -> Result<Vec<VarConnection>>,
    {
        let resolved = self
            .resolve(target, target_type, capability)?
            .ok_or_else(|| missing_connection(model.dynamic_model_id(), target, capability))?;
        let connections = connect(&resolved)?;
        self.stage(ConnectSource::from(model), &resolved, suffix, connections)
    }

    fn resolve(
        &self,
        target: &str,
        target_type: EquipmentType,
        capability: Capability,
    ) -> Result<Option<Arc<BlackBoxModel>>> {
        Ok(self
            .registry
            .resolve(target, target_type)?
            .filter(|resolved| resolved.has(capability)))
    }

    fn stage(
        &mut self,
        source: ConnectSource<'_>,
        target: &BlackBoxModel,
        suffix: Option<&str>,
        connections: Vec<VarConnection>,
    ) -> Result<()> {
        let connector_id = MacroConnector::id_for(source.lib, target.lib(), suffix);
        merge_connector(
            &mut self.staged.connectors,
            MacroConnector {
                id: connector_id.clone(),
                connections,
            },
        )?;
        let (id2, name2) = target.connect_target();
        debug!(
            connector = %connector_id,
            model = source.id,
            target = %target.dynamic_model_id(),
            "macro connect staged"
        );
        self.staged.connects.push(MacroConnect {
            connector: connector_id,
            id1: source.id.to_owned(),
            index1: source.index,
            id2,
            name2,
        });
        Ok(())
    }

    fn report_skip(&mut self, model: &BlackBoxModel, target: &str, capability: Capability) {
        self.report.report(
            "connectionSkipped",
            format!(
                "{} ({}) skips {target}: no model with {capability} capability",
                model.dynamic_model_id(),
                model.lib()
            ),
            Severity::Warn,
        );
    }
}

fn missing_connection(model: &str, target: &str, capability: Capability) -> DynamicsError {
    DynamicsError::MissingConnection {
        model: model.to_owned(),
        target: target.to_owned(),
        capability,
    }
}
