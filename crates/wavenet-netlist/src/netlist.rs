use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentId};
use crate::net::{Net, NetId, NetType, PinRef, NET_DISCONNECTED};
use crate::pin::Pin;

/// Owner of every component (and through them, every pin) and every net.
///
/// Links between pins, nets and components are plain indices into this
/// arena, so the connectivity graph has no ownership cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Netlist {
    components: Vec<Component>,
    nets: Vec<Net>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Components ───────────────────────────────────────────────────

    /// Add a component, assigning it the next index.
    pub fn add_component(&mut self, mut component: Component) -> ComponentId {
        let id = ComponentId(self.components.len());
        component.set_idx(id);
        self.components.push(component);
        id
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.0)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn pin(&self, r: PinRef) -> Option<&Pin> {
        self.component(r.component).and_then(|c| c.pin(r.pin))
    }

    pub fn pin_mut(&mut self, r: PinRef) -> Option<&mut Pin> {
        self.component_mut(r.component)
            .and_then(|c| c.pins_mut().get_mut(r.pin))
    }

    /// Every pin in the netlist, with its reference.
    pub fn pins(&self) -> impl Iterator<Item = (PinRef, &Pin)> {
        self.components.iter().flat_map(|c| {
            c.pins()
                .iter()
                .enumerate()
                .map(move |(i, p)| (PinRef::new(c.idx, i), p))
        })
    }

    // ── Nets ─────────────────────────────────────────────────────────

    /// Create a net over `pins` and link each of them to it.
    ///
    /// No arity check happens here; see [`crate::extract::check_net_arity`].
    pub fn add_net(&mut self, net_type: NetType, pins: Vec<PinRef>) -> NetId {
        let id = NetId(self.nets.len() as i64);
        for r in &pins {
            match self.pin_mut(*r) {
                Some(pin) => pin.connect(id),
                None => log::warn!("Net {id} references missing pin {}:{}", r.component, r.pin),
            }
        }
        self.nets.push(Net::new(id, net_type, pins));
        id
    }

    /// Look up a net. The disconnected id resolves to [`NET_DISCONNECTED`].
    pub fn net(&self, id: NetId) -> Option<&Net> {
        if id.is_disconnected() {
            return Some(&NET_DISCONNECTED);
        }
        usize::try_from(id.0).ok().and_then(|i| self.nets.get(i))
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    /// Drop all nets and return every pin to the disconnected net.
    pub fn clear_nets(&mut self) {
        self.nets.clear();
        for component in &mut self.components {
            for pin in component.pins_mut() {
                pin.connect(NetId::DISCONNECTED);
            }
        }
    }

    // ── Output ───────────────────────────────────────────────────────

    /// Textual netlist, one line per component:
    /// `<component>_<idx> <net1> <net2> ...`.
    ///
    /// Nets print as `N$<idx>`; a disconnected pin prints as
    /// `NC_<component idx>_<pin index>` so dangling pins never alias.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for component in &self.components {
            out.push_str(&format!("{}_{}", component.component, component.idx));
            for (i, pin) in component.pins().iter().enumerate() {
                if pin.is_connected() {
                    out.push_str(&format!(" N${}", pin.net()));
                } else {
                    out.push_str(&format!(" NC_{}_{}", component.idx, i));
                }
            }
            out.push('\n');
        }
        out
    }
}
