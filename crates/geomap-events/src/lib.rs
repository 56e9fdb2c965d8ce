use crossbeam_channel::{unbounded, Receiver, Sender};
use geomap_core::{LayerCategory, LayerInfo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound events from the control surface (project selector, layer
/// checkboxes) and from the canvas (drawing tools).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProjectSelected {
        project_id: String,
    },
    LayerToggled {
        layer_id: String,
        checked: bool,
    },
    /// A shape finished drawing on the canvas.
    ShapeCreated {
        shape: String,
        primitive_id: u64,
    },
}

/// Outbound notifications describing what the map core did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// Free-form lifecycle message, such as a teardown report.
    StatusUpdate {
        message: String,
    },
    LayersListed {
        project_id: String,
        layers: Vec<LayerInfo>,
    },
    LayerApplied {
        layer_id: String,
        category: LayerCategory,
        primitive_count: usize,
        correlation_id: String,
    },
    LayerCleared {
        layer_id: String,
        category: LayerCategory,
    },
    /// A fetch resolved after a newer refresh or a clear of its group.
    StaleResponseDiscarded {
        layer_id: String,
        category: LayerCategory,
        sequence: u64,
        correlation_id: String,
    },
    LayerFetchFailed {
        layer_id: String,
        reason: String,
        correlation_id: String,
    },
    ProjectFetchFailed {
        project_id: Option<String>,
        reason: String,
    },
    ShapeCreated {
        shape: String,
        primitive_id: u64,
    },
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event bus closed, dropping event");
        }
    }

    /// Take every pending event without blocking, in publish order.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}
