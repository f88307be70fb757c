use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEventKind {
    SceneChanged { from: Option<Uuid>, to: Uuid },
    InfoOpened { hotspot_id: Uuid },
    LinkOpened { url: String },
    AudioStarted { hotspot_id: Uuid, url: String },
    AudioStopped,
    GuidedModeChanged { enabled: bool },
}

/// Something the viewer did, stamped with the tick it happened in.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerEvent {
    pub frame_index: u64,
    pub kind: ViewerEventKind,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<ViewerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame_index: u64, kind: ViewerEventKind) {
        self.events.push(ViewerEvent { frame_index, kind });
    }

    pub fn events(&self) -> &[ViewerEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }
}
