//! Listener registry for realm gestures
//!
//! Listeners are plain data: a target, a gesture kind and a [`Handler`]
//! naming what the engine should do. Passes hand back the ids they
//! registered so re-instrumentation can remove exactly those.

use webcraft_core::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Gesture kinds a listener can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Click,
    DoubleClick,
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerMove,
    PointerUp,
    Input,
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Node(NodeId),
    /// The realm as a whole; sees every gesture of its kind
    Realm,
}

/// What the engine does when a listener fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Select the node and start editing its text
    SelectText,
    /// Select the node without editing it
    SelectElement,
    /// Select the innermost container a click bubbles through
    SelectContainer,
    OpenImageReplacement { image: NodeId },
    EditLinkTarget,
    BeginDrag { target: NodeId },
    ShowOverlay { overlay: NodeId },
    HideOverlay { overlay: NodeId },
    DragMove,
    DragEnd,
}

#[derive(Debug, Clone)]
struct Listener {
    id: ListenerId,
    target: ListenerTarget,
    kind: GestureKind,
    handler: Handler,
}

/// All listeners currently attached to a realm
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: ListenerTarget, kind: GestureKind, handler: Handler) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            target,
            kind,
            handler,
        });
        id
    }

    pub fn on_node(&mut self, node: NodeId, kind: GestureKind, handler: Handler) -> ListenerId {
        self.add(ListenerTarget::Node(node), kind, handler)
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    pub fn remove_all(&mut self, ids: &[ListenerId]) {
        self.listeners.retain(|listener| !ids.contains(&listener.id));
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Handlers for `kind` on `target`, in registration order
    pub fn handlers(&self, target: ListenerTarget, kind: GestureKind) -> Vec<Handler> {
        self.listeners
            .iter()
            .filter(|listener| listener.target == target && listener.kind == kind)
            .map(|listener| listener.handler)
            .collect()
    }

    /// Number of listeners attached to `target`
    pub fn count_for(&self, target: ListenerTarget) -> usize {
        self.listeners
            .iter()
            .filter(|listener| listener.target == target)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcraft_core::Document;

    #[test]
    fn test_handlers_keep_registration_order() {
        let doc = Document::parse("<p>x</p>");
        let p = doc.first_element_by_tag("p").unwrap();
        let mut registry = ListenerRegistry::new();
        registry.on_node(p, GestureKind::Click, Handler::SelectText);
        registry.on_node(p, GestureKind::Click, Handler::SelectElement);
        registry.on_node(p, GestureKind::DoubleClick, Handler::EditLinkTarget);

        assert_eq!(
            registry.handlers(ListenerTarget::Node(p), GestureKind::Click),
            vec![Handler::SelectText, Handler::SelectElement]
        );
    }

    #[test]
    fn test_remove_by_id() {
        let mut registry = ListenerRegistry::new();
        let a = registry.add(ListenerTarget::Realm, GestureKind::PointerMove, Handler::DragMove);
        let b = registry.add(ListenerTarget::Realm, GestureKind::PointerUp, Handler::DragEnd);
        assert_ne!(a, b);
        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        registry.remove_all(&[b]);
        assert!(registry.is_empty());
    }
}
