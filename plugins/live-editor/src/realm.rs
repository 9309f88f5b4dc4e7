//! The isolated document realm and its access guard

use tracing::{debug, warn};
use webcraft_core::{Document, NodeId};

use crate::EditorError;

const SAME_ORIGIN_TOKEN: &str = "allow-same-origin";

/// Whether the host may reach into the realm's tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealmAccess {
    SameOrigin,
    Isolated,
}

/// Sandbox tokens the realm is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    tokens: Vec<String>,
}

impl SandboxPolicy {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn access(&self) -> RealmAccess {
        if self.tokens.iter().any(|token| token == SAME_ORIGIN_TOKEN) {
            RealmAccess::SameOrigin
        } else {
            RealmAccess::Isolated
        }
    }

    /// Value for the embedding frame's `sandbox` attribute
    pub fn attribute_value(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Reference to an element of one realm generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    node: NodeId,
    generation: u64,
}

impl ElementRef {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// An embedded document context reachable only through the guard
#[derive(Debug)]
pub struct Realm {
    policy: SandboxPolicy,
    document: Option<Document>,
    generation: u64,
}

impl Realm {
    pub fn new(policy: SandboxPolicy) -> Self {
        Self {
            policy,
            document: None,
            generation: 0,
        }
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    /// Replace the realm's document; references into earlier loads go stale
    pub fn load(&mut self, source: &str) -> u64 {
        self.document = Some(Document::parse(source));
        self.generation += 1;
        debug!("Realm loaded generation {} ({} bytes)", self.generation, source.len());
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    fn check_access(&self) -> Result<(), EditorError> {
        match self.policy.access() {
            RealmAccess::SameOrigin => Ok(()),
            RealmAccess::Isolated => {
                warn!(
                    "Realm access denied with sandbox \"{}\"",
                    self.policy.attribute_value()
                );
                Err(EditorError::AccessDenied {
                    reason: "the editing frame is isolated from the editor".to_string(),
                    remediation: format!(
                        "Add \"{}\" to the editor sandbox setting (current: \"{}\") and reload the document.",
                        SAME_ORIGIN_TOKEN,
                        self.policy.attribute_value()
                    ),
                })
            }
        }
    }

    pub fn try_read(&self) -> Result<&Document, EditorError> {
        self.check_access()?;
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    pub fn try_write(&mut self) -> Result<&mut Document, EditorError> {
        self.check_access()?;
        self.document.as_mut().ok_or(EditorError::NoDocument)
    }

    pub fn element_ref(&self, node: NodeId) -> ElementRef {
        ElementRef {
            node,
            generation: self.generation,
        }
    }

    /// The node behind a reference, if it is current and still in the tree
    pub fn resolve(&self, reference: ElementRef) -> Result<NodeId, EditorError> {
        if reference.generation != self.generation {
            return Err(EditorError::StaleReference);
        }
        let doc = self.try_read()?;
        if doc.element(reference.node).is_some() && doc.is_attached(reference.node) {
            Ok(reference.node)
        } else {
            Err(EditorError::StaleReference)
        }
    }
}
