//! # Drag/Gesture Coordinator
//!
//! ```text
//! Idle → Dragging → Previewing ⇄ Dragging → drop / cancel → Idle
//! ```
//!
//! While a drag is in progress nothing touches the document. Every pointer
//! move re-resolves the drop target against the current projection and
//! runs the same placement rules the engine would, purely to choose an
//! allowed/rejected indicator. Dropping yields at most one [`DropIntent`]
//! for the session to execute.

use crate::hit::{resolve_drop_target, DropTarget, LayoutHints, Point};
use crate::mutations::MutationError;
use crate::projection::RenderTree;
use crate::rules::{self, check_insert, check_move};
use pagecraft_document::{Document, NodeId};
use pagecraft_schema::{Props, SchemaRegistry};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// Move a node that is already on the page
    Existing(NodeId),

    /// Insert a new component from the palette
    Palette { component_type: String, props: Props },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropIndicator {
    Allowed,
    Rejected(MutationError),
}

impl DropIndicator {
    pub fn is_allowed(&self) -> bool {
        matches!(self, DropIndicator::Allowed)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: DragSource,
        pointer: Point,
    },
    Previewing {
        source: DragSource,
        pointer: Point,
        target: DropTarget,
        indicator: DropIndicator,
    },
}

/// What the session should do once the pointer is released
#[derive(Debug, Clone, PartialEq)]
pub enum DropIntent {
    Move {
        node: NodeId,
        parent: Option<NodeId>,
        zone: Option<String>,
        /// Zone-relative, already adjusted for the node's own removal
        index: usize,
    },
    Insert {
        component_type: String,
        props: Props,
        target: DropTarget,
    },
    /// Dropped back onto its own position
    NoOp,
    Cancel {
        reason: Option<MutationError>,
    },
}

/// Result of a finished gesture as seen by the UI
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// One mutation was recorded; carries the new node id for palette drops
    Committed(Option<NodeId>),
    Cancelled { reason: Option<MutationError> },
    Unchanged,
}

#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
    last_rejection: Option<MutationError>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn indicator(&self) -> Option<&DropIndicator> {
        match &self.state {
            DragState::Previewing { indicator, .. } => Some(indicator),
            _ => None,
        }
    }

    pub fn begin(&mut self, source: DragSource, pointer: Point) {
        debug!(?source, "Drag started");
        self.last_rejection = None;
        self.state = DragState::Dragging { source, pointer };
    }

    /// Update the preview for a new pointer position.
    pub fn pointer_moved(
        &mut self,
        doc: &Document,
        registry: &SchemaRegistry,
        tree: &RenderTree,
        layout: &LayoutHints,
        pointer: Point,
    ) -> Option<&DropIndicator> {
        let source = match std::mem::take(&mut self.state) {
            DragState::Idle => return None,
            DragState::Dragging { source, .. } | DragState::Previewing { source, .. } => source,
        };

        let Some(target) = resolve_drop_target(doc, registry, tree, layout, pointer) else {
            self.state = DragState::Dragging { source, pointer };
            return None;
        };

        let indicator = match validate(doc, registry, &source, &target) {
            Ok(()) => DropIndicator::Allowed,
            Err(err) => {
                self.last_rejection = Some(err.clone());
                DropIndicator::Rejected(err)
            }
        };

        self.state = DragState::Previewing {
            source,
            pointer,
            target,
            indicator,
        };
        self.indicator()
    }

    /// Release the pointer. The coordinator is idle afterwards.
    pub fn drop(&mut self, doc: &Document) -> DropIntent {
        let state = std::mem::take(&mut self.state);
        let last_rejection = self.last_rejection.take();

        match state {
            DragState::Idle => DropIntent::Cancel { reason: None },
            DragState::Dragging { .. } => DropIntent::Cancel {
                reason: last_rejection,
            },
            DragState::Previewing {
                indicator: DropIndicator::Rejected(err),
                ..
            } => DropIntent::Cancel { reason: Some(err) },
            DragState::Previewing {
                source: DragSource::Palette {
                    component_type,
                    props,
                },
                target,
                ..
            } => DropIntent::Insert {
                component_type,
                props,
                target,
            },
            DragState::Previewing {
                source: DragSource::Existing(node),
                target,
                ..
            } => move_intent(doc, node, target),
        }
    }

    /// Abort the gesture (escape key); nothing is issued.
    pub fn cancel(&mut self) -> DragOutcome {
        if self.is_active() {
            debug!("Drag cancelled");
        }
        self.state = DragState::Idle;
        self.last_rejection = None;
        DragOutcome::Cancelled { reason: None }
    }
}

fn validate(
    doc: &Document,
    registry: &SchemaRegistry,
    source: &DragSource,
    target: &DropTarget,
) -> Result<(), MutationError> {
    match source {
        DragSource::Existing(node) => {
            check_move(doc, registry, node, target.parent.as_ref(), target.zone.as_deref())
        }
        DragSource::Palette { component_type, .. } => check_insert(
            doc,
            registry,
            target.parent.as_ref(),
            target.zone.as_deref(),
            component_type,
        ),
    }
    .map(|_| ())
}

/// Translate a drop slot into a move index read after detaching the node.
fn move_intent(doc: &Document, node: NodeId, target: DropTarget) -> DropIntent {
    let Some(current) = doc.node(&node) else {
        return DropIntent::Cancel {
            reason: Some(MutationError::NodeNotFound(node)),
        };
    };

    let same_zone = current.parent_id == target.parent && current.zone_id == target.zone;
    let mut index = target.index;
    if same_zone {
        if let Some(own) = rules::zone_index(doc, &node) {
            // Slots directly before and after the node are its own position
            if index == own || index == own + 1 {
                return DropIntent::NoOp;
            }
            if index > own {
                index -= 1;
            }
        }
    }

    DropIntent::Move {
        node,
        parent: target.parent,
        zone: target.zone,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Rect;
    use crate::mutations::MutationEngine;
    use crate::projection::{project, ProjectionMode, UiState};
    use pagecraft_document::IdGenerator;
    use pagecraft_schema::standard_registry;
    use std::sync::Arc;

    struct Canvas {
        registry: Arc<SchemaRegistry>,
        doc: Document,
        layout: LayoutHints,
        section: NodeId,
        spacers: Vec<NodeId>,
    }

    /// Section (0..300) followed by three spacers of 100px each.
    fn canvas() -> Canvas {
        let registry = Arc::new(standard_registry());
        let mut engine = MutationEngine::new(registry.clone(), IdGenerator::from_seed("d"));
        let r = engine
            .insert(&Document::new(), None, None, 0, "Section", Props::new())
            .unwrap();
        let section = r.created.clone();
        let mut doc = r.document;
        let mut spacers = Vec::new();
        for i in 0..3 {
            let r = engine.insert(&doc, None, None, i + 1, "Spacer", Props::new()).unwrap();
            spacers.push(r.created.clone());
            doc = r.document;
        }

        let mut layout = LayoutHints::new();
        layout
            .set_node(section.clone(), Rect::new(0.0, 0.0, 800.0, 300.0))
            .set_zone(section.clone(), "body", Rect::new(0.0, 20.0, 800.0, 260.0));
        for (i, id) in spacers.iter().enumerate() {
            let y = 300.0 + 100.0 * i as f32;
            layout.set_node(id.clone(), Rect::new(0.0, y, 800.0, 100.0));
        }

        Canvas {
            registry,
            doc,
            layout,
            section,
            spacers,
        }
    }

    fn hover(coordinator: &mut DragCoordinator, canvas: &Canvas, x: f32, y: f32) -> Option<DropIndicator> {
        let tree = project(&canvas.doc, &canvas.registry, &UiState::default(), ProjectionMode::Canvas);
        coordinator
            .pointer_moved(&canvas.doc, &canvas.registry, &tree, &canvas.layout, Point::new(x, y))
            .cloned()
    }

    #[test]
    fn test_rejected_zone_shows_indicator() {
        let canvas = canvas();
        let mut drag = DragCoordinator::new();
        drag.begin(DragSource::Existing(canvas.spacers[0].clone()), Point::new(10.0, 350.0));

        // Spacers are not accepted by the section body
        let indicator = hover(&mut drag, &canvas, 10.0, 100.0).unwrap();
        assert!(matches!(
            indicator,
            DropIndicator::Rejected(MutationError::ZoneRejected { .. })
        ));

        match drag.drop(&canvas.doc) {
            DropIntent::Cancel { reason } => {
                assert!(matches!(reason, Some(MutationError::ZoneRejected { .. })))
            }
            other => panic!("expected cancel, got {other:?}"),
        }
        assert!(!drag.is_active());
    }

    #[test]
    fn test_move_down_adjusts_index() {
        let canvas = canvas();
        let mut drag = DragCoordinator::new();
        drag.begin(DragSource::Existing(canvas.spacers[0].clone()), Point::new(10.0, 350.0));

        // Bottom band of the last spacer: root slot 4
        let indicator = hover(&mut drag, &canvas, 10.0, 590.0).unwrap();
        assert!(indicator.is_allowed());

        assert_eq!(
            drag.drop(&canvas.doc),
            DropIntent::Move {
                node: canvas.spacers[0].clone(),
                parent: None,
                zone: None,
                index: 3,
            }
        );
    }

    #[test]
    fn test_drop_on_own_position_is_noop() {
        let canvas = canvas();
        let mut drag = DragCoordinator::new();
        drag.begin(DragSource::Existing(canvas.spacers[1].clone()), Point::new(10.0, 450.0));

        // Top band of itself
        hover(&mut drag, &canvas, 10.0, 405.0);
        assert_eq!(drag.drop(&canvas.doc), DropIntent::NoOp);
    }

    #[test]
    fn test_palette_drop_into_zone() {
        let canvas = canvas();
        let mut drag = DragCoordinator::new();
        drag.begin(
            DragSource::Palette {
                component_type: "Heading".into(),
                props: Props::new(),
            },
            Point::new(0.0, 0.0),
        );

        assert!(hover(&mut drag, &canvas, 10.0, 100.0).unwrap().is_allowed());
        match drag.drop(&canvas.doc) {
            DropIntent::Insert { target, .. } => {
                assert_eq!(target.parent, Some(canvas.section.clone()));
                assert_eq!(target.zone.as_deref(), Some("body"));
                assert_eq!(target.index, 0);
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn test_drop_outside_keeps_last_rejection() {
        let canvas = canvas();
        let mut drag = DragCoordinator::new();
        drag.begin(DragSource::Existing(canvas.spacers[0].clone()), Point::new(10.0, 350.0));

        hover(&mut drag, &canvas, 10.0, 100.0);
        assert!(hover(&mut drag, &canvas, 5000.0, 5000.0).is_none());
        assert!(matches!(drag.state(), DragState::Dragging { .. }));

        assert!(matches!(
            drag.drop(&canvas.doc),
            DropIntent::Cancel {
                reason: Some(MutationError::ZoneRejected { .. })
            }
        ));
    }

    #[test]
    fn test_cancel_resets() {
        let mut drag = DragCoordinator::new();
        drag.begin(DragSource::Existing(NodeId::from("x")), Point::default());
        assert!(drag.is_active());
        assert_eq!(drag.cancel(), DragOutcome::Cancelled { reason: None });
        assert_eq!(drag.state(), &DragState::Idle);
    }
}
