//! Node editor implementation
//!
//! `NodeEditor` owns the graph exclusively. Pointer handling and the frame
//! tick both run on the UI thread and never interleave, so no locking is
//! needed. Only the audio feed crosses threads, as whole snapshots.

pub mod canvas_rendering;
pub mod interaction;

pub use canvas_rendering::CanvasRenderer;
pub use hit_test::{Hit, SocketHit};
pub use interaction::{InteractionManager, InteractionState, PointerEvent, ReleaseScan};

use eframe::egui;
use egui::{Pos2, Vec2};
use log::{debug, info, trace};

use crate::bridge::{AudioFeed, Bridge, ParameterRegistry};
use crate::config::EditorConfig;
use crate::nodes::{Connection, Evaluator, Exports, NodeFactory, NodeGraph};

/// Main application state for the node editor
pub struct NodeEditor {
    graph: NodeGraph,
    evaluator: Evaluator,
    interaction: InteractionManager,
    renderer: CanvasRenderer,
    bridge: Bridge,
    parameters: ParameterRegistry,
    running: bool,
}

impl NodeEditor {
    /// Editor over the default graph, reading audio from `audio` if given
    pub fn new(config: &EditorConfig, audio: Option<AudioFeed>) -> Self {
        Self::with_graph(config, NodeFactory::default_graph(), audio)
    }

    pub fn with_graph(config: &EditorConfig, graph: NodeGraph, audio: Option<AudioFeed>) -> Self {
        info!(
            "Editor started: {:?} evaluation, {:?} release scan, audio {}",
            config.evaluation_order,
            config.release_scan,
            if audio.is_some() { "attached" } else { "off" }
        );
        Self {
            graph,
            evaluator: Evaluator::new(config.evaluation_order),
            interaction: InteractionManager::new(
                config.socket_detect_radius,
                config.socket_connect_radius,
                config.release_scan,
            ),
            renderer: CanvasRenderer::new(config.grid_spacing),
            bridge: Bridge::new(audio),
            parameters: ParameterRegistry::with_visual_defaults(),
            running: true,
        }
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn parameters(&self) -> &ParameterRegistry {
        &self.parameters
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One frame of dataflow: import audio, evaluate, export parameters.
    /// Does nothing after teardown.
    pub fn tick(&mut self) -> Exports {
        if !self.running {
            return Exports::new();
        }
        let snapshot = self.bridge.import();
        let exports = self.evaluator.evaluate(&mut self.graph, &snapshot);
        let written = self.bridge.export(&exports, &mut self.parameters);
        trace!("Frame exported {} of {} outputs", written, exports.len());
        exports
    }

    /// Applies pointer events in order. Ignored after teardown.
    pub fn handle_pointer(&mut self, events: &[PointerEvent]) -> Vec<Connection> {
        if !self.running {
            return Vec::new();
        }
        events
            .iter()
            .flat_map(|&event| self.interaction.handle(event, &mut self.graph))
            .collect()
    }

    /// Abandons the current drag
    pub fn cancel_interaction(&mut self) {
        if self.running {
            self.interaction.cancel();
        }
    }

    /// Stops the frame loop and detaches the audio feed. Safe to call again.
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.interaction.cancel();
        self.bridge.detach();
        debug!("Editor torn down after {} frames", self.evaluator.stats().passes);
    }
}

/// Pointer events of this frame, in canvas coordinates
fn pointer_events(input: &egui::InputState, origin: Vec2) -> Vec<PointerEvent> {
    let to_canvas = |pos: Pos2| pos - origin;
    input
        .events
        .iter()
        .filter_map(|event| match event {
            egui::Event::PointerMoved(pos) => Some(PointerEvent::Move(to_canvas(*pos))),
            egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed,
                ..
            } => Some(if *pressed {
                PointerEvent::Down(to_canvas(*pos))
            } else {
                PointerEvent::Up(to_canvas(*pos))
            }),
            _ => None,
        })
        .collect()
}

impl eframe::App for NodeEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.running {
            return;
        }
        self.tick();

        egui::CentralPanel::default()
            .frame(egui::Frame::default())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                let origin = response.rect.min.to_vec2();

                let (events, escape) =
                    ui.input(|i| (pointer_events(i, origin), i.key_pressed(egui::Key::Escape)));
                if escape {
                    self.cancel_interaction();
                }
                self.handle_pointer(&events);

                self.renderer.render(
                    &painter,
                    response.rect,
                    &self.graph,
                    self.interaction.hovered(),
                    self.interaction.drag_line(&self.graph),
                );
            });

        // Continuous frame loop
        ctx.request_repaint();
    }
}

impl Drop for NodeEditor {
    fn drop(&mut self) {
        self.teardown();
    }
}
