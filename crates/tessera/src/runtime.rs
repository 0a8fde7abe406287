//! The single-threaded cooperative loop described by the crate: feed bytes
//! and signals in, get one paced render out. Everything between those two
//! ends — decode, enqueue, dispatch, focus, layout, paint, diff, swap —
//! happens inside one [`Runtime::tick`] call with no parallel mutation of
//! shared state.

use std::io::Write;

use tessera_cell::ScreenBuffer;
use tessera_color::Encoder;
use tessera_config::Config;
use tessera_events::{Dispatcher, Event, EventKind, EventQueue, KeyCode, NamedKey, OverflowPolicy};
use tessera_input::Decoder;
use tessera_keymap::{KeyBindings, KeyChord};
use tessera_layout::{Calculator, Rect};
use tessera_render::{RenderOutcome, Renderer};
use tessera_signal::SignalHandler;
use tessera_terminal::BufferedWriter;
use tessera_widget::{paint_widget, FocusManager, RenderContext, Widget, WidgetId};
use tracing::trace;

fn queue_policy(config: &tessera_config::EventQueueConfig) -> OverflowPolicy {
    if config.drop_low_priority_on_overflow {
        OverflowPolicy::DropOldestLowerPriority
    } else {
        OverflowPolicy::RejectNew
    }
}

/// What happened during one [`Runtime::tick`] call, for a host loop to act
/// on (most importantly, `exit_requested`).
pub struct TickOutcome {
    pub events_processed: usize,
    pub exit_requested: bool,
    pub render: RenderOutcome,
}

/// Owns every component needed to turn terminal bytes into painted frames:
/// the decoder, the event queue/dispatcher, key bindings, the signal
/// handler, a flat widget list with its focus chain, and the renderer.
///
/// Widgets are registered as siblings rather than a tree: each widget's
/// `LayoutNode` is laid out against the full viewport independently. A
/// widget that needs internal composition nests its own children under its
/// own `LayoutNode` and lays them out itself during `paint`.
pub struct Runtime<W: Write> {
    width: u16,
    height: u16,
    decoder: Decoder,
    queue: EventQueue,
    dispatcher: Dispatcher,
    key_bindings: KeyBindings,
    signal_handler: SignalHandler,
    focus: FocusManager,
    calculator: Calculator,
    renderer: Renderer<W>,
    widgets: Vec<Box<dyn Widget>>,
    /// Persists across ticks so a widget that wasn't invalidated this frame
    /// keeps whatever it painted last time instead of going blank.
    canvas: ScreenBuffer,
}

impl<W: Write> Runtime<W> {
    pub fn new(width: u16, height: u16, mut config: Config, writer: BufferedWriter<W>) -> Self {
        config.recompute_with_context();
        let encoder = Encoder::from_env();
        let policy = queue_policy(&config.event_queue);
        Self {
            width,
            height,
            decoder: Decoder::new(config.input),
            queue: EventQueue::new(config.event_queue.max_size, policy),
            dispatcher: Dispatcher::new(),
            key_bindings: KeyBindings::new(config.key_bindings),
            signal_handler: SignalHandler::new(config.signal_handler),
            focus: FocusManager::new(),
            calculator: Calculator::default(),
            renderer: Renderer::new(width, height, config.renderer, encoder, writer),
            widgets: Vec::new(),
            canvas: ScreenBuffer::new(width, height),
        }
    }

    /// Arm the configured subset of OS signal handlers. Idempotent.
    pub fn start_signals(&mut self) -> std::io::Result<()> {
        self.signal_handler.start()
    }

    /// Register `widget` as a top-level sibling, wiring it into the focus
    /// chain if it reports itself focusable. Returns its id for later
    /// lookup (e.g. `KeyBindings` callbacks that target it by id).
    pub fn register_widget(&mut self, mut widget: Box<dyn Widget>) -> WidgetId {
        let id = widget.id();
        if widget.is_focusable() {
            self.focus.register(id, widget.tab_index());
        }
        widget.mount();
        self.widgets.push(widget);
        id
    }

    pub fn key_bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.key_bindings
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Decode freshly-read bytes and enqueue whatever events fall out.
    /// Returns how many were accepted (post overflow policy).
    pub fn feed_bytes(&mut self, bytes: &[u8], now_ms: u64) -> usize {
        let decoded = self.decoder.feed(bytes, now_ms);
        self.queue.batch_enqueue(decoded)
    }

    /// Run one full tick: flush a stalled escape sequence, poll signals,
    /// drain and dispatch the queue, re-layout and paint dirty widgets, and
    /// submit at most one frame to the renderer.
    pub async fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut exit_requested = false;

        let timed_out = self.decoder.poll_timeout(now_ms);
        self.queue.batch_enqueue(timed_out);

        let signal_poll = self.signal_handler.poll(now_ms);
        exit_requested |= signal_poll.exit_requested;
        self.queue.batch_enqueue(signal_poll.events);

        let mut events_processed = 0;
        while let Some(mut event) = self.queue.dequeue() {
            events_processed += 1;
            self.apply_resize_if_any(&event);
            self.handle_focus_navigation(&mut event, now_ms);
            self.route_event(&mut event, now_ms);
        }

        self.paint_frame();
        let render = self.renderer.render(Some(self.canvas.clone())).await;

        TickOutcome {
            events_processed,
            exit_requested,
            render,
        }
    }

    /// Flush pending frames and restore the cursor. `SignalHandler::stop`
    /// runs via `Drop` as the rest of `self` goes out of scope afterward.
    pub async fn shutdown(self) -> tessera_render::RenderMetricsSnapshot {
        self.renderer.destroy().await
    }

    fn apply_resize_if_any(&mut self, event: &Event) {
        if let EventKind::Resize(resize) = &event.kind {
            self.width = resize.columns;
            self.height = resize.rows;
            self.renderer.resize(resize.columns, resize.rows);
            self.canvas.resize(resize.columns, resize.rows);
            self.calculator.invalidate_all();
            for widget in &mut self.widgets {
                widget.invalidate();
            }
        }
    }

    fn handle_focus_navigation(&mut self, event: &mut Event, now_ms: u64) {
        let EventKind::Key(key) = &event.kind else {
            return;
        };
        if key.key != KeyCode::Named(NamedKey::Tab) {
            return;
        }
        let transitions = if key.shift {
            self.focus.focus_prev(now_ms)
        } else {
            self.focus.focus_next(now_ms)
        };
        if !transitions.is_empty() {
            event.stop_propagation();
            self.queue.batch_enqueue(transitions);
        }
    }

    /// Route one event: key bindings get first refusal on `Key` events,
    /// then the dispatcher's registered handlers (targeting the focused
    /// widget), then the focused widget's own `handle_event` as a fallback
    /// a widget with no externally-registered handler still relies on.
    fn route_event(&mut self, event: &mut Event, now_ms: u64) {
        if event.propagation_stopped {
            return;
        }
        if let EventKind::Key(key) = &event.kind {
            let chord = KeyChord {
                key: key.key,
                ctrl: key.ctrl,
                alt: key.alt,
                shift: key.shift,
            };
            if self.key_bindings.handle_key(chord, event, now_ms) {
                return;
            }
        }

        let Some(focused) = self.focus.current() else {
            return;
        };
        let tag = event.kind.type_tag();
        self.dispatcher.dispatch(tag, &[focused.0], event);
        if event.propagation_stopped {
            return;
        }
        if let Some(widget) = self.widgets.iter_mut().find(|w| w.id() == focused) {
            if widget.handle_event(event) {
                event.stop_propagation();
                widget.invalidate();
            }
        }
    }

    /// Lay out and paint every invalid widget into the persistent canvas.
    /// Widgets that aren't dirty keep whatever they last painted there.
    fn paint_frame(&mut self) {
        let viewport = Rect::new(0, 0, self.width, self.height);
        for widget in &mut self.widgets {
            if !widget.is_invalid() {
                continue;
            }
            self.calculator.compute(widget.layout_node_mut(), viewport);
            let bounds = widget.layout_node().computed;
            let mut ctx = RenderContext::new(&mut self.canvas, bounds);
            paint_widget(widget.as_mut(), &mut ctx);
            widget.clear_invalid();
            trace!(widget_id = widget.id().0, "widget painted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_layout::{LayoutNode, Style};
    use tessera_widget::WidgetState;

    struct Label {
        state: WidgetState,
        text: &'static str,
    }

    impl Label {
        fn new(text: &'static str) -> Self {
            Self {
                state: WidgetState::new(LayoutNode::new(Style::default())),
                text,
            }
        }
    }

    impl Widget for Label {
        fn id(&self) -> WidgetId {
            self.state.id
        }
        fn layout_node(&self) -> &LayoutNode {
            &self.state.node
        }
        fn layout_node_mut(&mut self) -> &mut LayoutNode {
            &mut self.state.node
        }
        fn paint(&mut self, ctx: &mut RenderContext<'_>) {
            ctx.draw_text(0, 0, self.text, tessera_color::Color::Default, tessera_color::Color::Default, tessera_cell::CellAttrs::empty());
        }
        fn handle_event(&mut self, _event: &mut Event) -> bool {
            false
        }
        fn is_focusable(&self) -> bool {
            true
        }
        fn is_invalid(&self) -> bool {
            self.state.is_invalid()
        }
        fn invalidate(&mut self) {
            self.state.invalidate();
        }
        fn clear_invalid(&mut self) {
            self.state.clear_invalid();
        }
    }

    fn test_runtime() -> Runtime<Vec<u8>> {
        let config = Config::default();
        let writer = BufferedWriter::new(Vec::new(), &config.output);
        Runtime::new(10, 3, config, writer)
    }

    #[tokio::test]
    async fn first_tick_paints_every_registered_widget() {
        let mut runtime = test_runtime();
        runtime.register_widget(Box::new(Label::new("hi")));
        let outcome = runtime.tick(0).await;
        assert!(matches!(outcome.render, RenderOutcome::Painted(_)));
        assert!(!outcome.exit_requested);
    }

    #[tokio::test]
    async fn tab_key_advances_focus_between_widgets() {
        let mut runtime = test_runtime();
        let a = runtime.register_widget(Box::new(Label::new("a")));
        let _b = runtime.register_widget(Box::new(Label::new("b")));
        assert_eq!(runtime.focus.current(), None);

        let tab = Event::new(
            EventKind::Key(tessera_events::KeyData {
                key: KeyCode::Named(NamedKey::Tab),
                raw: vec![b'\t'],
                ctrl: false,
                alt: false,
                shift: false,
                code: 9,
            }),
            tessera_events::Priority::Normal,
            0,
        );
        runtime.queue.enqueue(tab);
        runtime.tick(1).await;
        assert_eq!(runtime.focus.current(), Some(a));
    }

    #[tokio::test]
    async fn resize_event_updates_dimensions_and_invalidates_widgets() {
        let mut runtime = test_runtime();
        runtime.register_widget(Box::new(Label::new("a")));
        runtime.tick(0).await;

        let resize = Event::new(
            EventKind::Resize(tessera_events::ResizeData {
                columns: 20,
                rows: 6,
                prev_columns: 10,
                prev_rows: 3,
            }),
            tessera_events::Priority::High,
            1,
        );
        runtime.queue.enqueue(resize);
        runtime.tick(2).await;
        assert_eq!(runtime.width, 20);
        assert_eq!(runtime.height, 6);
    }
}
