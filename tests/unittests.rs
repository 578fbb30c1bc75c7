use egui::{Key, Modifiers, Pos2, Rect, Vec2, pos2, vec2};

use node_loom::actions::ActionKind;
use node_loom::actions::create_item::Stage;
use node_loom::editor::state::SaveReason;
use node_loom::graph_utils::objects::{DrawFlags, PinKind};
use node_loom::persistence::settings::{BoxSelectMode, CreateReleasePolicy};
use node_loom::{CreateItem, EditorConfig, EditorContext, InputState, ItemQuery, LinkId, MouseButton, NodeId, PinId};

const N1: NodeId = NodeId(1);
const N2: NodeId = NodeId(2);
const P1: PinId = PinId(11);
const P2: PinId = PinId(21);
const G: NodeId = NodeId(5);
const L: LinkId = LinkId(100);

// Pin centers in canvas space, which is also screen space with the default view
const P1_CENTER: Pos2 = pos2(195.0, 125.0);
const P2_CENTER: Pos2 = pos2(405.0, 125.0);
const N1_BODY: Pos2 = pos2(130.0, 130.0);

struct HostNode {
    id: NodeId,
    position: Pos2,
    pins: Vec<(PinId, PinKind)>,
    group: Option<Vec2>,
}

#[derive(Default)]
struct Model {
    nodes: Vec<HostNode>,
    links: Vec<(LinkId, PinId, PinId)>,
}

impl Model {
    fn two_nodes() -> Self {
        Self {
            nodes: vec![
                HostNode { id: N1, position: pos2(100.0, 100.0), pins: vec![(P1, PinKind::Output)], group: None },
                HostNode { id: N2, position: pos2(400.0, 100.0), pins: vec![(P2, PinKind::Input)], group: None },
            ],
            links: Vec::new(),
        }
    }

    fn with_link(mut self) -> Self {
        self.links.push((L, P1, P2));
        self
    }

    fn with_group(mut self) -> Self {
        self.nodes.insert(0, HostNode { id: G, position: pos2(600.0, 300.0), pins: vec![], group: Some(vec2(200.0, 150.0)) });
        self
    }

    fn remove_node(&mut self, id: NodeId) {
        self.nodes.retain(|n| n.id != id);
    }

    fn remove_link(&mut self, id: LinkId) {
        self.links.retain(|l| l.0 != id);
    }
}

fn declare(ctx: &mut EditorContext, model: &Model) {
    for node in &model.nodes {
        if ctx.node_position(node.id).is_none() {
            ctx.set_node_position(node.id, node.position);
        }
        ctx.begin_node(node.id);
        if let Some(size) = node.group {
            ctx.group(size);
            ctx.end_node(vec2(0.0, 24.0));
            continue;
        }
        let origin = ctx.node_position(node.id).expect("declared node has a position").to_vec2();
        for &(pin, kind) in &node.pins {
            let local = match kind {
                PinKind::Output => Rect::from_min_size(pos2(90.0, 20.0), vec2(10.0, 10.0)),
                PinKind::Input => Rect::from_min_size(pos2(0.0, 20.0), vec2(10.0, 10.0)),
            };
            ctx.begin_pin(pin, kind);
            ctx.pin_rect(local.translate(origin));
            ctx.end_pin();
        }
        ctx.end_node(vec2(100.0, 50.0));
    }
    for &(id, start, end) in &model.links {
        ctx.link(id, start, end);
    }
}

/// Scripted host: one call, one frame.
struct Host {
    ctx: EditorContext,
    input: InputState,
    model: Model,
}

impl Host {
    fn new(config: EditorConfig, model: Model) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut host = Self { ctx: EditorContext::new(config), input: InputState::default(), model };
        host.idle();
        host
    }

    fn frame(&mut self, body: impl FnOnce(&mut EditorContext, &mut Model)) {
        self.input.time += 1.0 / 60.0;
        self.ctx.begin(&self.input);
        declare(&mut self.ctx, &self.model);
        body(&mut self.ctx, &mut self.model);
        self.ctx.end();
        assert!(self.ctx.running_action_count() <= 1, "more than one action running");
        self.input.keys_pressed.clear();
        self.input.scroll_delta = 0.0;
        self.input.double_clicked = [false; 3];
    }

    fn idle(&mut self) { self.frame(|_, _| {}); }

    fn pointer_with(
        &mut self,
        pos: Pos2,
        button: MouseButton,
        down: bool,
        body: impl FnOnce(&mut EditorContext, &mut Model),
    ) {
        self.input.pointer_pos = Some(pos);
        self.input.set_down(button, down);
        self.frame(body);
    }

    fn press(&mut self, pos: Pos2) { self.pointer_with(pos, MouseButton::Primary, true, |_, _| {}); }
    fn drag_to(&mut self, pos: Pos2) { self.pointer_with(pos, MouseButton::Primary, true, |_, _| {}); }
    fn release(&mut self, pos: Pos2) { self.pointer_with(pos, MouseButton::Primary, false, |_, _| {}); }

    fn click(&mut self, pos: Pos2, button: MouseButton) {
        self.pointer_with(pos, button, true, |_, _| {});
        self.pointer_with(pos, button, false, |_, _| {});
    }

    fn keys(&mut self, modifiers: Modifiers, keys: &[Key]) {
        self.input.modifiers = modifiers;
        self.input.keys_pressed = keys.to_vec();
        self.idle();
        self.input.modifiers = Modifiers::NONE;
    }
}

fn config() -> EditorConfig {
    EditorConfig { snap_to_grid: false, ..Default::default() }
}

fn host() -> Host { Host::new(config(), Model::two_nodes()) }

// Answers every delete candidate with `deps`, returning what the host removed.
fn accept_deletions(ctx: &mut EditorContext, model: &mut Model, deps: bool) -> (Vec<NodeId>, Vec<LinkId>) {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    assert!(ctx.begin_delete());
    while let Some(id) = ctx.query_deleted_node() {
        if ctx.accept_deleted_item(deps) {
            model.remove_node(id);
            nodes.push(id);
        }
    }
    while let Some((id, _, _)) = ctx.query_deleted_link() {
        if ctx.accept_deleted_item(deps) {
            model.remove_link(id);
            links.push(id);
        }
    }
    ctx.end_delete();
    (nodes, links)
}

#[test]
fn link_from_p1_to_p2_round_trip() {
    let mut host = host();
    host.press(P1_CENTER);
    host.drag_to(pos2(300.0, 125.0));
    assert_eq!(host.ctx.current_action(), Some(ActionKind::CreateItem));
    assert_eq!(host.ctx.create_stage(), Stage::Possible);
    host.drag_to(P2_CENTER);

    host.pointer_with(P2_CENTER, MouseButton::Primary, false, |ctx, _| {
        assert!(ctx.begin_create());
        assert!(matches!(ctx.query_new_link(), ItemQuery::True((_, start, end)) if start == P1 && end == P2));
        // While dragging an accept is only a vote
        assert_eq!(ctx.accept_new_item(), ItemQuery::Indeterminate);
        ctx.end_create();
    });
    assert_eq!(host.ctx.create_stage(), Stage::Create);

    let mut created = None;
    host.frame(|ctx, model| {
        assert!(ctx.begin_create());
        if let ItemQuery::True((id, start, end)) = ctx.query_new_link()
            && let ItemQuery::True(item) = ctx.accept_new_item()
        {
            model.links.push((id, start, end));
            created = Some(item);
            assert_eq!(ctx.accept_new_item(), ItemQuery::Indeterminate);
            assert_eq!(ctx.query_new_link(), ItemQuery::False);
        }
        ctx.end_create();
    });
    let Some(CreateItem::Link { id, start, end }) = created else { panic!("link was not created: {created:?}") };
    assert_eq!((start, end), (P1, P2));
    assert_eq!(host.ctx.create_stage(), Stage::None);
    assert_eq!(host.ctx.take_created_items(), vec![CreateItem::Link { id, start, end }]);

    host.idle();
    assert!(host.ctx.has_any_links_pin(P2));
    assert!(host.ctx.has_any_links_node(N1));

    assert_eq!(host.ctx.break_links_node(N1), 1);
    assert!(!host.ctx.has_any_links_pin(P2));

    // The host still declares the link until it hears about the removal
    host.idle();
    assert!(host.ctx.graph().get_link(id).is_none());
    host.frame(|ctx, model| {
        let (nodes, links) = accept_deletions(ctx, model, true);
        assert!(nodes.is_empty());
        assert_eq!(links, vec![id]);
    });
    assert!(host.model.links.is_empty());
}

#[test]
fn unanswered_link_commits_itself_under_implicit_release() {
    let mut host = host();
    host.press(P1_CENTER);
    host.drag_to(pos2(300.0, 125.0));
    host.drag_to(P2_CENTER);
    host.release(P2_CENTER);
    assert_eq!(host.ctx.create_stage(), Stage::Create);
    host.idle();

    let items = host.ctx.take_created_items();
    assert_eq!(items.len(), 1);
    let CreateItem::Link { id, start, end } = items[0] else { panic!("expected a link, got {:?}", items[0]) };
    assert_eq!((start, end), (P1, P2));
    assert!(host.ctx.graph().get_link(id).is_some());
}

#[test]
fn explicit_release_discards_unaccepted_proposals() {
    let config = EditorConfig { create_release_policy: CreateReleasePolicy::Explicit, ..config() };
    let mut host = Host::new(config, Model::two_nodes());
    host.press(P1_CENTER);
    host.drag_to(pos2(300.0, 125.0));
    host.drag_to(P2_CENTER);
    host.release(P2_CENTER);
    assert_eq!(host.ctx.create_stage(), Stage::None);
    host.idle();
    assert!(host.ctx.take_created_items().is_empty());
    assert_eq!(host.ctx.graph().link_count(), 0);
}

#[test]
fn rejected_proposal_is_dropped_on_release() {
    let mut host = host();
    host.press(P1_CENTER);
    host.drag_to(pos2(300.0, 125.0));
    host.drag_to(P2_CENTER);
    host.pointer_with(P2_CENTER, MouseButton::Primary, false, |ctx, _| {
        assert!(ctx.begin_create());
        assert!(ctx.query_new_link().is_true());
        assert!(ctx.reject_new_item());
        ctx.end_create();
    });
    assert_eq!(host.ctx.create_stage(), Stage::None);
    host.idle();
    assert!(host.ctx.take_created_items().is_empty());
}

#[test]
fn dropping_on_background_proposes_a_node() {
    let mut host = host();
    let drop = pos2(300.0, 300.0);
    host.press(P1_CENTER);
    host.drag_to(drop);
    host.pointer_with(drop, MouseButton::Primary, false, |ctx, _| {
        assert!(ctx.begin_create());
        assert_eq!(ctx.query_new_link(), ItemQuery::Indeterminate);
        ctx.end_create();
    });

    let mut new_node = None;
    host.frame(|ctx, model| {
        assert!(ctx.begin_create());
        if let ItemQuery::True((id, pin, position)) = ctx.query_new_node() {
            assert_eq!(pin, P1);
            assert_eq!(position, drop);
            assert!(ctx.accept_new_item().is_true());
            model.nodes.push(HostNode { id, position, pins: vec![], group: None });
            new_node = Some(id);
        }
        ctx.end_create();
    });
    let id = new_node.expect("node proposal");
    host.idle();
    assert_eq!(host.ctx.node_position(id), Some(drop));
    assert_eq!(host.ctx.node_count(), 3);
}

#[test]
fn deleting_a_node_takes_its_links_along() {
    let mut host = Host::new(config(), Model::two_nodes().with_link());
    assert!(host.ctx.delete_node(N1));
    host.idle();
    assert_eq!(host.ctx.current_action(), Some(ActionKind::DeleteItems));

    host.frame(|ctx, model| {
        let (nodes, links) = accept_deletions(ctx, model, true);
        assert_eq!(nodes, vec![N1]);
        assert_eq!(links, vec![L]);
    });
    host.idle();
    assert!(host.ctx.graph().get_link(L).is_none());
    assert_eq!(host.ctx.node_ids(), vec![N2]);
    assert!(!host.ctx.has_any_links_pin(P2));
}

#[test]
fn deleting_a_node_without_dependencies_orphans_its_links() {
    let mut host = Host::new(config(), Model::two_nodes().with_link());
    host.ctx.delete_node(N1);
    host.idle();
    host.frame(|ctx, model| {
        let (nodes, links) = accept_deletions(ctx, model, false);
        assert_eq!(nodes, vec![N1]);
        assert!(links.is_empty());
    });
    // The host keeps declaring the link; its start pin is gone
    host.idle();
    host.idle();
    assert!(host.ctx.graph().get_link(L).is_some());
    assert!(host.ctx.graph().valid_link(L).is_none());
    assert!(!host.ctx.graph().get_pin(P2).expect("pin").has_connection);
    assert_eq!(host.ctx.link_draw_flags(L), DrawFlags::empty());
}

#[test]
fn rejected_deletion_keeps_the_node() {
    let mut host = host();
    host.ctx.delete_node(N2);
    host.idle();
    host.frame(|ctx, _| {
        assert!(ctx.begin_delete());
        assert_eq!(ctx.query_deleted_node(), Some(N2));
        assert!(ctx.reject_deleted_item());
        assert!(!ctx.accept_deleted_item(true));
        assert_eq!(ctx.query_deleted_node(), None);
        ctx.end_delete();
    });
    host.idle();
    assert_eq!(host.ctx.node_count(), 2);
}

#[test]
fn delete_key_removes_the_selection() {
    let mut host = host();
    host.ctx.select_node(N2, false);
    host.keys(Modifiers::NONE, &[Key::Delete]);
    host.frame(|ctx, model| {
        let (nodes, _) = accept_deletions(ctx, model, true);
        assert_eq!(nodes, vec![N2]);
    });
    assert!(host.ctx.selected_nodes().is_empty());
}

#[test]
fn alt_click_on_a_link_deletes_it() {
    let mut host = Host::new(config(), Model::two_nodes().with_link());
    host.input.modifiers = Modifiers::ALT;
    host.click(pos2(300.0, 125.0), MouseButton::Primary);
    host.input.modifiers = Modifiers::NONE;
    assert_eq!(host.ctx.current_action(), Some(ActionKind::DeleteItems));
    host.frame(|ctx, model| {
        let (_, links) = accept_deletions(ctx, model, true);
        assert_eq!(links, vec![L]);
    });
    assert!(host.ctx.graph().get_link(L).is_none());
}

#[test]
fn box_select_intersects_but_ignores_shared_edges() {
    let mut host = host();
    host.press(pos2(50.0, 60.0));
    host.drag_to(pos2(150.0, 200.0));
    assert!(host.ctx.selection_rect().is_some());
    host.release(pos2(150.0, 200.0));
    assert!(host.ctx.is_node_selected(N1));
    assert!(!host.ctx.is_node_selected(N2));
    assert!(host.ctx.selection_rect().is_none());

    // Touching N1's left edge is not an overlap
    host.press(pos2(50.0, 60.0));
    host.drag_to(pos2(100.0, 200.0));
    host.release(pos2(100.0, 200.0));
    assert!(host.ctx.selected_nodes().is_empty());
}

#[test]
fn box_select_in_containment_mode_needs_the_whole_node() {
    let config = EditorConfig { box_select_mode: BoxSelectMode::Contain, ..config() };
    let mut host = Host::new(config, Model::two_nodes());
    host.press(pos2(50.0, 60.0));
    host.drag_to(pos2(150.0, 200.0));
    host.release(pos2(150.0, 200.0));
    assert!(host.ctx.selected_nodes().is_empty());

    host.press(pos2(50.0, 60.0));
    host.drag_to(pos2(250.0, 200.0));
    host.release(pos2(250.0, 200.0));
    assert_eq!(host.ctx.selected_nodes(), vec![N1]);
}

#[test]
fn selection_change_is_reported_for_one_frame() {
    let mut host = host();
    let _ = host.ctx.take_save_reasons();
    host.click(N1_BODY, MouseButton::Primary);
    assert!(host.ctx.is_node_selected(N1));
    assert!(host.ctx.has_selection_changed());
    assert!(host.ctx.take_save_reasons().contains(SaveReason::SELECTION));
    host.idle();
    assert!(!host.ctx.has_selection_changed());

    // Clicking the background clears it
    host.click(pos2(300.0, 400.0), MouseButton::Primary);
    assert!(host.ctx.selected_nodes().is_empty());
    assert!(host.ctx.has_selection_changed());
}

#[test]
fn dragging_moves_the_node_and_marks_position() {
    let mut host = host();
    let _ = host.ctx.take_save_reasons();
    host.press(N1_BODY);
    host.drag_to(pos2(180.0, 150.0));
    assert_eq!(host.ctx.current_action(), Some(ActionKind::Drag));
    host.release(pos2(180.0, 150.0));
    assert_eq!(host.ctx.node_position(N1), Some(pos2(150.0, 120.0)));
    assert!(host.ctx.is_node_selected(N1));
    assert!(host.ctx.take_save_reasons().contains(SaveReason::POSITION));
    assert!(host.ctx.take_dirty_nodes().contains(&N1));
    assert_eq!(host.ctx.current_action(), None);
}

#[test]
fn dropping_a_node_inside_a_group_joins_it() {
    let mut host = Host::new(config(), Model::two_nodes().with_group());
    host.press(N1_BODY);
    host.drag_to(pos2(680.0, 380.0));
    assert!(host.ctx.node_draw_flags(G).contains(DrawFlags::HIGHLIGHTED));
    host.release(pos2(680.0, 380.0));
    assert_eq!(host.ctx.node_position(N1), Some(pos2(650.0, 350.0)));
    assert_eq!(host.ctx.node_group(N1), Some(G));
    assert_eq!(host.ctx.grouped_nodes(G, false), vec![N1]);

    // Dragging the group by its header carries the member along
    host.press(pos2(700.0, 310.0));
    host.drag_to(pos2(720.0, 330.0));
    host.release(pos2(720.0, 330.0));
    assert_eq!(host.ctx.node_position(G), Some(pos2(620.0, 320.0)));
    assert_eq!(host.ctx.node_position(N1), Some(pos2(670.0, 370.0)));
    assert_eq!(host.ctx.node_group(N1), Some(G));
}

#[test]
fn group_membership_survives_a_deleted_group() {
    let mut host = Host::new(config(), Model::two_nodes().with_group());
    host.press(N1_BODY);
    host.drag_to(pos2(680.0, 380.0));
    host.release(pos2(680.0, 380.0));
    assert_eq!(host.ctx.node_group(N1), Some(G));

    host.ctx.delete_node(G);
    host.idle();
    host.frame(|ctx, model| {
        let (nodes, _) = accept_deletions(ctx, model, true);
        assert_eq!(nodes, vec![G]);
    });
    host.idle();
    assert_eq!(host.ctx.node_group(N1), Some(G));
    assert_eq!(host.ctx.grouped_nodes(G, true), vec![N1]);

    // Moving the node again drops the dangling membership
    host.press(pos2(680.0, 380.0));
    host.drag_to(pos2(690.0, 390.0));
    host.release(pos2(690.0, 390.0));
    assert_eq!(host.ctx.node_group(N1), None);
}

#[test]
fn group_resizes_from_its_corner() {
    let mut host = Host::new(config(), Model::two_nodes().with_group());
    let _ = host.ctx.take_save_reasons();
    host.press(pos2(796.0, 446.0));
    host.drag_to(pos2(846.0, 476.0));
    assert_eq!(host.ctx.current_action(), Some(ActionKind::Size));
    host.release(pos2(846.0, 476.0));
    host.idle();
    assert_eq!(host.ctx.node_position(G), Some(pos2(600.0, 300.0)));
    assert_eq!(host.ctx.node_size(G), Some(vec2(250.0, 180.0)));
    assert!(host.ctx.take_save_reasons().contains(SaveReason::SIZE));

    // Not below the minimum size
    host.press(pos2(846.0, 476.0));
    host.drag_to(pos2(500.0, 200.0));
    host.release(pos2(500.0, 200.0));
    assert_eq!(host.ctx.node_size(G), Some(vec2(64.0, 48.0)));
}

#[test]
fn secondary_click_opens_context_menus() {
    let mut host = host();
    host.click(pos2(500.0, 600.0), MouseButton::Secondary);
    host.frame(|ctx, _| {
        assert!(ctx.show_background_context_menu());
        assert_eq!(ctx.show_node_context_menu(), None);
    });
    host.frame(|ctx, _| assert!(!ctx.show_background_context_menu()));

    host.click(N1_BODY, MouseButton::Secondary);
    host.frame(|ctx, _| assert_eq!(ctx.show_node_context_menu(), Some(N1)));
    // A context click neither selects nor pans
    assert!(host.ctx.selected_nodes().is_empty());
    assert_eq!(host.ctx.origin(), Vec2::ZERO);
}

#[test]
fn copy_shortcut_carries_the_selection() {
    let mut host = host();
    host.ctx.select_node(N1, false);
    host.ctx.select_node(N2, true);
    host.keys(Modifiers::COMMAND, &[Key::C]);
    host.frame(|ctx, _| {
        assert!(ctx.begin_shortcut());
        assert!(ctx.accept_copy());
        assert!(!ctx.accept_paste());
        assert_eq!(ctx.shortcut_context_nodes(), vec![N1, N2]);
        ctx.end_shortcut();
    });
    host.frame(|ctx, _| {
        assert!(!ctx.begin_shortcut());
        ctx.end_shortcut();
    });

    // Nothing to copy without a selection or a hovered object
    host.ctx.clear_selection();
    host.input.pointer_pos = Some(pos2(300.0, 400.0));
    host.keys(Modifiers::COMMAND, &[Key::C]);
    assert_eq!(host.ctx.current_action(), None);

    host.ctx.enable_shortcuts(false);
    host.keys(Modifiers::NONE, &[Key::Space]);
    assert_eq!(host.ctx.current_action(), None);
}

#[test]
fn wheel_zoom_keeps_the_cursor_point() {
    let mut host = host();
    let cursor = pos2(300.0, 300.0);
    host.input.pointer_pos = Some(cursor);
    host.input.scroll_delta = 1.0;
    host.idle();
    assert_eq!(host.ctx.zoom(), 1.25);
    let under_cursor = host.ctx.screen_to_canvas(cursor);
    assert!((under_cursor - cursor).length() < 1e-3, "cursor drifted to {under_cursor:?}");

    host.input.scroll_delta = -1.0;
    host.idle();
    host.input.scroll_delta = -1.0;
    host.idle();
    assert_eq!(host.ctx.zoom(), 0.75);
}

#[test]
fn centering_a_node_moves_the_view() {
    let config = EditorConfig { navigate_duration: 0.0, ..config() };
    let mut host = Host::new(config, Model::two_nodes());
    assert!(host.ctx.center_node_on_screen(N1));
    host.idle();
    let center = host.ctx.canvas_to_screen(pos2(150.0, 125.0));
    assert!((center - pos2(640.0, 360.0)).length() < 1e-3);
}

#[test]
fn node_and_view_state_restore_into_a_new_editor() {
    let mut host = host();
    host.press(N1_BODY);
    host.drag_to(pos2(180.0, 150.0));
    host.release(pos2(180.0, 150.0));
    host.input.pointer_pos = Some(pos2(300.0, 300.0));
    host.input.scroll_delta = 1.0;
    host.idle();

    let nodes = host.ctx.nodes_state();
    let view = host.ctx.view_state();
    let selection = host.ctx.selection_state();

    let mut restored = Host::new(config(), Model::two_nodes());
    assert!(restored.ctx.nodes_state().has_changed(&nodes));
    restored.ctx.apply_nodes_state(&nodes);
    restored.ctx.apply_view_state(&view);
    restored.idle();
    restored.ctx.apply_selection_state(&selection);
    assert_eq!(restored.ctx.node_position(N1), Some(pos2(150.0, 120.0)));
    assert_eq!(restored.ctx.zoom(), 1.25);
    let probe = pos2(300.0, 300.0);
    assert!((restored.ctx.screen_to_canvas(probe) - host.ctx.screen_to_canvas(probe)).length() < 1e-3);
    assert!(!restored.ctx.selection_state().has_changed(&selection));
}

#[test]
fn pins_win_over_their_node_and_drive_creation() {
    let mut host = host();
    host.press(P1_CENTER);
    assert_eq!(host.ctx.hovered_pin(), Some(P1));
    assert_eq!(host.ctx.hovered_node(), None);
    host.drag_to(pos2(250.0, 125.0));
    assert!(host.ctx.pin_draw_flags(P1).contains(DrawFlags::HIGHLIGHTED));
    assert!(host.ctx.create_preview().is_some());

    // Escape abandons the drag
    host.input.keys_pressed = vec![Key::Escape];
    host.drag_to(pos2(260.0, 125.0));
    assert_eq!(host.ctx.create_stage(), Stage::None);
    assert_eq!(host.ctx.current_action(), None);
    host.release(pos2(260.0, 125.0));
    assert!(host.ctx.take_created_items().is_empty());
}

#[test]
fn broken_links_nobody_asks_about_do_not_block_dragging() {
    let mut host = Host::new(config(), Model::two_nodes().with_link());
    assert_eq!(host.ctx.break_links_node(N1), 1);

    // The host never opens a delete session
    host.press(N1_BODY);
    for pos in [pos2(150.0, 140.0), pos2(170.0, 150.0), pos2(180.0, 150.0), pos2(180.0, 150.0)] {
        host.drag_to(pos);
    }
    assert_eq!(host.ctx.current_action(), Some(ActionKind::Drag));
    host.release(pos2(180.0, 150.0));
    assert_eq!(host.ctx.node_position(N1), Some(pos2(150.0, 120.0)));

    host.idle();
    assert_eq!(host.ctx.current_action(), None);
    // Unreported, so the link the host still declares is back
    assert!(host.ctx.has_any_links_pin(P2));
}

#[test]
fn accepting_a_proposal_whose_id_was_taken_creates_nothing() {
    let mut host = host();
    host.press(P1_CENTER);
    host.drag_to(pos2(300.0, 125.0));
    host.drag_to(P2_CENTER);
    host.release(P2_CENTER);

    let mut answer = None;
    host.frame(|ctx, _| {
        assert!(ctx.begin_create());
        if let ItemQuery::True((id, _, _)) = ctx.query_new_link() {
            ctx.link(id, P2, P1);
            answer = Some((id, ctx.accept_new_item()));
        }
        ctx.end_create();
    });
    let (id, answer) = answer.expect("link proposal");
    assert_eq!(answer, ItemQuery::False);
    assert!(host.ctx.take_created_items().is_empty());
    let link = host.ctx.graph().get_link(id).expect("host link");
    assert_eq!((link.start_pin, link.end_pin), (P2, P1));
}

#[test]
fn explicit_release_commits_what_the_host_accepted() {
    let config = EditorConfig { create_release_policy: CreateReleasePolicy::Explicit, ..config() };
    let mut host = Host::new(config, Model::two_nodes());
    host.press(P1_CENTER);
    host.drag_to(pos2(300.0, 125.0));
    host.drag_to(P2_CENTER);

    host.pointer_with(P2_CENTER, MouseButton::Primary, false, |ctx, _| {
        assert!(ctx.begin_create());
        let first = ctx.query_new_link();
        assert!(first.is_true());
        assert_eq!(ctx.query_new_link(), first);
        assert_eq!(ctx.accept_new_item(), ItemQuery::Indeterminate);
        ctx.end_create();
    });
    assert_eq!(host.ctx.create_stage(), Stage::Create);

    let mut created = None;
    host.frame(|ctx, model| {
        assert!(ctx.begin_create());
        let query = ctx.query_new_link();
        assert_eq!(ctx.query_new_link(), query);
        if let ItemQuery::True((id, start, end)) = query
            && let ItemQuery::True(item) = ctx.accept_new_item()
        {
            model.links.push((id, start, end));
            created = Some(item);
        }
        ctx.end_create();
    });
    let item = created.expect("accepted link");
    assert!(matches!(item, CreateItem::Link { start, end, .. } if start == P1 && end == P2));
    assert_eq!(host.ctx.take_created_items(), vec![item]);
    host.idle();
    assert!(host.ctx.has_any_links_pin(P2));
}

#[test]
fn box_select_picks_up_links() {
    let mut host = Host::new(config(), Model::two_nodes().with_link());
    host.press(pos2(280.0, 60.0));
    host.drag_to(pos2(320.0, 200.0));
    host.release(pos2(320.0, 200.0));
    assert_eq!(host.ctx.selected_links(), vec![L]);
    assert!(host.ctx.selected_nodes().is_empty());
}

#[test]
fn pending_press_loses_to_wheel_zoom() {
    let mut host = host();
    let pos = pos2(300.0, 400.0);
    host.press(pos);
    assert_eq!(host.ctx.provisional_action(), Some(ActionKind::Select));

    host.input.scroll_delta = 1.0;
    host.drag_to(pos);
    assert_eq!(host.ctx.zoom(), 1.25);
    assert_eq!(host.ctx.provisional_action(), None);
    assert_eq!(host.ctx.current_action(), None);
    host.release(pos);
}

#[test]
fn dragging_from_a_pin_cuts_into_a_pan() {
    let mut host = host();
    host.pointer_with(pos2(300.0, 400.0), MouseButton::Secondary, true, |_, _| {});
    host.pointer_with(pos2(320.0, 420.0), MouseButton::Secondary, true, |_, _| {});
    assert_eq!(host.ctx.current_action(), Some(ActionKind::Navigate));
    assert_eq!(host.ctx.origin(), vec2(20.0, 20.0));

    let at = host.ctx.canvas_to_screen(P1_CENTER);
    host.pointer_with(at, MouseButton::Primary, true, |_, _| {});
    assert_eq!(host.ctx.current_action(), Some(ActionKind::Navigate));

    host.pointer_with(at + vec2(60.0, 0.0), MouseButton::Primary, true, |_, _| {});
    assert_eq!(host.ctx.current_action(), Some(ActionKind::CreateItem));
    assert_eq!(host.ctx.create_stage(), Stage::Possible);
}
