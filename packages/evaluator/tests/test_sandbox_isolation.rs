use livecanvas_evaluator::{
    Dispatcher, MessageKind, SandboxHandle, SandboxMessage, Viewport,
};
use serde_json::json;
use tokio_stream::StreamExt;

const CARD: &str = r#"export default function Card({ data }) {
  return (
    <div style={{ width: '300px', height: '200px' }}>
      <p style={{ left: '10px', top: '10px', width: '100px', height: '30px' }}>{data.label}</p>
    </div>
  );
}"#;

#[derive(Default)]
struct HostState {
    selected: Option<String>,
    positions: Vec<(f64, f64)>,
    diagnostics: usize,
}

fn host_dispatcher() -> Dispatcher<HostState> {
    Dispatcher::new()
        .on(MessageKind::ElementSelected, |state: &mut HostState, msg| {
            state.selected = msg.element_id().map(str::to_string);
        })
        .on(MessageKind::ElementMoved, |state: &mut HostState, msg| {
            if let SandboxMessage::ElementMoved { left, top, .. } = msg {
                state.positions.push((*left, *top));
            }
        })
        .on(MessageKind::Diagnostic, |state: &mut HostState, _| {
            state.diagnostics += 1;
        })
}

#[tokio::test]
async fn test_drag_roundtrip_through_dispatcher() {
    let mut sandbox = SandboxHandle::spawn("card", Viewport::default());
    let mut dispatcher = host_dispatcher();
    let mut state = HostState::default();

    sandbox.mount(CARD, &json!({ "label": "Hello" })).await.unwrap();
    sandbox.pointer_down(20.0, 20.0).await.unwrap();
    sandbox.pointer_move(30.0, 40.0).await.unwrap();
    sandbox.pointer_up().await.unwrap();

    for _ in 0..3 {
        let raw = sandbox.recv_raw().await.unwrap();
        dispatcher.dispatch_raw(&mut state, &raw).unwrap();
    }

    assert!(state.selected.as_deref().is_some_and(|id| id.ends_with("-1")));
    assert_eq!(state.positions, vec![(20.0, 30.0)]);
    sandbox.shutdown().await;
}

#[tokio::test]
async fn test_broken_component_reports_diagnostic_and_recovers() {
    let sandbox = SandboxHandle::spawn("card", Viewport::default());
    sandbox
        .mount("export default function Card() { return <div>; }", &json!({}))
        .await
        .unwrap();
    sandbox.mount(CARD, &json!("not an object")).await.unwrap();

    let mut events = sandbox.into_stream();
    let mut dispatcher = host_dispatcher();
    let mut state = HostState::default();

    let first = events.next().await.unwrap();
    dispatcher.dispatch_raw(&mut state, &first).unwrap();
    assert_eq!(state.diagnostics, 1);

    let second: SandboxMessage = serde_json::from_str(&events.next().await.unwrap()).unwrap();
    match second {
        SandboxMessage::Mounted { elements, .. } => {
            // non-object data falls back to field names
            assert_eq!(elements[1].data_binding_key.as_deref(), Some("label"));
        }
        other => panic!("unexpected {:?}", other),
    }
}
