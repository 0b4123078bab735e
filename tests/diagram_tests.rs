use usecase_builder::diagram::{DiagramAssembler, MessageKind, D2_PREAMBLE};
use usecase_builder::model::UseCase;
use usecase_builder::participants::ParticipantSet;
use usecase_builder::rules::RuleTable;

const LOGIN_USE_CASE: &str = r#"{
    "title": "Login",
    "description": "User signs in through the gateway",
    "assumptions": [],
    "actors": [
        {"name": "User", "description": "End user"},
        {"name": "Gateway", "description": "API gateway"}
    ],
    "flow": [
        {"order": 1, "actor": "User", "action": "로그인 요청", "result": "세션 토큰 발급"},
        {"order": 2, "actor": "Gateway", "target": "Backend", "action": "forward the request", "result": null}
    ]
}"#;

fn assembler() -> DiagramAssembler<'static> {
    DiagramAssembler::new(RuleTable::builtin())
}

#[test]
fn test_login_diagram() {
    let use_case = UseCase::from_json(LOGIN_USE_CASE).unwrap();
    let d2 = assembler().render(&use_case);

    let expected = [
        "shape: sequence_diagram",
        r#""User" -> "Gateway": "1. AuthenticateEndpoint:EndpointCredential,SessionToken""#,
        r#""Gateway" -> "User": "1. IssueSessionToken:SessionToken,SessionId""#,
        r#""Gateway" -> "Backend": "2. RouteServiceRequest:ServiceRequest,PolicyRule""#,
    ]
    .join("\n");
    assert_eq!(d2, expected);
}

#[test]
fn test_participants_in_first_seen_order() {
    let use_case = UseCase::from_json(LOGIN_USE_CASE).unwrap();
    let diagram = assembler().assemble(&use_case);

    assert_eq!(diagram.participants, vec!["User", "Gateway", "Backend"]);
    let kinds: Vec<MessageKind> = diagram.messages.iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![MessageKind::Action, MessageKind::Result, MessageKind::Action]);
}

#[test]
fn test_missing_target_resolves_to_first_other_participant() {
    let use_case = UseCase::from_json(
        r#"{"title": "T", "flow": [
            {"order": 1, "actor": "User", "target": "Gateway", "action": "a"},
            {"order": 2, "actor": "Gateway", "target": "Backend", "action": "b"},
            {"order": 3, "actor": "User", "action": "c"}
        ]}"#,
    )
    .unwrap();
    let participants = ParticipantSet::from_flow(&use_case.flow);

    assert_eq!(participants.resolve_target(&use_case.flow[2]), "Gateway");
}

#[test]
fn test_lone_actor_talks_to_itself() {
    let use_case = UseCase::from_json(
        r#"{"title": "Solo", "flow": [{"order": 1, "actor": "Batch", "action": "", "result": ""}]}"#,
    )
    .unwrap();
    let d2 = assembler().render(&use_case);

    assert_eq!(
        d2,
        format!("{}\n{}", D2_PREAMBLE, r#""Batch" -> "Batch": "1. RouteServiceRequest:Solo""#)
    );
}

#[test]
fn test_input_order_is_kept() {
    let use_case = UseCase::from_json(
        r#"{"title": "Reordered", "flow": [
            {"order": 2, "actor": "A", "target": "B", "action": "xyz"},
            {"order": 1, "actor": "B", "target": "A", "action": "xyz"}
        ]}"#,
    )
    .unwrap();
    assert!(use_case.validate().is_ok());

    let diagram = assembler().assemble(&use_case);
    let orders: Vec<u32> = diagram.messages.iter().map(|m| m.label.order).collect();
    assert_eq!(orders, vec![2, 1]);
}

#[test]
fn test_names_are_escaped() {
    let use_case = UseCase::from_json(
        r#"{"title": "Ops", "flow": [
            {"order": 1, "actor": "Ops \"Lead\"", "target": "Back\\end\nNode", "action": "xyz"}
        ]}"#,
    )
    .unwrap();
    let d2 = assembler().render(&use_case);

    assert!(
        d2.ends_with(r#""Ops \"Lead\"" -> "Back\\end Node": "1. RouteServiceRequest:ServiceRequest,PolicyRule""#),
        "{d2}"
    );
}

#[test]
fn test_attach_stores_diagram() {
    let mut use_case = UseCase::from_json(LOGIN_USE_CASE).unwrap();
    assert!(use_case.d2_diagram.is_empty());

    let assembler = assembler();
    assembler.attach(&mut use_case);
    assert_eq!(use_case.d2_diagram, assembler.render(&use_case));

    let json = serde_json::to_value(&use_case).unwrap();
    assert!(json["d2Diagram"].as_str().unwrap().starts_with(D2_PREAMBLE));
}

#[test]
fn test_rendering_is_deterministic() {
    let use_case = UseCase::from_json(LOGIN_USE_CASE).unwrap();
    let first = assembler().render(&use_case);
    for _ in 0..5 {
        assert_eq!(assembler().render(&use_case), first);
    }
}
