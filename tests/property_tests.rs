use proptest::prelude::*;

use usecase_builder::diagram::DiagramAssembler;
use usecase_builder::extractor::{extract_params, to_pascal_identifier, MAX_INFO_PARAMS};
use usecase_builder::formatter::{StepFormatter, MAX_ACTION_LENGTH, MAX_INFO_LENGTH};
use usecase_builder::model::{Step, UseCase};
use usecase_builder::rules::{ActionLabel, RuleTable};

fn step_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z :'\"_-]{0,60}",
        "\\PC{0,40}",
        Just("사용자가 로그인 페이지에서 인증을 시도한다".to_string()),
        Just("collect telemetry: sensor state vector: extra".to_string()),
    ]
}

fn flow_strategy() -> impl Strategy<Value = Vec<Step>> {
    let names = prop::sample::select(vec!["User", "Gateway", "Backend", "Twin", " Ops "]);
    prop::collection::vec(
        (names.clone(), prop::option::of(names), step_text_strategy(), prop::option::of(step_text_strategy())),
        1..8,
    )
    .prop_map(|steps| {
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (actor, target, action, result))| Step {
                order: i as u32 + 1,
                actor: actor.to_string(),
                target: target.map(str::to_string),
                action,
                result,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn formatted_steps_respect_width_caps(text in step_text_strategy(), order in 1u32..500, is_result in any::<bool>()) {
        let step = StepFormatter::new(RuleTable::builtin()).format(&text, order, is_result, "ServiceContext");

        prop_assert!(step.action.chars().count() <= MAX_ACTION_LENGTH);
        prop_assert!(step.info.chars().count() <= MAX_INFO_LENGTH);
        prop_assert!(!step.info.is_empty());
        prop_assert_eq!(step.order, order);
        prop_assert!(ActionLabel::ALL.iter().any(|label| label.as_str() == step.action));
    }

    #[test]
    fn parameters_are_unique_and_bounded(text in step_text_strategy(), is_result in any::<bool>()) {
        let label = ActionLabel::fallback(is_result);
        let params = extract_params(RuleTable::builtin(), &text, label, is_result);

        prop_assert!(!params.is_empty());
        prop_assert!(params.len() <= MAX_INFO_PARAMS);
        for (i, param) in params.iter().enumerate() {
            prop_assert!(!params[i + 1..].contains(param));
        }
    }

    #[test]
    fn pascal_identifiers_are_ascii_alphanumeric(raw in "\\PC{0,30}") {
        if let Some(id) = to_pascal_identifier(&raw) {
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
            prop_assert!(!id.chars().next().is_some_and(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn diagrams_are_deterministic_and_ordered(flow in flow_strategy()) {
        let use_case = UseCase {
            id: "uc".to_string(),
            title: "Property".to_string(),
            description: String::new(),
            assumptions: Vec::new(),
            actors: Vec::new(),
            flow,
            d2_diagram: String::new(),
            requirements: Vec::new(),
            created_at: chrono::Utc::now(),
        };
        let assembler = DiagramAssembler::new(RuleTable::builtin());

        let first = assembler.render(&use_case);
        prop_assert_eq!(&first, &assembler.render(&use_case));

        let diagram = assembler.assemble(&use_case);
        let orders: Vec<u32> = diagram.messages.iter().map(|m| m.label.order).collect();
        prop_assert!(orders.windows(2).all(|pair| pair[0] <= pair[1]));

        let action_lines = diagram.messages.len()
            - use_case.flow.iter().filter(|s| s.result.as_deref().is_some_and(|r| !r.is_empty())).count();
        prop_assert_eq!(action_lines, use_case.flow.len());
        prop_assert!(diagram.participants.iter().all(|p| p == p.trim() && !p.is_empty()));
    }
}
