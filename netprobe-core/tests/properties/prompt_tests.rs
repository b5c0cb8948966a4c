//! Property tests for prompt-based completion detection

use netprobe_core::PromptMatcher;
use proptest::prelude::*;

// ========== Strategies ==========

fn arb_hostname() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9-]{0,20}"
}

/// Output lines that never contain the prompt marker
fn arb_body() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9 ./:,()-]{0,60}", 0..20)
}

fn arb_command() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("show version".to_string()),
        Just("show interface".to_string()),
        Just("show ip arp Vlan10".to_string()),
        "show [a-z]{2,12}",
    ]
}

// ========== Properties ==========

proptest! {
    #[test]
    fn prop_echo_body_and_prompt_is_complete(
        host in arb_hostname(),
        command in arb_command(),
        body in arb_body(),
        trailing_space in any::<bool>(),
    ) {
        let matcher = PromptMatcher::default();
        let space = if trailing_space { " " } else { "" };
        let output = format!("{command}\n{}\n{host}#{space}", body.join("\n"));
        prop_assert!(matcher.is_complete(&output, &command));
    }

    #[test]
    fn prop_output_without_prompt_is_incomplete(
        command in arb_command(),
        body in arb_body(),
    ) {
        let matcher = PromptMatcher::default();
        let output = format!("{command}\n{}", body.join("\n"));
        prop_assert!(!matcher.is_complete(&output, &command));
    }

    #[test]
    fn prop_prompt_without_echo_is_incomplete(
        host in arb_hostname(),
        body in arb_body(),
    ) {
        // uppercase never appears in generated bodies
        let command = "SHOW RUNNING-CONFIG";
        let output = format!("{}\n{host}#", body.join("\n"));
        prop_assert!(!PromptMatcher::default().is_complete(&output, command));
    }

    #[test]
    fn prop_custom_patterns_never_panic(pattern in ".{0,30}", output in ".{0,80}") {
        if let Ok(matcher) = PromptMatcher::new(&pattern) {
            let _ = matcher.at_prompt(&output);
            prop_assert_eq!(matcher.pattern(), pattern.as_str());
        }
    }
}
