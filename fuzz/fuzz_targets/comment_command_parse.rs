#![no_main]

use comment_ops_commands::{
    evaluate_command_policy, extract_comma_separated, extract_users_and_teams, none_match,
    recognize_commands, PolicyConfig, COMMAND_REGISTRY,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    let matches = recognize_commands(&body);
    assert_eq!(matches.len(), COMMAND_REGISTRY.len());
    assert_eq!(none_match(&matches), matches.iter().all(Option::is_none));

    let defaults = PolicyConfig::default();
    for (kind, matched) in COMMAND_REGISTRY.iter().zip(&matches) {
        let Some(matched) = matched else {
            continue;
        };
        assert_eq!(matched.kind, *kind);
        let enablement = evaluate_command_policy(
            &defaults,
            matched.kind,
            matched.arguments.requested_labels(),
        );
        assert!(enablement.enabled);
    }

    for label in extract_comma_separated(&body) {
        assert!(!label.is_empty());
        assert!(!label.contains(',') && !label.chars().any(char::is_whitespace));
    }
    let reviewers = extract_users_and_teams(&body);
    assert!(reviewers.teams.iter().all(|team| team.contains('/')));
    assert!(reviewers.users.iter().all(|user| !user.contains('/')));
});
