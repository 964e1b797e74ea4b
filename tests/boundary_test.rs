use flavor_release::boundary::BoundaryWarning;
use flavor_release::ui;

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_no_new_commits_display() {
    let warning = BoundaryWarning::NoNewCommits {
        base_tag: "1.0.0-stable.20240101_0000".to_string(),
        current_commit_hash: "abc1234def5678".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("No new commits"),
        "Message should contain 'No new commits', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("1.0.0-stable.20240101_0000"),
        "Message should contain the base tag, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("abc1234"),
        "Message should contain shortened commit hash 'abc1234', got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_short_hash_kept() {
    let warning = BoundaryWarning::NoNewCommits {
        base_tag: "1.0.0-stable.20240101_0000".to_string(),
        current_commit_hash: "abc".to_string(),
    };
    assert!(warning.to_string().contains("(current: abc)"));
}

#[test]
fn test_boundary_warning_no_coded_commits_display() {
    let warning = BoundaryWarning::NoCodedCommits {
        base_tag: "1.0.0-stable.20240101_0000".to_string(),
        skipped: 4,
    };

    let display_msg = warning.to_string();
    assert!(display_msg.contains("No coded commits"));
    assert!(display_msg.contains("4 uncoded"));
}

#[test]
fn test_boundary_warning_no_tags_display() {
    let display_msg = BoundaryWarning::NoTags.to_string();
    assert!(
        display_msg.contains("no tags"),
        "Message should mention missing tags, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_unclassified_display() {
    let warning = BoundaryWarning::UnclassifiedCommits { count: 3 };
    assert!(warning.to_string().starts_with("3 commit(s)"));
}

#[test]
fn test_boundary_warning_manifest_left_bumped_display() {
    let warning = BoundaryWarning::ManifestLeftBumped {
        manifest: "app/build.gradle".to_string(),
        version: "1.2.0-canary.20240601_0930".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(display_msg.contains("app/build.gradle"));
    assert!(display_msg.contains("1.2.0-canary.20240601_0930"));
}

#[test]
fn test_boundary_warning_equality() {
    let a = BoundaryWarning::ChannelTagFallback {
        channel: "canary".to_string(),
        fallback: "v0.9.0".to_string(),
    };
    let b = a.clone();
    assert_eq!(a, b);
    assert_ne!(a, BoundaryWarning::NoTags);
}

// ============================================================================
// UI Display Function Tests
// ============================================================================

#[test]
fn test_display_boundary_warning_all_variants() {
    let warnings = vec![
        BoundaryWarning::NoNewCommits {
            base_tag: "1.0.0-stable.20240101_0000".to_string(),
            current_commit_hash: "abc1234".to_string(),
        },
        BoundaryWarning::NoCodedCommits {
            base_tag: "1.0.0-stable.20240101_0000".to_string(),
            skipped: 2,
        },
        BoundaryWarning::ChannelTagFallback {
            channel: "canary".to_string(),
            fallback: "v0.9.0".to_string(),
        },
        BoundaryWarning::NoTags,
        BoundaryWarning::UnclassifiedCommits { count: 1 },
        BoundaryWarning::ManifestLeftBumped {
            manifest: "app/build.gradle".to_string(),
            version: "1.0.0-stable.20240101_0000".to_string(),
        },
    ];

    for warning in &warnings {
        ui::display_boundary_warning(warning);
    }
}
