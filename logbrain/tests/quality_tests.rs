use logbrain::brain::BrainParser;
use logbrain::config::Config;

// High-entropy tokens make enhanced post-processing collapse these lines to
// pure wildcards; the reparse loop must recover them with relaxed settings
// and map the results back to the original log ids.
#[test]
fn low_quality_templates_are_reparsed_with_relaxed_settings() {
    let lines = [
        "status ready",
        "status ready",
        "abcdefghijk lmnopqrstuv",
        "abcdefghijk lmnopqrstuv",
    ];
    let config = Config {
        use_enhanced_post_processing: true,
        ..Config::default()
    };
    let parser = BrainParser::new(config).unwrap();
    let results = parser.parse(&lines);

    assert_eq!(results.len(), 2);

    let ready = results
        .iter()
        .find(|r| r.template == "status ready")
        .expect("plain template kept");
    assert_eq!(ready.count, 2);
    assert_eq!(ready.log_ids, vec![0, 1]);

    // Entropy flags both words at the default threshold and still at the
    // relaxed level-1 threshold; disabling enhanced mode at level 2 finally
    // yields a usable template.
    let recovered = results
        .iter()
        .find(|r| r.template == "abcdefghijk lmnopqrstuv")
        .expect("reparsed template");
    assert_eq!(recovered.count, 2);
    assert_eq!(recovered.log_ids, vec![2, 3]);
}

#[test]
fn reparse_is_skipped_without_enhanced_mode() {
    let lines = ["abcdefghijk lmnopqrstuv", "abcdefghijk lmnopqrstuv"];
    let parser = BrainParser::new(Config::default()).unwrap();
    let results = parser.parse(&lines);

    // Standard post-processing leaves the tokens alone.
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].template, "abcdefghijk lmnopqrstuv");
}

#[test]
fn wildcard_run_limit_of_zero_disables_that_check() {
    // Six collapsed columns in a row would normally trip the run limit and
    // trigger a reparse; with the limit disabled the template sails through
    // as long as the content ratio holds.
    let mut lines = Vec::new();
    for i in 0..4 {
        lines.push(format!(
            "gw route pkt{i} src{i} dst{i} hop{i} ttl{i} seq{i} win{i} accepted ok"
        ));
    }
    let config = Config {
        delimiters: r"\s+".to_string(),
        child_branch_threshold: 2,
        use_enhanced_post_processing: true,
        max_consecutive_wildcards: 0,
        min_content_words_ratio: 0.25,
        ..Config::default()
    };
    let parser = BrainParser::new(config).unwrap();
    let results = parser.parse(&lines);

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].template,
        "gw route <*> <*> <*> <*> <*> <*> <*> accepted ok"
    );
    assert_eq!(results[0].count, 4);
}
