use logbrain::config::default_common_variables;
use logbrain::preprocess::Preprocessor;
use logbrain::types::LogMessage;

fn token_values(log: &LogMessage) -> Vec<&str> {
    log.words.iter().map(|w| w.value.as_str()).collect()
}

#[test]
fn splits_counts_and_masks_in_one_pass() {
    let pre = Preprocessor::new(r"[\s,:]+", &[]).unwrap();
    let logs = pre.preprocess_logs(&["Log 1: value1, value2", "Log 2: value1, value3"]);

    assert_eq!(logs.len(), 2);
    assert_eq!(token_values(&logs[0]), vec!["Log", "<*>", "value1", "value2"]);
    assert_eq!(token_values(&logs[1]), vec!["Log", "<*>", "value1", "value3"]);

    // Positions are dense and ids follow input order.
    assert_eq!(logs[1].id, 1);
    let positions: Vec<usize> = logs[0].words.iter().map(|w| w.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);

    // Frequencies count the pre-masking surface forms: "1" and "2" were
    // masked but keep their own counts, value1 is shared.
    let frequencies: Vec<usize> = logs[0].words.iter().map(|w| w.frequency).collect();
    assert_eq!(frequencies, vec![2, 1, 2, 1]);
}

#[test]
fn masked_tokens_share_surface_form_frequency() {
    let pre = Preprocessor::new(r"\s+", &[]).unwrap();
    let logs = pre.preprocess_logs(&["login user123 ok", "logout user123 ok"]);

    for log in &logs {
        assert_eq!(log.words[1].value.as_str(), "<*>");
        assert_eq!(log.words[1].frequency, 2);
    }
}

#[test]
fn numeric_heavy_tokens_become_wildcards() {
    let pre = Preprocessor::new(r"\s+", &[]).unwrap();
    let logs = pre.preprocess_logs(&[
        "User user123 logged in from 192.168.1.100",
        "Error code ERR_404 occurred",
        "Processing batch job_456789 with id ABC123DEF",
    ]);

    assert_eq!(
        token_values(&logs[0]),
        vec!["User", "<*>", "logged", "in", "from", "<*>"]
    );
    assert_eq!(token_values(&logs[1]), vec!["Error", "code", "<*>", "occurred"]);
    assert_eq!(
        token_values(&logs[2]),
        vec!["Processing", "batch", "<*>", "with", "id", "<*>"]
    );
}

#[test]
fn datetimes_survive_tokenization_as_single_tokens() {
    let pre = Preprocessor::new(r"[\s:]+", &[]).unwrap();

    let logs = pre.preprocess_logs(&[
        "2023-01-15 14:30:45.123 INFO: Application started",
        "[15-Jan-2023 14:30:45] User logged in",
        "Jan 15 14:30:45 server1: Service started",
        "15/01/2023 14:30:45 Process completed",
    ]);

    assert_eq!(token_values(&logs[0]), vec!["<*>", "INFO", "Application", "started"]);
    assert_eq!(token_values(&logs[1]), vec!["<*>", "User", "logged", "in"]);
    assert_eq!(token_values(&logs[2]), vec!["<*>", "server1", "Service", "started"]);
    assert_eq!(token_values(&logs[3]), vec!["<*>", "Process", "completed"]);
}

#[test]
fn builtin_patterns_mask_common_variable_shapes() {
    let pre = Preprocessor::new(r"\s+", &default_common_variables()).unwrap();

    let logs = pre.preprocess_logs(&[
        "Request f47ac10b-58cc-4372-a567-0e02b2c3d479 completed",
        "Connection from 192.168.1.100 accepted",
        "GET https://api.example.com/v1/users returned 200",
        "Proxy proxy.example.com:8080 reachable",
        "Wrote block blk_-1608999687 at /var/data/node1",
    ]);

    assert_eq!(token_values(&logs[0]), vec!["Request", "<*>", "completed"]);
    assert_eq!(token_values(&logs[1]), vec!["Connection", "from", "<*>", "accepted"]);
    assert_eq!(token_values(&logs[2]), vec!["GET", "<*>", "returned", "<*>"]);
    assert_eq!(token_values(&logs[3]), vec!["Proxy", "<*>", "reachable"]);
    assert_eq!(token_values(&logs[4]), vec!["Wrote", "block", "<*>", "at", "<*>"]);
}

#[test]
fn invalid_patterns_fail_at_construction() {
    assert!(Preprocessor::new(r"[unclosed", &[]).is_err());
    assert!(Preprocessor::new(r"\s+", &[("bad".to_string(), "(".to_string())]).is_err());
}
