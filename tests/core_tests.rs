//! Integration tests for configuration wiring
//!
//! Checks that a config file flows into the pieces built from it: session
//! timing, sampling parameters and the challenge policy.

use mimicbot::bot::{triage, Challenge, DeclineReason, SessionTiming, Verdict};
use mimicbot::core::BotConfig;
use mimicbot::engine::SamplingConfig;
use std::time::Duration;

const CONFIG: &str = r#"{
    "token": "lip_integration",
    "abort_time": "45s",
    "terminate_grace": "2m",
    "rate_limiting_delay": "250ms",
    "reconnect_delay": "3s",
    "challenge": {
        "concurrency": 2,
        "variants": ["standard", "chess960"],
        "modes": ["casual"]
    },
    "engine": {
        "top_n": 5,
        "p_threshold": 0.1
    }
}"#;

#[test]
fn test_config_file_drives_session_timing() {
    //! Humantime durations land in the session's deadline and pacing knobs
    let config = BotConfig::from_json_str(CONFIG).unwrap();
    config.validate().unwrap();

    let timing = SessionTiming::from_config(&config);
    assert_eq!(timing.deadlines.abort_after, Duration::from_secs(45));
    assert_eq!(timing.deadlines.terminate_grace, Duration::from_secs(120));
    assert_eq!(timing.rate_limiting_delay, Duration::from_millis(250));
    assert_eq!(timing.reconnect_delay, Duration::from_secs(3));
}

#[test]
fn test_config_file_drives_sampling() {
    //! Engine settings override defaults field by field
    let config = BotConfig::from_json_str(CONFIG).unwrap();

    let sampling = SamplingConfig::from(&config.engine);
    assert_eq!(sampling.top_n, 5);
    assert_eq!(sampling.p_threshold, 0.1);
    assert_eq!(sampling.p_floor, SamplingConfig::default().p_floor);
}

#[test]
fn test_config_file_drives_challenge_policy() {
    //! Partial challenge sections keep defaults for what they leave out
    let config = BotConfig::from_json_str(CONFIG).unwrap();
    let policy = &config.challenge;

    let challenge = Challenge {
        id: "abc".to_string(),
        variant: "chess960".to_string(),
        speed: "rapid".to_string(),
        base: Some(600),
        increment: Some(0),
        rated: false,
        opponent_rating: Some(1800),
        opponent_is_bot: false,
        from_self: false,
    };
    assert_eq!(triage(&challenge, policy, 1), Verdict::Accept);
    assert_eq!(triage(&challenge, policy, 2), Verdict::Decline(DeclineReason::Later));

    let rated = Challenge { rated: true, ..challenge };
    assert_eq!(triage(&rated, policy, 0), Verdict::Decline(DeclineReason::Casual));
}

#[test]
fn test_load_rejects_unusable_file() {
    //! Loading runs validation, so a zero concurrency is refused
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"token": "lip_x", "challenge": {{"concurrency": 0}}}}"#).unwrap();

    let err = BotConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("challenge.concurrency"));
}
