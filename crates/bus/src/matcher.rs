//! MQTT topic filter matching.

/// Whether `topic` matches the subscription `filter`.
///
/// Standard MQTT rules: levels are `/`-separated, `+` matches exactly
/// one level, and `#` (only meaningful as the last level) matches the
/// remainder including the parent level itself.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(expected), Some(level)) if expected == level => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
