//! Topic names, topic filters and wildcard matching

use crate::mqtt::{ProtocolError, ProtocolResult};

pub const SINGLE_LEVEL_WILDCARD: char = '+';
pub const MULTI_LEVEL_WILDCARD: char = '#';

const MAX_TOPIC_LEN: usize = u16::MAX as usize;

/// Check a topic name used for publishing
///
/// Must be non-empty and free of wildcards and NUL.
pub fn validate_topic_name(topic: &str) -> ProtocolResult<()> {
    if topic.is_empty()
        || topic.len() > MAX_TOPIC_LEN
        || topic.contains([SINGLE_LEVEL_WILDCARD, MULTI_LEVEL_WILDCARD, '\0'])
    {
        return Err(ProtocolError::InvalidTopicName(topic.to_string()));
    }
    Ok(())
}

/// Check a topic filter used for subscribing
///
/// `#` may only appear as the whole last level, `+` only as a whole level.
pub fn validate_topic_filter(filter: &str) -> ProtocolResult<()> {
    let invalid = || ProtocolError::InvalidTopicFilter(filter.to_string());

    if filter.is_empty() || filter.len() > MAX_TOPIC_LEN || filter.contains('\0') {
        return Err(invalid());
    }

    let mut levels = filter.split('/').peekable();
    while let Some(level) = levels.next() {
        if level.contains(MULTI_LEVEL_WILDCARD) && (level.len() != 1 || levels.peek().is_some()) {
            return Err(invalid());
        }
        if level.contains(SINGLE_LEVEL_WILDCARD) && level.len() != 1 {
            return Err(invalid());
        }
    }
    Ok(())
}

/// Match a topic name against a validated filter
///
/// `+` matches exactly one level, which may be empty. `#` matches the parent
/// level and everything below it. Topics starting with `$` are not matched
/// by filters that start with a wildcard.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    if topic.starts_with('$') && filter.starts_with([SINGLE_LEVEL_WILDCARD, MULTI_LEVEL_WILDCARD])
    {
        return false;
    }

    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
