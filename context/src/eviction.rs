use std::collections::VecDeque;
use yc_core::MessageContext;

/// Entries dropped by one [`evict_for`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Evictions {
    pub by_count: usize,
    pub by_tokens: usize
}

impl Evictions {
    pub fn total(&self) -> usize {
        self.by_count + self.by_tokens
    }
}

/// Makes room in `context` for a new entry costing `new_tokens`.
///
/// Two passes, both over entries already present:
/// - drop from the head while `len >= max_messages`
/// - then drop from the head while `sum(tokens) + new_tokens >= max_tokens`
///
/// The caller appends the new entry afterwards; it is never a candidate for
/// eviction, even when it alone exceeds `max_tokens`.
pub fn evict_for(
    context: &mut VecDeque<MessageContext>,
    new_tokens: u32,
    max_messages: usize,
    max_tokens: u32
) -> Evictions {
    let mut evictions = Evictions::default();

    while context.len() >= max_messages {
        if context.pop_front().is_none() {
            break;
        }
        evictions.by_count += 1;
    }

    let mut total: u64 =
        context.iter().map(|m| u64::from(m.tokens)).sum::<u64>() + u64::from(new_tokens);

    while total >= u64::from(max_tokens) {
        let Some(removed) = context.pop_front() else {
            break;
        };
        total -= u64::from(removed.tokens);
        evictions.by_tokens += 1;
    }

    evictions
}
