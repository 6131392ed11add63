//! Policies deciding when a team conversation stops on its own.
//!
//! A team always honors its turn cap; a condition can only end a run earlier.
use crate::team::TeamMessage;

/// Decides after every batch of new messages whether the run is over
pub trait TerminationCondition: Send {
    /// Inspect the messages produced since the previous call. Returns the stop
    /// message once the condition is met.
    fn check(&mut self, new_messages: &[TeamMessage]) -> Option<String>;

    /// Forget any state so the condition can be reused for another run
    fn reset(&mut self);

    /// Stop when either condition is met
    fn or<T>(self, other: T) -> OrTermination
    where
        Self: Sized + 'static,
        T: TerminationCondition + 'static,
    {
        OrTermination {
            left: Box::new(self),
            right: Box::new(other),
        }
    }
}

/// Stops once the run holds `max_messages` messages, counting the task
pub struct MaxMessageTermination {
    max_messages: usize,
    count: usize,
}

impl MaxMessageTermination {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            count: 0,
        }
    }
}

impl TerminationCondition for MaxMessageTermination {
    fn check(&mut self, new_messages: &[TeamMessage]) -> Option<String> {
        self.count += new_messages.len();
        (self.count >= self.max_messages).then(|| {
            format!(
                "Maximum number of messages {} reached, current message count: {}",
                self.max_messages, self.count
            )
        })
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Stops when a participant's message mentions the given text
pub struct TextMentionTermination {
    text: String,
}

impl TextMentionTermination {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}

impl TerminationCondition for TextMentionTermination {
    fn check(&mut self, new_messages: &[TeamMessage]) -> Option<String> {
        new_messages
            .iter()
            .filter(|m| m.source != crate::team::TASK_SOURCE)
            .any(|m| m.message.text().contains(&self.text))
            .then(|| format!("Text '{}' mentioned", self.text))
    }

    fn reset(&mut self) {}
}

pub struct OrTermination {
    left: Box<dyn TerminationCondition>,
    right: Box<dyn TerminationCondition>,
}

impl TerminationCondition for OrTermination {
    fn check(&mut self, new_messages: &[TeamMessage]) -> Option<String> {
        // Both sides observe every batch so counters stay accurate
        let left = self.left.check(new_messages);
        let right = self.right.check(new_messages);
        left.or(right)
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
