//! Task number allocation semantics.
//!
//! Task numbers are `letter ++ zero-padded 4-digit number` (A0001, A0002,
//! ... A9999, B0000). The counter itself is a single persisted row; this
//! module only defines how a counter value advances and formats. The
//! locking that makes allocation collision-free lives in the database
//! layer.

/// Highest numeric part before the letter rolls over.
pub const MAX_NUMBER: u16 = 9999;

/// State of the task-number counter: the last allocated letter + number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCounter {
    pub letter: char,
    pub number: u16,
}

impl TaskCounter {
    /// The next counter value: increments the number, rolling over to the
    /// next letter code point past 9999.
    pub fn advance(self) -> Self {
        if self.number >= MAX_NUMBER {
            let letter = char::from_u32(self.letter as u32 + 1).unwrap_or(self.letter);
            Self { letter, number: 0 }
        } else {
            Self {
                letter: self.letter,
                number: self.number + 1,
            }
        }
    }

    /// Format as a task number, e.g. `A0042`.
    pub fn task_no(&self) -> String {
        format!("{}{:04}", self.letter, self.number)
    }
}
