//! The adaptive assessment core: attempt lifecycle, question selection,
//! mastery tracking and the reward engine. Everything in here is pure logic
//! over the store's record types; persistence and locking live with the
//! callers in `routes`.

pub mod attempt;
pub mod mastery;
pub mod reward;
pub mod selector;
