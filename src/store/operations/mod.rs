pub mod attempts;
pub mod classes;
pub mod game_states;
pub mod progress;
pub mod quizzes;
pub mod sessions;
pub mod users;
