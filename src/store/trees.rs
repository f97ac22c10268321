pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";
pub const CLASSES: &str = "classes";
pub const CLASS_MEMBERS: &str = "class_members";
pub const QUIZZES: &str = "quizzes";
pub const QUIZ_INDEXES: &str = "quiz_indexes";
pub const ATTEMPTS: &str = "attempts";
pub const ATTEMPTS_BY_USER: &str = "attempts_by_user";
pub const PROGRESS: &str = "progress";
pub const GAME_STATES: &str = "game_states";
pub const META: &str = "meta";
