pub fn user_key(user_id: &str) -> String {
    user_id.to_string()
}

pub fn user_email_index_key(email: &str) -> String {
    format!("email:{}", email.to_lowercase())
}

pub fn session_key(token_hash: &str) -> String {
    token_hash.to_string()
}

pub fn session_user_index_key(user_id: &str, token_hash: &str) -> String {
    format!("user:{}:{}", user_id, token_hash)
}

/// Class records share a tree with the invite-code index, so records get
/// their own key namespace.
pub const CLASS_KEY_PREFIX: &str = "class:";

pub fn class_key(class_id: &str) -> String {
    format!("{}{}", CLASS_KEY_PREFIX, class_id)
}

pub fn class_code_index_key(invite_code: &str) -> String {
    format!("code:{}", invite_code.to_uppercase())
}

pub fn class_member_key(class_id: &str, user_id: &str) -> String {
    format!("class:{}:{}", class_id, user_id)
}

pub fn class_member_prefix(class_id: &str) -> String {
    format!("class:{}:", class_id)
}

pub fn member_class_index_key(user_id: &str, class_id: &str) -> String {
    format!("user:{}:{}", user_id, class_id)
}

pub fn member_class_prefix(user_id: &str) -> String {
    format!("user:{}:", user_id)
}

pub fn quiz_key(quiz_id: &str) -> String {
    quiz_id.to_string()
}

pub fn quiz_owner_index_key(owner_id: &str, quiz_id: &str) -> String {
    format!("owner:{}:{}", owner_id, quiz_id)
}

pub fn quiz_owner_prefix(owner_id: &str) -> String {
    format!("owner:{}:", owner_id)
}

pub fn quiz_class_index_key(class_id: &str, quiz_id: &str) -> String {
    format!("class:{}:{}", class_id, quiz_id)
}

pub fn quiz_class_prefix(class_id: &str) -> String {
    format!("class:{}:", class_id)
}

pub fn attempt_key(attempt_id: &str) -> String {
    attempt_id.to_string()
}

/// Newest-first per-user listing: reverse timestamp so the natural sled
/// iteration order is descending by start time.
pub fn attempt_user_index_key(user_id: &str, timestamp_ms: i64, attempt_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", user_id, reverse_ts, attempt_id)
}

pub fn attempt_user_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn progress_key(student_id: &str, quiz_id: &str) -> String {
    format!("{}:{}", student_id, quiz_id)
}

pub fn progress_prefix(student_id: &str) -> String {
    format!("{}:", student_id)
}

pub fn game_state_key(user_id: &str) -> String {
    user_id.to_string()
}
