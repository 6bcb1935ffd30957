pub fn user_key(user_id: &str) -> String {
    user_id.to_string()
}

pub fn user_username_index_key(username: &str) -> String {
    format!("username:{}", username.to_lowercase())
}

pub fn session_key(token_hash: &str) -> String {
    token_hash.to_string()
}

pub fn session_user_index_key(user_id: &str, token_hash: &str) -> String {
    format!("user:{}:{}", user_id, token_hash)
}

pub fn session_user_index_prefix(user_id: &str) -> String {
    format!("user:{}:", user_id)
}

pub fn profile_key(profile_id: &str) -> String {
    profile_id.to_string()
}

pub fn plan_key(plan_id: &str) -> String {
    plan_id.to_string()
}

pub fn action_key(action_id: &str) -> String {
    action_id.to_string()
}

pub fn tag_key(name: &str) -> String {
    name.to_string()
}

pub fn permission_log_key(timestamp_ms: i64, log_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{:020}:{}", reverse_ts, log_id)
}
