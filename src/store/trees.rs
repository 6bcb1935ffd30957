pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";
pub const STUDENT_PROFILES: &str = "student_profiles";
pub const TRAINING_PLANS: &str = "training_plans";
pub const ACTION_LIBRARY: &str = "action_library";
pub const TAGS: &str = "tags";
pub const PERMISSION_LOGS: &str = "permission_logs";
pub const CONFIG_VERSIONS: &str = "config_versions";
