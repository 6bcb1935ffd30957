/// 连续登录失败达到此次数后锁定账户
pub const MAX_FAILED_LOGIN_ATTEMPTS: u32 = 5;

/// 账户锁定时长（分钟）
pub const LOCKOUT_DURATION_MINUTES: i64 = 15;

/// 每用户最大并发会话数
pub const MAX_SESSIONS_PER_USER: usize = 10;

/// 每周课次数
pub const LESSONS_PER_WEEK: usize = 12;

/// 每节课训练题目数
pub const ITEMS_PER_LESSON: usize = 7;

/// 感统训练方案课次数
pub const ACTION_PLAN_LESSONS: usize = 12;

/// 感统训练每节课动作数
pub const ACTIONS_PER_LESSON: usize = 3;

/// 训练方案最大周数
pub const MAX_PLAN_WEEKS: usize = 8;

/// 列表接口默认分页大小
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// 列表接口最大分页大小
pub const MAX_PAGE_SIZE: u64 = 100;

/// 测评可接受的最小年龄
pub const MIN_ASSESSMENT_AGE: u32 = 3;

/// 测评可接受的最大年龄
pub const MAX_ASSESSMENT_AGE: u32 = 16;
