//! 测评与排课核心：评级分档、题目索引、按薄弱项加权的课时分配，
//! 以及基于标签匹配的感统动作排课。全部为纯计算，无 I/O、无存储依赖。

pub mod action_match;
pub mod allocator;
pub mod bands;
pub mod item_index;
pub mod rating;
pub mod types;
