/// 公共验证函数模块
/// 提供密码、用户名、日期等输入验证，供认证、测评相关路由共用。
use chrono::{Datelike, NaiveDate};

/// 验证密码强度：至少 8 字符、最多 256 字符，需包含大小写字母和数字
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("密码长度不能少于8个字符");
    }
    if password.len() > 256 {
        return Err("密码长度不能超过256个字符");
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_upper || !has_lower || !has_digit {
        return Err("密码必须包含至少一个大写字母、一个小写字母和一个数字");
    }
    Ok(())
}

/// 验证登录名格式：2-50 字符，只允许字母、数字、下划线、连字符
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let char_count = username.chars().count();
    if char_count < 2 || char_count > 50 {
        return Err("用户名长度需在2到50个字符之间");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err("用户名只能包含字母、数字、下划线和连字符");
    }
    Ok(())
}

/// 验证姓名：1-50 字符，不允许控制字符
pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    let char_count = name.chars().count();
    if char_count == 0 || char_count > 50 {
        return Err("姓名长度需在1到50个字符之间");
    }
    if name.chars().any(|c| c.is_control()) {
        return Err("姓名包含非法字符");
    }
    Ok(())
}

/// 解析 YYYY-MM-DD 格式日期
pub fn parse_date(raw: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| "日期格式无效，应为 YYYY-MM-DD")
}

/// 按测评日计算周岁：生日未到则减一岁
pub fn age_at(dob: NaiveDate, on: NaiveDate) -> Result<u32, &'static str> {
    if on < dob {
        return Err("测评日期早于出生日期");
    }
    let mut age = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    Ok(age as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn valid_password_accepted() {
        assert!(validate_password("Abc12345").is_ok());
    }

    #[test]
    fn short_password_rejected() {
        assert!(validate_password("Ab1").is_err());
    }

    #[test]
    fn no_uppercase_rejected() {
        assert!(validate_password("abcdefg1").is_err());
    }

    #[test]
    fn no_digit_rejected() {
        assert!(validate_password("Abcdefgh").is_err());
    }

    #[test]
    fn valid_username_accepted() {
        assert!(validate_username("zhang_san").is_ok());
    }

    #[test]
    fn short_username_rejected() {
        assert!(validate_username("a").is_err());
    }

    #[test]
    fn username_with_space_rejected() {
        assert!(validate_username("zhang san").is_err());
    }

    #[test]
    fn chinese_person_name_accepted() {
        assert!(validate_person_name("张三").is_ok());
    }

    #[test]
    fn empty_person_name_rejected() {
        assert!(validate_person_name("").is_err());
    }

    #[test]
    fn parse_date_accepts_iso() {
        assert_eq!(parse_date("2019-03-15").unwrap(), date(2019, 3, 15));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("15/03/2019").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn age_counts_completed_years() {
        let dob = date(2018, 6, 10);
        assert_eq!(age_at(dob, date(2025, 6, 9)).unwrap(), 6);
        assert_eq!(age_at(dob, date(2025, 6, 10)).unwrap(), 7);
        assert_eq!(age_at(dob, date(2025, 12, 1)).unwrap(), 7);
    }

    #[test]
    fn age_before_birth_is_rejected() {
        assert!(age_at(date(2020, 1, 1), date(2019, 12, 31)).is_err());
    }
}
