use crate::error::{AppError, AppResult};
use regex::Regex;

/// 校验开/封盘时刻格式 (严格 HH:MM, 24 小时制)
pub fn validate_time_of_day(value: &str) -> AppResult<()> {
    let time_regex = Regex::new(r"^\d{2}:\d{2}$").unwrap();

    if !time_regex.is_match(value) {
        return Err(AppError::ValidationError(format!(
            "时刻格式无效，必须是 HH:MM: {value}"
        )));
    }

    if parse_time_of_day(value).is_none() {
        return Err(AppError::ValidationError(format!(
            "时刻取值无效，小时 00-23 分钟 00-59: {value}"
        )));
    }

    Ok(())
}

/// 解析 HH:MM，越界或格式不符返回 None
pub fn parse_time_of_day(value: &str) -> Option<(u32, u32)> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let hour: u32 = value.get(0..2)?.parse().ok()?;
    let minute: u32 = value.get(3..5)?.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_time_of_day() {
        assert!(validate_time_of_day("07:00").is_ok());
        assert!(validate_time_of_day("23:59").is_ok());
        assert!(validate_time_of_day("24:00").is_err());
        assert!(validate_time_of_day("07:60").is_err());
        assert!(validate_time_of_day("7:00").is_err());
        assert!(validate_time_of_day("07:0").is_err());
        assert!(validate_time_of_day("0700").is_err());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("00:00"), Some((0, 0)));
        assert_eq!(parse_time_of_day("19:45"), Some((19, 45)));
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("aa:bb"), None);
    }
}
