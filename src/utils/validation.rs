use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    // 用户名只能包含字母、数字、下划线和连字符
    Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("valid username regex")
});

/// 用户名格式校验（供 validator 派生宏使用）
pub fn validate_username_format(username: &str) -> std::result::Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_format");
        error.message =
            Some("Username must be 3-30 letters, digits, underscores or hyphens".into());
        Err(error)
    }
}

/// 密码强度校验：至少8位，且同时包含字母和数字
pub fn validate_password_strength(password: &str) -> std::result::Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_strength");
        error.message =
            Some("Password must be at least 8 characters and contain letters and digits".into());
        Err(error)
    }
}

/// 校验文本内容长度（按字符计算）
pub fn validate_text_length(field: &str, text: &str, max: usize) -> Result<()> {
    let length = text.chars().count();
    if length > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// 媒体地址只接受 http(s) 链接
pub fn validate_media_urls(urls: &[String]) -> Result<()> {
    if urls.len() > 10 {
        return Err(AppError::validation("At most 10 media items are allowed"));
    }

    for url in urls {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::Validation(format!("Invalid media url: {}", url)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_format() {
        assert!(validate_username_format("user123").is_ok());
        assert!(validate_username_format("test_user").is_ok());
        assert!(validate_username_format("user-name").is_ok());

        assert!(validate_username_format("").is_err());
        assert!(validate_username_format("ab").is_err());
        assert!(validate_username_format("user@name").is_err());
        assert!(validate_username_format(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("hunter42x").is_ok());

        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("onlyletters").is_err());
        assert!(validate_password_strength("1234567890").is_err());
    }

    #[test]
    fn test_validate_text_length_counts_chars() {
        assert!(validate_text_length("content", "你好世界", 4).is_ok());
        assert!(validate_text_length("content", "你好世界!", 4).is_err());
    }

    #[test]
    fn test_validate_media_urls() {
        assert!(validate_media_urls(&["https://cdn.example.com/a.jpg".to_string()]).is_ok());
        assert!(validate_media_urls(&["ftp://example.com/a.jpg".to_string()]).is_err());

        let too_many: Vec<String> = (0..11)
            .map(|i| format!("https://cdn.example.com/{}.jpg", i))
            .collect();
        assert!(validate_media_urls(&too_many).is_err());
    }
}
