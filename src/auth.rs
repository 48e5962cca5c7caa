/// 관리자 권한 판별
/// 토큰 발급/검증은 외부 협력자의 몫이며, 이 서브시스템은 "관리자인가"라는
/// 불리언 권한만 소비한다. 베어러 토큰을 환경 변수의 관리자 토큰과 비교한다.
// region:    --- Imports
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

// endregion: --- Imports

// region:    --- Admin Capability

/// 요청 헤더로부터 관리자 여부 판별
pub fn is_admin(headers: &HeaderMap) -> bool {
    let expected = match std::env::var("ADMIN_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => return false,
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

/// 비관리자에게 노출되는 전화번호 마스킹 (앞 3자리와 뒤 2자리만 노출)
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 5 {
        return "*".repeat(chars.len());
    }
    let mut masked = String::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        if i < 3 || i >= chars.len() - 2 || *c == '-' || *c == ' ' {
            masked.push(*c);
        } else {
            masked.push('*');
        }
    }
    masked
}

// endregion: --- Admin Capability

// region:    --- Tests


// endregion: --- Tests
