use chrono::{DateTime, Duration, TimeZone, Utc};
use lazy_static::lazy_static;
use log::error;
use regex::Regex;

use std::fmt;

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"(?i:[^a-z0-9\-_])").unwrap();
}

/// 返回 RFC1123 格式的时间，`UTC` 后缀改写为 HTTP 要求的 `GMT`。
pub fn web_time(t: DateTime<Utc>) -> String {
    let ftime = t.format("%a, %d %b %Y %H:%M:%S %Z").to_string();
    match ftime.strip_suffix("UTC") {
        Some(stripped) => [stripped, "GMT"].concat(),
        None => ftime,
    }
}

/// 把键值对编码为 `application/x-www-form-urlencoded` 格式，便于构造 POST 请求。
pub fn urlencode<I, K, V>(data: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(data)
        .finish()
}

/// 生成适合放进 URL 的 slug。
///
/// 非 `[a-z0-9-_]` 字符替换为 `sep`，连续的 `sep` 合并为一个，并去掉首尾的 `sep`。
pub fn slug(s: &str, sep: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let slug = SLUG_REGEX.replace_all(s, sep).into_owned();
    if slug.is_empty() || sep.is_empty() {
        return slug.to_lowercase();
    }

    let quoted = regex::escape(sep);
    let (repeated, ends) = match (
        Regex::new(&format!("({}){{2,}}", quoted)),
        Regex::new(&format!("^{}|{}$", quoted, quoted)),
    ) {
        (Ok(repeated), Ok(ends)) => (repeated, ends),
        _ => {
            error!("无法为分隔符{:?}构建正则表达式", sep);
            return slug.to_lowercase();
        }
    };
    let slug = repeated.replace_all(&slug, sep);
    let slug = ends.replace_all(&slug, "");
    slug.to_lowercase()
}

/// 一个待写入 `Set-Cookie` 响应头的 cookie。
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Expires={}", self.name, self.value, web_time(self.expires))
    }
}

/// 创建 cookie，`age` 以秒计；为 0 时视为永久有效（过期时间为 2^31 - 1 秒，约 2038 年）。
///
/// `age` 超出时间范围时同样按永久有效处理。
pub fn new_cookie(name: &str, value: &str, age: i64) -> Cookie {
    let permanent = || Utc.timestamp_opt(2147483647, 0).single().unwrap_or_else(Utc::now);
    let expires = if age == 0 {
        permanent()
    } else {
        Duration::try_seconds(age)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or_else(permanent)
    };
    Cookie {
        name: name.to_string(),
        value: value.to_string(),
        expires,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_time_uses_gmt() {
        let t = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(web_time(t), "Mon, 02 Jan 2006 15:04:05 GMT");
    }

    #[test]
    fn test_urlencode() {
        let encoded = urlencode([("name", "John Doe"), ("q", "a&b=c")]);
        assert_eq!(encoded, "name=John+Doe&q=a%26b%3Dc");
        assert_eq!(urlencode(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Hello, World!", "-"), "hello-world");
        assert_eq!(slug("  many   spaces  ", "-"), "many-spaces");
        assert_eq!(slug("a.b.c", "."), "a.b.c");
        assert_eq!(slug("keep_this-one", "-"), "keep_this-one");
        assert_eq!(slug("", "-"), "");
    }

    #[test]
    fn test_permanent_cookie() {
        let cookie = new_cookie("session", "abc", 0);
        assert_eq!(cookie.expires.timestamp(), 2147483647);
        assert_eq!(
            cookie.to_string(),
            "session=abc; Expires=Tue, 19 Jan 2038 03:14:07 GMT"
        );
    }

    #[test]
    fn test_expiring_cookie() {
        let before = Utc::now();
        let cookie = new_cookie("id", "1", 60);
        let delta = cookie.expires - before;
        assert!(delta.num_seconds() >= 59 && delta.num_seconds() <= 61);
    }

    #[test]
    fn test_out_of_range_age_is_permanent() {
        for age in [i64::MAX, i64::MAX / 2, i64::MIN] {
            let cookie = new_cookie("a", "b", age);
            assert_eq!(cookie.expires.timestamp(), 2147483647, "age={}", age);
        }
    }
}
