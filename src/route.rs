//! # 路由表与匹配器
//!
//! 路由表是按注册顺序排列的 `(模式, 方法, 处理函数)` 序列，顺序即优先级：
//! 先注册的路由总是先被尝试，后注册的更具体的模式不会覆盖先注册的宽泛模式。
//!
//! 模式在编译时被锚定为 `^(?:pattern)$`，因此只有当模式描述了完整路径时才算匹配，
//! 仅匹配路径前缀或后缀的模式不会命中。

use crate::{exception::Exception, handler::Handler, param::HttpRequestMethod};

use log::debug;
use regex::Regex;

/// 一条已编译的路由，注册后不可变。
pub struct Route {
    pattern: String,
    regex: Regex,
    method: HttpRequestMethod,
    handler: Handler,
}

impl Route {
    /// 原始（未锚定的）模式字符串
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn method(&self) -> &HttpRequestMethod {
        &self.method
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// 方法是否可以服务于该请求方法：完全相同，或 GET 路由服务 HEAD 请求。
    fn accepts(&self, method: &HttpRequestMethod) -> bool {
        &self.method == method
            || (*method == HttpRequestMethod::Head && self.method == HttpRequestMethod::Get)
    }

    /// 对完整路径做匹配，返回除整体匹配外的所有捕获组。
    ///
    /// 未参与匹配的可选分组以空串占位，保证捕获数量与分组数量一致。
    fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// 匹配成功的结果：命中的路由及其捕获组。
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub captures: Vec<String>,
}

/// 按注册顺序保存的路由表。
///
/// 服务启动前构建，启动后只读；不提供删除操作。
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编译模式并把路由追加到表尾。
    ///
    /// 不去重，也不在注册时检查处理函数的参数形状。
    pub fn register(
        &mut self,
        pattern: &str,
        method: HttpRequestMethod,
        handler: Handler,
    ) -> Result<(), Exception> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            Exception::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        debug!("注册路由：{} {}", method, pattern);
        self.routes.push(Route {
            pattern: pattern.to_string(),
            regex,
            method,
            handler,
        });
        Ok(())
    }

    /// 按注册顺序扫描，返回第一条方法与完整路径都匹配的路由。
    pub fn find(&self, path: &str, method: &HttpRequestMethod) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.accepts(method))
            .find_map(|route| {
                route
                    .captures(path)
                    .map(|captures| RouteMatch { route, captures })
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use proptest::prelude::*;

    fn noop() -> Handler {
        Handler::plain_slice(|_: &[String]| ())
    }

    fn table(routes: &[(&str, HttpRequestMethod)]) -> RouteTable {
        let mut table = RouteTable::new();
        for (pattern, method) in routes {
            table.register(pattern, method.clone(), noop()).unwrap();
        }
        table
    }

    #[test]
    fn test_captures_in_order() {
        let table = table(&[("/(\\w+)/(\\d+)", HttpRequestMethod::Get)]);
        let found = table.find("/users/42", &HttpRequestMethod::Get).unwrap();
        assert_eq!(found.captures, vec!["users", "42"]);
    }

    #[test]
    fn test_first_registered_wins() {
        let table = table(&[
            ("/(.*)", HttpRequestMethod::Get),
            ("/specific", HttpRequestMethod::Get),
        ]);
        let found = table.find("/specific", &HttpRequestMethod::Get).unwrap();
        assert_eq!(found.route.pattern(), "/(.*)");
        assert_eq!(found.captures, vec!["specific"]);
    }

    #[test]
    fn test_method_must_match() {
        let table = table(&[("/a", HttpRequestMethod::Post), ("/a", HttpRequestMethod::Put)]);
        assert!(table.find("/a", &HttpRequestMethod::Get).is_none());
        let found = table.find("/a", &HttpRequestMethod::Put).unwrap();
        assert_eq!(found.route.method(), &HttpRequestMethod::Put);
    }

    #[test]
    fn test_head_uses_get_route_but_not_reverse() {
        let table = table(&[("/get", HttpRequestMethod::Get), ("/head", HttpRequestMethod::Head)]);
        assert!(table.find("/get", &HttpRequestMethod::Head).is_some());
        assert!(table.find("/head", &HttpRequestMethod::Get).is_none());
    }

    #[test]
    fn test_partial_match_is_rejected() {
        let table = table(&[("/hello", HttpRequestMethod::Get), ("world", HttpRequestMethod::Get)]);
        assert!(table.find("/hello/world", &HttpRequestMethod::Get).is_none());
        assert!(table.find("/x/hello", &HttpRequestMethod::Get).is_none());
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let table = table(&[("/a|/b", HttpRequestMethod::Get)]);
        assert!(table.find("/a", &HttpRequestMethod::Get).is_some());
        assert!(table.find("/b", &HttpRequestMethod::Get).is_some());
        assert!(table.find("/ab", &HttpRequestMethod::Get).is_none());
        assert!(table.find("/b/c", &HttpRequestMethod::Get).is_none());
    }

    #[test]
    fn test_optional_group_yields_empty_capture() {
        let table = table(&[("/page(/\\d+)?", HttpRequestMethod::Get)]);
        let found = table.find("/page", &HttpRequestMethod::Get).unwrap();
        assert_eq!(found.captures, vec![""]);
    }

    #[test]
    fn test_invalid_pattern_is_not_added() {
        let mut table = RouteTable::new();
        let result = table.register("/(unclosed", HttpRequestMethod::Get, noop());
        assert!(matches!(result, Err(Exception::InvalidPattern { .. })));
        assert!(table.is_empty());
    }

    #[test]
    fn test_no_dedup() {
        let table = table(&[("/same", HttpRequestMethod::Get), ("/same", HttpRequestMethod::Get)]);
        assert_eq!(table.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_earlier_overlapping_route_wins(segment in "[a-z]{1,12}") {
            let table = table(&[
                ("/([a-z]+)", HttpRequestMethod::Get),
                ("/(.+)", HttpRequestMethod::Get),
            ]);
            let path = format!("/{}", segment);
            let found = table.find(&path, &HttpRequestMethod::Get).unwrap();
            prop_assert_eq!(found.route.pattern(), "/([a-z]+)");
            prop_assert_eq!(found.captures, vec![segment]);
        }

        #[test]
        fn prop_strict_prefix_or_suffix_never_matches(
            head in "[a-z]{1,8}",
            tail in "[a-z]{1,8}",
        ) {
            let pattern = format!("/{}", head);
            let table = table(&[(pattern.as_str(), HttpRequestMethod::Get)]);
            let longer = format!("/{}/{}", head, tail);
            let prefixed = format!("/{}/{}", tail, head);
            prop_assert!(table.find(&longer, &HttpRequestMethod::Get).is_none());
            prop_assert!(table.find(&prefixed, &HttpRequestMethod::Get).is_none());
            prop_assert!(table.find(&pattern, &HttpRequestMethod::Get).is_some());
        }
    }
}
