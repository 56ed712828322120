use woothee::parser::Parser;

/// 解析后的 UA 信息，无法识别的字段为 None
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub family: Option<String>,
    pub os_family: Option<String>,
    pub device_family: Option<String>,
}

fn known(value: &str) -> Option<String> {
    (!value.is_empty() && value != "UNKNOWN").then(|| value.to_string())
}

/// 使用 woothee 解析 User-Agent
pub fn parse_user_agent(ua_string: &str) -> UserAgentInfo {
    let Some(result) = Parser::new().parse(ua_string) else {
        return UserAgentInfo::default();
    };

    UserAgentInfo {
        family: known(result.name),
        os_family: known(result.os),
        device_family: known(result.category),
    }
}
