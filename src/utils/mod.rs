pub mod ip;

/// 关键字最大长度
pub const MAX_KEYWORD_LEN: usize = 128;

/// 从请求路径取出关键字：去掉开头的 `/` 后按百分号编码解码
///
/// 只拒绝空串、多段路径（含解码出的 `/`）、非 UTF-8 和超长关键字，
/// 其余字符原样交给链接目录判断。
pub fn keyword_from_path(path: &str) -> Option<String> {
    let segment = path.strip_prefix('/').unwrap_or(path);
    let keyword = urlencoding::decode(segment).ok()?;
    if keyword.is_empty() || keyword.len() > MAX_KEYWORD_LEN || keyword.contains('/') {
        return None;
    }
    Some(keyword.into_owned())
}

/// 规范化 Host：小写，去掉端口
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        // IPv6 字面量 `[::1]:8080`
        rest.split(']').next().unwrap_or(rest)
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
            _ => host,
        }
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}
