//! 客户端 IP 提取
//!
//! 只有连接来自显式配置的可信代理时才读取 `X-Forwarded-For` / `X-Real-IP`，
//! 否则一律使用对端地址。回环判定依赖这里的结果，不能被请求头伪造。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

/// 检查 IP 是否在可信代理列表中（单 IP 或 CIDR）
pub fn is_trusted_proxy(ip: &IpAddr, trusted_proxies: &[String]) -> bool {
    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(ip, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|addr| addr == *ip)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix_len.parse::<u32>() else {
        return false;
    };
    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 解析 IP，兼容 `ip:port` 写法
fn parse_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// 从请求头提取转发的 IP：`X-Forwarded-For` 第一项优先，其次 `X-Real-IP`
pub fn forwarded_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(parse_ip)
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .and_then(parse_ip)
        })
}

/// 根据对端地址和请求头决定客户端 IP
pub fn resolve_client_ip(
    peer: Option<IpAddr>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<IpAddr> {
    let peer = peer?;
    if is_trusted_proxy(&peer, trusted_proxies) {
        let real_ip = forwarded_ip_from_headers(headers).unwrap_or(peer);
        debug!("Trusted proxy {} -> client {}", peer, real_ip);
        return Some(real_ip);
    }
    Some(peer)
}

/// 从 HttpRequest 提取客户端 IP
pub fn extract_client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<IpAddr> {
    resolve_client_ip(
        req.peer_addr().map(|addr| addr.ip()),
        req.headers(),
        trusted_proxies,
    )
}
