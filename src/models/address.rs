use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// 地址族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "ipv4")]
    V4,
    #[serde(rename = "ipv6")]
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// 地址作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressScope {
    Loopback,
    LinkLocal,
    Global,
}

/// 本机网卡上发现的地址
///
/// 不可变值；构造后只能读取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAddress {
    value: String,
    family: AddressFamily,
    scope: AddressScope,
}

impl NetworkAddress {
    /// 解析地址字符串，去掉 `%eth0` 这类 zone 后缀
    ///
    /// 未指定地址 (`::` / `0.0.0.0`) 和无法解析的字符串返回 `None`。
    pub fn parse(raw: &str) -> Option<Self> {
        let bare = strip_zone(raw.trim());
        let ip: IpAddr = bare.parse().ok()?;
        if ip.is_unspecified() {
            return None;
        }
        Some(Self::from_ip(ip))
    }

    pub fn from_ip(ip: IpAddr) -> Self {
        let (family, scope) = match ip {
            IpAddr::V4(v4) => (AddressFamily::V4, classify_v4(&v4)),
            IpAddr::V6(v6) => (AddressFamily::V6, classify_v6(&v6)),
        };
        Self {
            value: ip.to_string(),
            family,
            scope,
        }
    }

    /// 地址字面值（不含 zone 后缀）
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn scope(&self) -> AddressScope {
        self.scope
    }

    pub fn is_global(&self) -> bool {
        self.scope == AddressScope::Global
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn strip_zone(raw: &str) -> &str {
    match raw.split_once('%') {
        Some((addr, _zone)) => addr,
        None => raw,
    }
}

fn classify_v4(ip: &Ipv4Addr) -> AddressScope {
    if ip.is_loopback() {
        AddressScope::Loopback
    } else if ip.is_link_local() {
        AddressScope::LinkLocal
    } else {
        AddressScope::Global
    }
}

fn classify_v6(ip: &Ipv6Addr) -> AddressScope {
    // ::ffff:a.b.c.d 按内嵌的 IPv4 地址归类
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_v4(&v4);
    }
    if ip.is_loopback() {
        AddressScope::Loopback
    } else if (ip.segments()[0] & 0xffc0) == 0xfe80 {
        // fe80::/10
        AddressScope::LinkLocal
    } else {
        AddressScope::Global
    }
}
