//! 网卡地址发现服务 - 业务能力层
//!
//! 只负责"找到一个可登记的公网地址"，不关心登录流程
//!
//! 选择策略是按网卡枚举顺序取第一个合格地址。枚举顺序由操作系统决定，
//! 不同平台之间并不稳定；需要确定性选择时配置 `preferred_interface`。

use pnet::datalink;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AddressFamily, NetworkAddress};

/// 网卡上绑定的一个地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub interface: String,
    pub address: String,
}

impl InterfaceAddress {
    pub fn new(interface: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            address: address.into(),
        }
    }
}

/// 网卡枚举能力
pub trait InterfaceSource {
    fn interface_addresses(&self) -> Vec<InterfaceAddress>;
}

/// 通过 pnet 读取本机网卡
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interface_addresses(&self) -> Vec<InterfaceAddress> {
        datalink::interfaces()
            .into_iter()
            .flat_map(|iface| {
                let name = iface.name.clone();
                iface
                    .ips
                    .into_iter()
                    .map(move |net| InterfaceAddress::new(name.clone(), net.ip().to_string()))
            })
            .collect()
    }
}

/// 固定的地址列表，用于测试和手动指定
#[derive(Debug, Default, Clone)]
pub struct StaticInterfaces(pub Vec<InterfaceAddress>);

impl StaticInterfaces {
    pub fn from_pairs<I, N, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, A)>,
        N: Into<String>,
        A: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(n, a)| InterfaceAddress::new(n, a))
                .collect(),
        )
    }
}

impl InterfaceSource for StaticInterfaces {
    fn interface_addresses(&self) -> Vec<InterfaceAddress> {
        self.0.clone()
    }
}

/// 网卡地址发现服务
pub struct NetworkAddressResolver<S = SystemInterfaces> {
    source: S,
    family: AddressFamily,
    preferred_interface: Option<String>,
}

impl NetworkAddressResolver<SystemInterfaces> {
    /// 读取本机网卡的解析器
    pub fn system(family: AddressFamily) -> Self {
        Self::new(SystemInterfaces, family)
    }
}

impl<S: InterfaceSource> NetworkAddressResolver<S> {
    pub fn new(source: S, family: AddressFamily) -> Self {
        Self {
            source,
            family,
            preferred_interface: None,
        }
    }

    /// 优先考虑指定网卡上的地址，其余保持枚举顺序
    pub fn with_preferred_interface(mut self, interface: Option<String>) -> Self {
        self.preferred_interface = interface;
        self
    }

    /// 返回第一个目标地址族的全局单播地址
    pub fn discover(&self) -> AppResult<NetworkAddress> {
        info!("🔎 正在从网卡读取 {} 配置...", self.family);

        let mut candidates = self.source.interface_addresses();
        if let Some(preferred) = &self.preferred_interface {
            // 稳定排序，同组内仍保持枚举顺序
            candidates.sort_by_key(|c| &c.interface != preferred);
        }

        for candidate in &candidates {
            let Some(addr) = NetworkAddress::parse(&candidate.address) else {
                debug!("跳过无法解析的地址: {} ({})", candidate.address, candidate.interface);
                continue;
            };
            if addr.family() != self.family {
                continue;
            }
            if !addr.is_global() {
                debug!(
                    "跳过非全局地址: {} ({}, {:?})",
                    addr,
                    candidate.interface,
                    addr.scope()
                );
                continue;
            }
            info!("✓ 获取成功: {} (网卡 {})", addr, candidate.interface);
            return Ok(addr);
        }

        warn!("⚠️ 未找到有效的公网 {} 地址，请检查网线连接或地址分配", self.family);
        Err(AppError::NoAddressFound {
            family: self.family,
        })
    }
}
