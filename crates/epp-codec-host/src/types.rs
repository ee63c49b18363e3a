//! 主机映射的公共数据类型。

use alloc::format;
use alloc::string::String;

use chrono::{DateTime, SecondsFormat, Utc};

use epp_core::xml::Element;
use epp_core::{EppError, Result};

use crate::NS;

pub(crate) fn format_date_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_date_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| EppError::malformed(format!("`{text}` is not an RFC 3339 date-time: {err}")))
}

/// 地址族，对应 `addr` 元素的 `ip` 属性。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressFamily {
    /// IPv4（默认）。
    #[default]
    V4,
    /// IPv6。
    V6,
}

impl AddressFamily {
    fn as_str(self) -> &'static str {
        match self {
            AddressFamily::V4 => "v4",
            AddressFamily::V6 => "v6",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "v4" => Ok(AddressFamily::V4),
            "v6" => Ok(AddressFamily::V6),
            other => Err(EppError::malformed(format!(
                "`{other}` is not an address family"
            ))),
        }
    }
}

/// 主机的粘连地址。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostAddress {
    address: String,
    family: AddressFamily,
}

impl HostAddress {
    /// 构造 IPv4 地址。
    pub fn v4(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            family: AddressFamily::V4,
        }
    }

    /// 构造 IPv6 地址。
    pub fn v6(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            family: AddressFamily::V6,
        }
    }

    /// 地址文本。
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 地址族。
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub(crate) fn to_element(&self) -> Result<Element> {
        if self.address.is_empty() {
            return Err(EppError::missing_attribute("host:addr"));
        }
        Ok(Element::new(NS, "addr")
            .with_attribute("ip", self.family.as_str())
            .with_text(self.address.clone()))
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            address: element.require_text()?.into(),
            family: match element.attribute("ip") {
                Some(family) => AddressFamily::parse(family)?,
                None => AddressFamily::V4,
            },
        })
    }
}

/// Schema 枚举的主机状态值。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostStatusKind {
    /// 正常状态。
    Ok,
    /// 客户端禁止删除。
    ClientDeleteProhibited,
    /// 客户端禁止更新。
    ClientUpdateProhibited,
    /// 被域名对象引用。
    Linked,
    /// 创建流程待定。
    PendingCreate,
    /// 删除流程待定。
    PendingDelete,
    /// 转移流程待定。
    PendingTransfer,
    /// 更新流程待定。
    PendingUpdate,
    /// 服务端禁止删除。
    ServerDeleteProhibited,
    /// 服务端禁止更新。
    ServerUpdateProhibited,
}

impl HostStatusKind {
    /// 线上属性字面量。
    pub fn as_str(self) -> &'static str {
        match self {
            HostStatusKind::Ok => "ok",
            HostStatusKind::ClientDeleteProhibited => "clientDeleteProhibited",
            HostStatusKind::ClientUpdateProhibited => "clientUpdateProhibited",
            HostStatusKind::Linked => "linked",
            HostStatusKind::PendingCreate => "pendingCreate",
            HostStatusKind::PendingDelete => "pendingDelete",
            HostStatusKind::PendingTransfer => "pendingTransfer",
            HostStatusKind::PendingUpdate => "pendingUpdate",
            HostStatusKind::ServerDeleteProhibited => "serverDeleteProhibited",
            HostStatusKind::ServerUpdateProhibited => "serverUpdateProhibited",
        }
    }

    /// 从线上字面量解析。
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "ok" => Ok(HostStatusKind::Ok),
            "clientDeleteProhibited" => Ok(HostStatusKind::ClientDeleteProhibited),
            "clientUpdateProhibited" => Ok(HostStatusKind::ClientUpdateProhibited),
            "linked" => Ok(HostStatusKind::Linked),
            "pendingCreate" => Ok(HostStatusKind::PendingCreate),
            "pendingDelete" => Ok(HostStatusKind::PendingDelete),
            "pendingTransfer" => Ok(HostStatusKind::PendingTransfer),
            "pendingUpdate" => Ok(HostStatusKind::PendingUpdate),
            "serverDeleteProhibited" => Ok(HostStatusKind::ServerDeleteProhibited),
            "serverUpdateProhibited" => Ok(HostStatusKind::ServerUpdateProhibited),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a host status"
            ))),
        }
    }

    pub(crate) fn to_element(self) -> Element {
        Element::new(NS, "status").with_attribute("s", self.as_str())
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        Self::parse(element.require_attribute("s")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_family_defaults_to_v4_on_decode() {
        // Why: `ip` 属性缺省即 v4，解码不得将缺省误判为畸形。
        let element = Element::new(NS, "addr").with_text("192.0.2.2");
        let address = HostAddress::from_element(&element).expect("decode succeeds");
        assert_eq!(address.family(), AddressFamily::V4);
        assert_eq!(address.address(), "192.0.2.2");
    }

    #[test]
    fn empty_address_fails_encode() {
        let err = HostAddress::v4("").to_element().unwrap_err();
        assert_eq!(err.code(), epp_core::codes::ENCODE_MISSING_ATTRIBUTE);
    }
}
