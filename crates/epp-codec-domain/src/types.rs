//! 域名映射的公共数据类型：有效期、授权信息、联系人关联与状态值。
//!
//! # 契约说明（What）
//! - 所有枚举都绑定 Schema 规定的线上字面量，解析失败即解码失败；
//! - 日期时间统一使用 UTC + RFC 3339，纯日期字段使用 `YYYY-MM-DD`。

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use epp_core::xml::Element;
use epp_core::{EppError, Result};

use crate::NS;

/// 联系人映射的命名空间 URI。
///
/// 联系人映射本身由外部 crate 提供；这里只保留 URI，
/// 供编码路径通过 `has_service` 判断联系人关联是否已被协商。
pub const CONTACT_NS: &str = "urn:ietf:params:xml:ns:contact-1.0";

pub(crate) fn format_date_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_date_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| EppError::malformed(format!("`{text}` is not an RFC 3339 date-time: {err}")))
}

pub(crate) fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|err| EppError::malformed(format!("`{text}` is not a calendar date: {err}")))
}

/// 有效期单位。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodUnit {
    /// 年。
    Year,
    /// 月。
    Month,
}

impl PeriodUnit {
    fn as_str(self) -> &'static str {
        match self {
            PeriodUnit::Year => "y",
            PeriodUnit::Month => "m",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "y" => Ok(PeriodUnit::Year),
            "m" => Ok(PeriodUnit::Month),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a period unit"
            ))),
        }
    }
}

/// 注册/续期有效期，取值范围 [1, 99]。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    value: u16,
    unit: PeriodUnit,
}

impl Period {
    /// 有效期数值上限。
    pub const MAX_VALUE: u16 = 99;

    /// 以年为单位构造有效期。
    pub fn years(value: u16) -> Self {
        Self {
            value,
            unit: PeriodUnit::Year,
        }
    }

    /// 以月为单位构造有效期。
    pub fn months(value: u16) -> Self {
        Self {
            value,
            unit: PeriodUnit::Month,
        }
    }

    /// 数值部分。
    pub fn value(&self) -> u16 {
        self.value
    }

    /// 单位部分。
    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    pub(crate) fn to_element(self) -> Result<Element> {
        if self.value == 0 || self.value > Self::MAX_VALUE {
            return Err(EppError::new(
                epp_core::codes::ENCODE_OUT_OF_RANGE,
                format!(
                    "period value {} is outside [1, {}]",
                    self.value,
                    Self::MAX_VALUE
                ),
            ));
        }
        Ok(Element::new(NS, "period")
            .with_attribute("unit", self.unit.as_str())
            .with_text(self.value.to_string()))
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        let unit = PeriodUnit::parse(element.require_attribute("unit")?)?;
        let value: u16 = element
            .require_text()?
            .parse()
            .map_err(|_| EppError::malformed("period value is not an integer"))?;
        if value == 0 || value > Self::MAX_VALUE {
            return Err(EppError::new(
                epp_core::codes::DECODE_OUT_OF_RANGE,
                format!("period value {value} is outside [1, {}]", Self::MAX_VALUE),
            ));
        }
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

/// 授权信息（口令形式）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthInfo {
    password: String,
}

impl AuthInfo {
    /// 以口令构造授权信息。
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// 口令。
    pub fn password(&self) -> &str {
        &self.password
    }

    pub(crate) fn to_element(&self) -> Result<Element> {
        if self.password.is_empty() {
            return Err(EppError::missing_attribute("domain:pw"));
        }
        Ok(Element::new(NS, "authInfo")
            .with_child(Element::new(NS, "pw").with_text(self.password.clone())))
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            password: element.require_child_text(NS, "pw")?.into(),
        })
    }
}

/// 联系人角色。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactType {
    /// 管理联系人。
    Admin,
    /// 计费联系人。
    Billing,
    /// 技术联系人。
    Tech,
}

impl ContactType {
    fn as_str(self) -> &'static str {
        match self {
            ContactType::Admin => "admin",
            ContactType::Billing => "billing",
            ContactType::Tech => "tech",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "admin" => Ok(ContactType::Admin),
            "billing" => Ok(ContactType::Billing),
            "tech" => Ok(ContactType::Tech),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a domain contact type"
            ))),
        }
    }
}

/// 域名与联系人对象的关联。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainContact {
    contact_type: ContactType,
    id: String,
}

impl DomainContact {
    /// 以角色与联系人标识构造关联。
    pub fn new(contact_type: ContactType, id: impl Into<String>) -> Self {
        Self {
            contact_type,
            id: id.into(),
        }
    }

    /// 角色。
    pub fn contact_type(&self) -> ContactType {
        self.contact_type
    }

    /// 联系人标识。
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn to_element(&self) -> Element {
        Element::new(NS, "contact")
            .with_attribute("type", self.contact_type.as_str())
            .with_text(self.id.clone())
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            contact_type: ContactType::parse(element.require_attribute("type")?)?,
            id: element.require_text()?.into(),
        })
    }
}

/// Schema 枚举的域名状态值。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainStatusKind {
    /// 正常状态。
    Ok,
    /// 未投入使用。
    Inactive,
    /// 客户端禁止删除。
    ClientDeleteProhibited,
    /// 客户端暂停解析。
    ClientHold,
    /// 客户端禁止续期。
    ClientRenewProhibited,
    /// 客户端禁止转移。
    ClientTransferProhibited,
    /// 客户端禁止更新。
    ClientUpdateProhibited,
    /// 创建流程待定。
    PendingCreate,
    /// 删除流程待定。
    PendingDelete,
    /// 续期流程待定。
    PendingRenew,
    /// 转移流程待定。
    PendingTransfer,
    /// 更新流程待定。
    PendingUpdate,
    /// 服务端禁止删除。
    ServerDeleteProhibited,
    /// 服务端暂停解析。
    ServerHold,
    /// 服务端禁止续期。
    ServerRenewProhibited,
    /// 服务端禁止转移。
    ServerTransferProhibited,
    /// 服务端禁止更新。
    ServerUpdateProhibited,
}

impl DomainStatusKind {
    /// 线上属性字面量。
    pub fn as_str(self) -> &'static str {
        match self {
            DomainStatusKind::Ok => "ok",
            DomainStatusKind::Inactive => "inactive",
            DomainStatusKind::ClientDeleteProhibited => "clientDeleteProhibited",
            DomainStatusKind::ClientHold => "clientHold",
            DomainStatusKind::ClientRenewProhibited => "clientRenewProhibited",
            DomainStatusKind::ClientTransferProhibited => "clientTransferProhibited",
            DomainStatusKind::ClientUpdateProhibited => "clientUpdateProhibited",
            DomainStatusKind::PendingCreate => "pendingCreate",
            DomainStatusKind::PendingDelete => "pendingDelete",
            DomainStatusKind::PendingRenew => "pendingRenew",
            DomainStatusKind::PendingTransfer => "pendingTransfer",
            DomainStatusKind::PendingUpdate => "pendingUpdate",
            DomainStatusKind::ServerDeleteProhibited => "serverDeleteProhibited",
            DomainStatusKind::ServerHold => "serverHold",
            DomainStatusKind::ServerRenewProhibited => "serverRenewProhibited",
            DomainStatusKind::ServerTransferProhibited => "serverTransferProhibited",
            DomainStatusKind::ServerUpdateProhibited => "serverUpdateProhibited",
        }
    }

    /// 从线上字面量解析。
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "ok" => Ok(DomainStatusKind::Ok),
            "inactive" => Ok(DomainStatusKind::Inactive),
            "clientDeleteProhibited" => Ok(DomainStatusKind::ClientDeleteProhibited),
            "clientHold" => Ok(DomainStatusKind::ClientHold),
            "clientRenewProhibited" => Ok(DomainStatusKind::ClientRenewProhibited),
            "clientTransferProhibited" => Ok(DomainStatusKind::ClientTransferProhibited),
            "clientUpdateProhibited" => Ok(DomainStatusKind::ClientUpdateProhibited),
            "pendingCreate" => Ok(DomainStatusKind::PendingCreate),
            "pendingDelete" => Ok(DomainStatusKind::PendingDelete),
            "pendingRenew" => Ok(DomainStatusKind::PendingRenew),
            "pendingTransfer" => Ok(DomainStatusKind::PendingTransfer),
            "pendingUpdate" => Ok(DomainStatusKind::PendingUpdate),
            "serverDeleteProhibited" => Ok(DomainStatusKind::ServerDeleteProhibited),
            "serverHold" => Ok(DomainStatusKind::ServerHold),
            "serverRenewProhibited" => Ok(DomainStatusKind::ServerRenewProhibited),
            "serverTransferProhibited" => Ok(DomainStatusKind::ServerTransferProhibited),
            "serverUpdateProhibited" => Ok(DomainStatusKind::ServerUpdateProhibited),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a domain status"
            ))),
        }
    }
}

/// 状态值：状态枚举加可选的人类可读说明。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainStatus {
    kind: DomainStatusKind,
    message: Option<String>,
    lang: Option<String>,
}

impl DomainStatus {
    /// 以状态枚举构造。
    pub fn new(kind: DomainStatusKind) -> Self {
        Self {
            kind,
            message: None,
            lang: None,
        }
    }

    /// Builder：附带说明文本。
    pub fn with_message(mut self, message: impl Into<String>, lang: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self.lang = Some(lang.into());
        self
    }

    /// 状态枚举。
    pub fn kind(&self) -> DomainStatusKind {
        self.kind
    }

    /// 说明文本。
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut status = Element::new(NS, "status").with_attribute("s", self.kind.as_str());
        if let Some(lang) = &self.lang {
            status.set_attribute("lang", lang.clone());
        }
        if let Some(message) = &self.message {
            status.set_text(message.clone());
        }
        status
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            kind: DomainStatusKind::parse(element.require_attribute("s")?)?,
            message: element.text().map(String::from),
            lang: element.attribute("lang").map(String::from),
        })
    }
}

/// info 命令的主机过滤条件（`hosts` 属性）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HostsFilter {
    /// 返回委派与下属主机（默认）。
    #[default]
    All,
    /// 仅返回委派主机。
    Delegated,
    /// 仅返回下属主机。
    Subordinate,
    /// 不返回主机信息。
    None,
}

impl HostsFilter {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            HostsFilter::All => "all",
            HostsFilter::Delegated => "del",
            HostsFilter::Subordinate => "sub",
            HostsFilter::None => "none",
        }
    }

    pub(crate) fn parse(value: &str) -> Result<Self> {
        match value {
            "all" => Ok(HostsFilter::All),
            "del" => Ok(HostsFilter::Delegated),
            "sub" => Ok(HostsFilter::Subordinate),
            "none" => Ok(HostsFilter::None),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a hosts filter"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_bounds_are_enforced_both_ways() {
        // Why: [1, 99] 是 Schema 规定的硬边界，两个方向都不得放行。
        let err = Period::years(0).to_element().unwrap_err();
        assert_eq!(err.code(), epp_core::codes::ENCODE_OUT_OF_RANGE);
        let err = Period::years(100).to_element().unwrap_err();
        assert_eq!(err.code(), epp_core::codes::ENCODE_OUT_OF_RANGE);

        let element = Element::new(NS, "period")
            .with_attribute("unit", "y")
            .with_text("100");
        let err = Period::from_element(&element).unwrap_err();
        assert_eq!(err.code(), epp_core::codes::DECODE_OUT_OF_RANGE);
    }

    #[test]
    fn status_literals_round_trip() {
        for kind in [
            DomainStatusKind::Ok,
            DomainStatusKind::ClientHold,
            DomainStatusKind::PendingTransfer,
            DomainStatusKind::ServerUpdateProhibited,
        ] {
            assert_eq!(DomainStatusKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(DomainStatusKind::parse("frozen").is_err());
    }

    #[test]
    fn auth_info_requires_a_password_at_encode() {
        let err = AuthInfo::default().to_element().unwrap_err();
        assert_eq!(err.code(), epp_core::codes::ENCODE_MISSING_ATTRIBUTE);
        assert!(err.message().contains("domain:pw"));
    }
}
