//! 域名映射的七个命令载荷。
//!
//! # 设计目标（Why）
//! - 每个命令都是核心 [`CommandPayload`] 契约的机械应用：信封不变式由核心
//!   驱动器承担，这里只负责映射元素的字段顺序与取值校验；
//! - check 命令的名字列表上限、create 的联系人协商判断等映射级约束收敛在
//!   各自的 `encode_payload` 中，失败即点名出错字段。

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use chrono::NaiveDate;

use epp_core::xml::ns as epp_ns;
use epp_core::{
    CommandKind, CommandPayload, DecodeContext, Element, EncodeContext, EppError, Result, codes,
};

use crate::NS;
use crate::types::{
    AuthInfo, CONTACT_NS, DomainContact, DomainStatus, HostsFilter, Period, format_date,
    parse_date,
};

/// check 命令单次可查询的域名数量上限。
pub const MAX_CHECK_NAMES: usize = 99;

/// 域名可用性查询。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainCheckCommand {
    names: Vec<String>,
}

impl DomainCheckCommand {
    /// 以名字列表构造。
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// 待查询的名字列表。
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl CommandPayload for DomainCheckCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Check
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.names.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        if self.names.len() > MAX_CHECK_NAMES {
            return Err(EppError::new(
                codes::ENCODE_OUT_OF_RANGE,
                format!(
                    "check command lists {} domain names, maximum is {MAX_CHECK_NAMES}",
                    self.names.len()
                ),
            ));
        }
        let mapping = crate::mapping_element("check").with_children(
            self.names
                .iter()
                .map(|name| Element::new(NS, "name").with_text(name.clone())),
        );
        Ok(Element::new(epp_ns::EPP, "check").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "check")?;
        self.names = mapping
            .children_named(NS, "name")
            .map(|name| name.require_text().map(String::from))
            .collect::<Result<Vec<_>>>()?;
        if self.names.is_empty() {
            return Err(EppError::malformed("domain check lists no name"));
        }
        if self.names.len() > MAX_CHECK_NAMES {
            return Err(EppError::new(
                codes::DECODE_OUT_OF_RANGE,
                format!(
                    "check command lists {} domain names, maximum is {MAX_CHECK_NAMES}",
                    self.names.len()
                ),
            ));
        }
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 域名详情查询。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainInfoCommand {
    name: String,
    hosts: HostsFilter,
    auth_info: Option<AuthInfo>,
}

impl DomainInfoCommand {
    /// 以域名构造，主机过滤默认 `all`。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: HostsFilter::default(),
            auth_info: None,
        }
    }

    /// Builder：设置主机过滤条件。
    pub fn with_hosts(mut self, hosts: HostsFilter) -> Self {
        self.hosts = hosts;
        self
    }

    /// Builder：附带授权信息（查询他人域名时使用）。
    pub fn with_auth_info(mut self, auth_info: AuthInfo) -> Self {
        self.auth_info = Some(auth_info);
        self
    }

    /// 查询目标域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 主机过滤条件。
    pub fn hosts(&self) -> HostsFilter {
        self.hosts
    }
}

impl CommandPayload for DomainInfoCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Info
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mut name = Element::new(NS, "name").with_text(self.name.clone());
        if self.hosts != HostsFilter::All {
            name.set_attribute("hosts", self.hosts.as_str());
        }
        let mut mapping = crate::mapping_element("info").with_child(name);
        if let Some(auth_info) = &self.auth_info {
            mapping.push_child(auth_info.to_element()?);
        }
        Ok(Element::new(epp_ns::EPP, "info").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "info")?;
        let name = mapping.require_child(NS, "name")?;
        self.name = name.require_text()?.into();
        self.hosts = match name.attribute("hosts") {
            Some(filter) => HostsFilter::parse(filter)?,
            None => HostsFilter::All,
        };
        self.auth_info = match mapping.child(NS, "authInfo") {
            Some(auth_info) => Some(AuthInfo::from_element(auth_info)?),
            None => None,
        };
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 域名创建。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainCreateCommand {
    name: String,
    period: Option<Period>,
    nameservers: Vec<String>,
    registrant: Option<String>,
    contacts: Vec<DomainContact>,
    auth_info: AuthInfo,
}

impl DomainCreateCommand {
    /// 以域名与授权信息构造。
    pub fn new(name: impl Into<String>, auth_info: AuthInfo) -> Self {
        Self {
            name: name.into(),
            auth_info,
            ..Self::default()
        }
    }

    /// Builder：设置注册有效期。
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Builder：追加一个委派主机（hostObj 形式）。
    pub fn with_nameserver(mut self, host: impl Into<String>) -> Self {
        self.nameservers.push(host.into());
        self
    }

    /// Builder：设置注册人（仅在联系人映射已协商时编码）。
    pub fn with_registrant(mut self, registrant: impl Into<String>) -> Self {
        self.registrant = Some(registrant.into());
        self
    }

    /// Builder：追加一个联系人关联（仅在联系人映射已协商时编码）。
    pub fn with_contact(mut self, contact: DomainContact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// 目标域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册有效期。
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// 委派主机列表。
    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    /// 注册人。
    pub fn registrant(&self) -> Option<&str> {
        self.registrant.as_deref()
    }

    /// 联系人关联列表。
    pub fn contacts(&self) -> &[DomainContact] {
        &self.contacts
    }

    /// 授权信息。
    pub fn auth_info(&self) -> &AuthInfo {
        &self.auth_info
    }
}

impl CommandPayload for DomainCreateCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Create
    }

    fn encode_payload(&self, ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mut mapping = crate::mapping_element("create")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        if let Some(period) = self.period {
            mapping.push_child(period.to_element()?);
        }
        if !self.nameservers.is_empty() {
            mapping.push_child(
                Element::new(NS, "ns").with_children(
                    self.nameservers
                        .iter()
                        .map(|host| Element::new(NS, "hostObj").with_text(host.clone())),
                ),
            );
        }
        // 联系人关联是可选特性：仅当联系人映射已被协商时才编码。
        if ctx.has_service(CONTACT_NS) {
            if let Some(registrant) = &self.registrant {
                mapping.push_child(Element::new(NS, "registrant").with_text(registrant.clone()));
            }
            for contact in &self.contacts {
                mapping.push_child(contact.to_element());
            }
        }
        mapping.push_child(self.auth_info.to_element()?);
        Ok(Element::new(epp_ns::EPP, "create").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "create")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        self.period = match mapping.child(NS, "period") {
            Some(period) => Some(Period::from_element(period)?),
            None => None,
        };
        self.nameservers = match mapping.child(NS, "ns") {
            Some(hosts) => hosts
                .children_named(NS, "hostObj")
                .map(|host| host.require_text().map(String::from))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        self.registrant = mapping.child_text_owned(NS, "registrant");
        self.contacts = mapping
            .children_named(NS, "contact")
            .map(DomainContact::from_element)
            .collect::<Result<Vec<_>>>()?;
        self.auth_info = AuthInfo::from_element(mapping.require_child(NS, "authInfo")?)?;
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 域名删除。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainDeleteCommand {
    name: String,
}

impl DomainDeleteCommand {
    /// 以域名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// 目标域名。
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CommandPayload for DomainDeleteCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Delete
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mapping = crate::mapping_element("delete")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        Ok(Element::new(epp_ns::EPP, "delete").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "delete")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 域名续期。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainRenewCommand {
    name: String,
    current_expiry_date: NaiveDate,
    period: Option<Period>,
}

impl Default for DomainRenewCommand {
    fn default() -> Self {
        Self {
            name: String::new(),
            current_expiry_date: NaiveDate::MIN,
            period: None,
        }
    }
}

impl DomainRenewCommand {
    /// 以域名与当前到期日构造。
    pub fn new(name: impl Into<String>, current_expiry_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            current_expiry_date,
            period: None,
        }
    }

    /// Builder：设置续期时长。
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// 目标域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 当前到期日（防并发续期的乐观校验依据）。
    pub fn current_expiry_date(&self) -> NaiveDate {
        self.current_expiry_date
    }

    /// 续期时长。
    pub fn period(&self) -> Option<Period> {
        self.period
    }
}

impl CommandPayload for DomainRenewCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Renew
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mut mapping = crate::mapping_element("renew")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()))
            .with_child(
                Element::new(NS, "curExpDate").with_text(format_date(self.current_expiry_date)),
            );
        if let Some(period) = self.period {
            mapping.push_child(period.to_element()?);
        }
        Ok(Element::new(epp_ns::EPP, "renew").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "renew")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        self.current_expiry_date = parse_date(mapping.require_child_text(NS, "curExpDate")?)?;
        self.period = match mapping.child(NS, "period") {
            Some(period) => Some(Period::from_element(period)?),
            None => None,
        };
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 域名转移：子操作由信封驱动器以 `op` 属性承载。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainTransferCommand {
    name: String,
    period: Option<Period>,
    auth_info: Option<AuthInfo>,
}

impl DomainTransferCommand {
    /// 以域名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder：设置转移附带的续期时长。
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Builder：附带授权信息。
    pub fn with_auth_info(mut self, auth_info: AuthInfo) -> Self {
        self.auth_info = Some(auth_info);
        self
    }

    /// 目标域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 转移附带的续期时长。
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// 授权信息。
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.auth_info.as_ref()
    }
}

impl CommandPayload for DomainTransferCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Transfer
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        let mut mapping = crate::mapping_element("transfer")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        if let Some(period) = self.period {
            mapping.push_child(period.to_element()?);
        }
        if let Some(auth_info) = &self.auth_info {
            mapping.push_child(auth_info.to_element()?);
        }
        Ok(Element::new(epp_ns::EPP, "transfer").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "transfer")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        self.period = match mapping.child(NS, "period") {
            Some(period) => Some(Period::from_element(period)?),
            None => None,
        };
        self.auth_info = match mapping.child(NS, "authInfo") {
            Some(auth_info) => Some(AuthInfo::from_element(auth_info)?),
            None => None,
        };
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// update 命令的增/删分组。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainUpdateGroup {
    nameservers: Vec<String>,
    contacts: Vec<DomainContact>,
    statuses: Vec<DomainStatus>,
}

impl DomainUpdateGroup {
    /// 构造空分组。
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder：追加一个委派主机。
    pub fn with_nameserver(mut self, host: impl Into<String>) -> Self {
        self.nameservers.push(host.into());
        self
    }

    /// Builder：追加一个联系人关联。
    pub fn with_contact(mut self, contact: DomainContact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// Builder：追加一个状态值。
    pub fn with_status(mut self, status: DomainStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// 分组是否为空。
    pub fn is_empty(&self) -> bool {
        self.nameservers.is_empty() && self.contacts.is_empty() && self.statuses.is_empty()
    }

    /// 委派主机列表。
    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    /// 联系人关联列表。
    pub fn contacts(&self) -> &[DomainContact] {
        &self.contacts
    }

    /// 状态值列表。
    pub fn statuses(&self) -> &[DomainStatus] {
        &self.statuses
    }

    fn encode(&self, local: &'static str, ctx: &EncodeContext<'_>) -> Element {
        let mut group = Element::new(NS, local);
        if !self.nameservers.is_empty() {
            group.push_child(
                Element::new(NS, "ns").with_children(
                    self.nameservers
                        .iter()
                        .map(|host| Element::new(NS, "hostObj").with_text(host.clone())),
                ),
            );
        }
        if ctx.has_service(CONTACT_NS) {
            for contact in &self.contacts {
                group.push_child(contact.to_element());
            }
        }
        for status in &self.statuses {
            group.push_child(status.to_element());
        }
        group
    }

    fn decode(element: &Element) -> Result<Self> {
        Ok(Self {
            nameservers: match element.child(NS, "ns") {
                Some(hosts) => hosts
                    .children_named(NS, "hostObj")
                    .map(|host| host.require_text().map(String::from))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            },
            contacts: element
                .children_named(NS, "contact")
                .map(DomainContact::from_element)
                .collect::<Result<Vec<_>>>()?,
            statuses: element
                .children_named(NS, "status")
                .map(DomainStatus::from_element)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

/// update 命令的变更组。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainChange {
    registrant: Option<String>,
    auth_info: Option<AuthInfo>,
}

impl DomainChange {
    /// 构造空变更组。
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder：变更注册人。
    pub fn with_registrant(mut self, registrant: impl Into<String>) -> Self {
        self.registrant = Some(registrant.into());
        self
    }

    /// Builder：变更授权信息。
    pub fn with_auth_info(mut self, auth_info: AuthInfo) -> Self {
        self.auth_info = Some(auth_info);
        self
    }

    /// 变更组是否为空。
    pub fn is_empty(&self) -> bool {
        self.registrant.is_none() && self.auth_info.is_none()
    }

    /// 新注册人。
    pub fn registrant(&self) -> Option<&str> {
        self.registrant.as_deref()
    }

    fn encode(&self) -> Result<Element> {
        let mut change = Element::new(NS, "chg");
        if let Some(registrant) = &self.registrant {
            change.push_child(Element::new(NS, "registrant").with_text(registrant.clone()));
        }
        if let Some(auth_info) = &self.auth_info {
            change.push_child(auth_info.to_element()?);
        }
        Ok(change)
    }

    fn decode(element: &Element) -> Result<Self> {
        Ok(Self {
            registrant: element.child_text_owned(NS, "registrant"),
            auth_info: match element.child(NS, "authInfo") {
                Some(auth_info) => Some(AuthInfo::from_element(auth_info)?),
                None => None,
            },
        })
    }
}

/// 域名更新。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainUpdateCommand {
    name: String,
    add: DomainUpdateGroup,
    remove: DomainUpdateGroup,
    change: DomainChange,
}

impl DomainUpdateCommand {
    /// 以域名构造。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder：设置新增分组。
    pub fn with_add(mut self, add: DomainUpdateGroup) -> Self {
        self.add = add;
        self
    }

    /// Builder：设置移除分组。
    pub fn with_remove(mut self, remove: DomainUpdateGroup) -> Self {
        self.remove = remove;
        self
    }

    /// Builder：设置变更组。
    pub fn with_change(mut self, change: DomainChange) -> Self {
        self.change = change;
        self
    }

    /// 目标域名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 新增分组。
    pub fn add(&self) -> &DomainUpdateGroup {
        &self.add
    }

    /// 移除分组。
    pub fn remove(&self) -> &DomainUpdateGroup {
        &self.remove
    }

    /// 变更组。
    pub fn change(&self) -> &DomainChange {
        &self.change
    }
}

impl CommandPayload for DomainUpdateCommand {
    fn namespace(&self) -> &str {
        NS
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Update
    }

    fn encode_payload(&self, ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.name.is_empty() {
            return Err(EppError::missing_attribute("domain:name"));
        }
        if self.add.is_empty() && self.remove.is_empty() && self.change.is_empty() {
            return Err(EppError::missing_attribute("domain:add/rem/chg"));
        }
        let mut mapping = crate::mapping_element("update")
            .with_child(Element::new(NS, "name").with_text(self.name.clone()));
        if !self.add.is_empty() {
            mapping.push_child(self.add.encode("add", ctx));
        }
        if !self.remove.is_empty() {
            mapping.push_child(self.remove.encode("rem", ctx));
        }
        if !self.change.is_empty() {
            mapping.push_child(self.change.encode()?);
        }
        Ok(Element::new(epp_ns::EPP, "update").with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(NS, "update")?;
        self.name = mapping.require_child_text(NS, "name")?.into();
        self.add = match mapping.child(NS, "add") {
            Some(group) => DomainUpdateGroup::decode(group)?,
            None => DomainUpdateGroup::default(),
        };
        self.remove = match mapping.child(NS, "rem") {
            Some(group) => DomainUpdateGroup::decode(group)?,
            None => DomainUpdateGroup::default(),
        };
        self.change = match mapping.child(NS, "chg") {
            Some(change) => DomainChange::decode(change)?,
            None => DomainChange::default(),
        };
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
